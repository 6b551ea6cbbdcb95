//! The conversation state machine.
//!
//! [`ConversationOrchestrator`] owns the transcript and the thinking
//! indicator. It never performs IO: every operation returns the
//! [`OrchestratorCommand`]s the caller must carry out, and results come back
//! in as method calls tagged with the [`CycleId`] they belong to. Calls for
//! any cycle other than the current one are ignored.

use std::fmt;
use std::time::Duration;

use crate::api::{QueryError, QueryResponse};
use crate::core::agent::AgentId;
use crate::core::classifier::{AgentClassifier, Classification, ClassifierInput};
use crate::core::message::Message;
use crate::core::observer::{CallbackKind, ConversationObserver, TracingObserver};
use crate::core::response::ResponseParser;

/// Monotonic id of one submit-to-idle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CycleId(u64);

impl CycleId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How long the indicator lingers after a cycle settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub grace: Duration,
    pub correction_hold: Duration,
    pub error_grace: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            grace: Duration::from_millis(800),
            correction_hold: Duration::from_millis(200),
            error_grace: Duration::from_millis(500),
        }
    }
}

/// What a settling cycle is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleHold {
    /// Minimum display delay after an answer. `corrected` records whether
    /// the displayed agent changed when the answer was classified.
    Grace { corrected: bool },
    /// Extra hold that follows the grace period after a correction.
    CorrectionHold,
    /// Shorter delay after a failed request.
    ErrorGrace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    Idle,
    Submitting {
        cycle: CycleId,
    },
    Settling {
        cycle: CycleId,
        hold: SettleHold,
    },
}

impl ConversationPhase {
    pub fn cycle(&self) -> Option<CycleId> {
        match self {
            ConversationPhase::Idle => None,
            ConversationPhase::Submitting { cycle } | ConversationPhase::Settling { cycle, .. } => {
                Some(*cycle)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationPhase::Idle)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConversationPhase::Idle => "idle",
            ConversationPhase::Submitting { .. } => "submitting",
            ConversationPhase::Settling { .. } => "settling",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationPhase::Idle => f.write_str("idle"),
            ConversationPhase::Submitting { cycle } => write!(f, "submitting({cycle})"),
            ConversationPhase::Settling { cycle, hold } => {
                let hold = match hold {
                    SettleHold::Grace { corrected: false } => "grace",
                    SettleHold::Grace { corrected: true } => "grace+correction",
                    SettleHold::CorrectionHold => "correction-hold",
                    SettleHold::ErrorGrace => "error-grace",
                };
                write!(f, "settling({cycle}, {hold})")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ThinkingState {
    pub is_active: bool,
    pub displayed_agent: AgentId,
}

/// Work the caller must perform on behalf of the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorCommand {
    SendQuery { cycle: CycleId, question: String },
    ScheduleGrace { cycle: CycleId, delay: Duration },
    CancelGrace { cycle: CycleId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    EmptyMessage,
    RequestInFlight { cycle: CycleId },
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::EmptyMessage => f.write_str("Cannot send an empty message"),
            SubmitError::RequestInFlight { cycle } => {
                write!(f, "A request is already in flight ({cycle})")
            }
        }
    }
}

impl std::error::Error for SubmitError {}

pub struct ConversationOrchestrator {
    messages: Vec<Message>,
    phase: ConversationPhase,
    thinking: ThinkingState,
    last_cycle: u64,
    last_classification: Option<Classification>,
    timings: Timings,
    parser: ResponseParser,
    classifier: AgentClassifier,
    observer: Box<dyn ConversationObserver>,
}

impl Default for ConversationOrchestrator {
    fn default() -> Self {
        Self::new(Timings::default())
    }
}

impl ConversationOrchestrator {
    pub fn new(timings: Timings) -> Self {
        Self::with_observer(timings, Box::new(TracingObserver))
    }

    pub fn with_observer(timings: Timings, observer: Box<dyn ConversationObserver>) -> Self {
        Self {
            messages: Vec::new(),
            phase: ConversationPhase::Idle,
            thinking: ThinkingState::default(),
            last_cycle: 0,
            last_classification: None,
            timings,
            parser: ResponseParser::new(),
            classifier: AgentClassifier::new(),
            observer,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn thinking(&self) -> &ThinkingState {
        &self.thinking
    }

    pub fn timings(&self) -> Timings {
        self.timings
    }

    pub fn current_cycle(&self) -> Option<CycleId> {
        self.phase.cycle()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, ConversationPhase::Submitting { .. })
    }

    pub fn last_classification(&self) -> Option<&Classification> {
        self.last_classification.as_ref()
    }

    /// Append a local note that is not part of any cycle.
    pub fn add_app_note(&mut self, text: impl Into<String>) {
        self.messages.push(Message::app_info(text));
    }

    pub fn add_app_error(&mut self, text: impl Into<String>) {
        self.messages.push(Message::app_error(text));
    }

    /// Start a new cycle. A settling cycle is superseded; an in-flight one
    /// rejects the submission.
    pub fn submit(&mut self, text: &str) -> Result<Vec<OrchestratorCommand>, SubmitError> {
        if text.trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }

        let mut commands = Vec::with_capacity(2);
        match self.phase {
            ConversationPhase::Submitting { cycle } => {
                return Err(SubmitError::RequestInFlight { cycle });
            }
            ConversationPhase::Settling { cycle, .. } => {
                commands.push(OrchestratorCommand::CancelGrace { cycle });
            }
            ConversationPhase::Idle => {}
        }

        self.last_cycle += 1;
        let cycle = CycleId(self.last_cycle);

        self.messages.push(Message::user(text));
        self.thinking = ThinkingState {
            is_active: true,
            displayed_agent: AgentId::Conversation,
        };
        self.last_classification = None;
        self.observer.submitted(cycle, text);
        self.transition(ConversationPhase::Submitting { cycle });

        commands.push(OrchestratorCommand::SendQuery {
            cycle,
            question: text.to_string(),
        });
        Ok(commands)
    }

    pub fn on_response(&mut self, cycle: CycleId, raw: QueryResponse) -> Vec<OrchestratorCommand> {
        if !self.is_awaiting(cycle) {
            self.drop_stale(CallbackKind::Response, cycle);
            return Vec::new();
        }

        let parsed = self.parser.parse(&raw);
        let classification = self.classifier.classify_detailed(ClassifierInput {
            hint: raw.current_agent.as_ref(),
            answer: &parsed.answer,
            routing: raw.routing.as_ref(),
            has_chart: parsed.has_chart(),
        });
        self.observer.agent_resolved(cycle, &classification);

        let agent = classification.agent.clone();
        let corrected = self.thinking.displayed_agent != agent;
        if corrected {
            self.observer
                .indicator_corrected(cycle, &self.thinking.displayed_agent, &agent);
            self.thinking.displayed_agent = agent.clone();
        }

        self.messages.push(Message::assistant(parsed, agent));
        self.last_classification = Some(classification);
        self.transition(ConversationPhase::Settling {
            cycle,
            hold: SettleHold::Grace { corrected },
        });

        vec![OrchestratorCommand::ScheduleGrace {
            cycle,
            delay: self.timings.grace,
        }]
    }

    pub fn on_failure(&mut self, cycle: CycleId, error: QueryError) -> Vec<OrchestratorCommand> {
        if !self.is_awaiting(cycle) {
            self.drop_stale(CallbackKind::Failure, cycle);
            return Vec::new();
        }

        self.observer.request_failed(cycle, &error);
        self.messages
            .push(Message::app_error(format!("Error: {error}")));
        self.transition(ConversationPhase::Settling {
            cycle,
            hold: SettleHold::ErrorGrace,
        });

        vec![OrchestratorCommand::ScheduleGrace {
            cycle,
            delay: self.timings.error_grace,
        }]
    }

    pub fn on_grace_elapsed(&mut self, cycle: CycleId) -> Vec<OrchestratorCommand> {
        let hold = match self.phase {
            ConversationPhase::Settling { cycle: current, hold } if current == cycle => hold,
            _ => {
                self.drop_stale(CallbackKind::GraceElapsed, cycle);
                return Vec::new();
            }
        };

        if hold == (SettleHold::Grace { corrected: true }) {
            self.transition(ConversationPhase::Settling {
                cycle,
                hold: SettleHold::CorrectionHold,
            });
            return vec![OrchestratorCommand::ScheduleGrace {
                cycle,
                delay: self.timings.correction_hold,
            }];
        }

        self.thinking.is_active = false;
        self.transition(ConversationPhase::Idle);
        Vec::new()
    }

    fn is_awaiting(&self, cycle: CycleId) -> bool {
        self.phase == ConversationPhase::Submitting { cycle }
    }

    fn drop_stale(&self, kind: CallbackKind, cycle: CycleId) {
        self.observer
            .stale_callback_dropped(kind, cycle, self.current_cycle());
    }

    fn transition(&mut self, next: ConversationPhase) {
        let previous = std::mem::replace(&mut self.phase, next);
        self.observer.phase_changed(&previous, &self.phase);
    }
}

#[cfg(test)]
mod tests;
