//! Hooks into the conversation state machine.
//!
//! The orchestrator reports every transition through a
//! [`ConversationObserver`]. Production code uses [`TracingObserver`], which
//! turns each hook into a structured `tracing` event; tests install their own
//! recorder.

use tracing::{debug, info, warn};

use crate::api::QueryError;
use crate::core::agent::AgentId;
use crate::core::classifier::Classification;
use crate::core::orchestrator::{ConversationPhase, CycleId};

/// Which kind of late callback was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    Response,
    Failure,
    GraceElapsed,
}

impl CallbackKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallbackKind::Response => "response",
            CallbackKind::Failure => "failure",
            CallbackKind::GraceElapsed => "grace_elapsed",
        }
    }
}

pub trait ConversationObserver: Send + Sync {
    fn submitted(&self, _cycle: CycleId, _question: &str) {}

    fn agent_resolved(&self, _cycle: CycleId, _classification: &Classification) {}

    fn indicator_corrected(&self, _cycle: CycleId, _from: &AgentId, _to: &AgentId) {}

    fn phase_changed(&self, _from: &ConversationPhase, _to: &ConversationPhase) {}

    fn request_failed(&self, _cycle: CycleId, _error: &QueryError) {}

    fn stale_callback_dropped(
        &self,
        _kind: CallbackKind,
        _cycle: CycleId,
        _current: Option<CycleId>,
    ) {
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ConversationObserver for TracingObserver {
    fn submitted(&self, cycle: CycleId, question: &str) {
        info!(%cycle, chars = question.chars().count(), "Question submitted");
    }

    fn agent_resolved(&self, cycle: CycleId, classification: &Classification) {
        info!(
            %cycle,
            agent = %classification.agent,
            source = %classification.source,
            "Agent resolved"
        );
    }

    fn indicator_corrected(&self, cycle: CycleId, from: &AgentId, to: &AgentId) {
        debug!(%cycle, %from, %to, "Thinking indicator corrected");
    }

    fn phase_changed(&self, from: &ConversationPhase, to: &ConversationPhase) {
        debug!(from = %from, to = %to, "Phase changed");
    }

    fn request_failed(&self, cycle: CycleId, error: &QueryError) {
        warn!(%cycle, kind = error.kind(), error = %error, "Request failed");
    }

    fn stale_callback_dropped(&self, kind: CallbackKind, cycle: CycleId, current: Option<CycleId>) {
        match current {
            Some(current) => {
                debug!(kind = kind.as_str(), %cycle, %current, "Dropped stale callback")
            }
            None => debug!(kind = kind.as_str(), %cycle, "Dropped stale callback while idle"),
        }
    }
}
