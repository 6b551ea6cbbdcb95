//! Spawned work that feeds results back to the orchestrator.
//!
//! Both services report over unbounded channels tagged with the cycle they
//! were started for; the receiver forwards them to the orchestrator, which
//! decides whether the cycle is still current.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{QueryError, QueryResponse, QueryTransport};
use crate::core::message::Message;
use crate::core::orchestrator::{
    ConversationOrchestrator, CycleId, OrchestratorCommand, SubmitError,
};

#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Answered(QueryResponse),
    Failed(QueryError),
}

impl From<Result<QueryResponse, QueryError>> for QueryOutcome {
    fn from(result: Result<QueryResponse, QueryError>) -> Self {
        match result {
            Ok(response) => QueryOutcome::Answered(response),
            Err(error) => QueryOutcome::Failed(error),
        }
    }
}

impl QueryOutcome {
    /// Hand the outcome to the orchestrator.
    pub fn apply(
        self,
        orchestrator: &mut ConversationOrchestrator,
        cycle: CycleId,
    ) -> Vec<OrchestratorCommand> {
        match self {
            QueryOutcome::Answered(response) => orchestrator.on_response(cycle, response),
            QueryOutcome::Failed(error) => orchestrator.on_failure(cycle, error),
        }
    }
}

#[derive(Clone)]
pub struct QueryService {
    transport: Arc<dyn QueryTransport>,
    tx: mpsc::UnboundedSender<(QueryOutcome, CycleId)>,
    shutdown: CancellationToken,
}

impl QueryService {
    pub fn new(
        transport: Arc<dyn QueryTransport>,
    ) -> (Self, mpsc::UnboundedReceiver<(QueryOutcome, CycleId)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                transport,
                tx,
                shutdown: CancellationToken::new(),
            },
            rx,
        )
    }

    pub fn spawn_query(&self, cycle: CycleId, question: String) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let cancel = self.shutdown.child_token();
        tokio::spawn(async move {
            tokio::select! {
                result = transport.query(&question) => {
                    let _ = tx.send((QueryOutcome::from(result), cycle));
                }
                _ = cancel.cancelled() => {
                    debug!(%cycle, "Query abandoned");
                }
            }
        });
    }

    /// Abandon every in-flight query; nothing is reported for them.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Reported when a scheduled grace period runs to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraceElapsed {
    pub cycle: CycleId,
}

/// Cancellable delayed callbacks keyed by cycle.
pub struct GraceScheduler {
    tx: mpsc::UnboundedSender<GraceElapsed>,
    timers: BTreeMap<CycleId, CancellationToken>,
}

impl GraceScheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<GraceElapsed>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                timers: BTreeMap::new(),
            },
            rx,
        )
    }

    /// Replaces any timer already pending for `cycle`. Timers of older
    /// cycles are cancelled too, since they can only ever be stale.
    pub fn schedule(&mut self, cycle: CycleId, delay: Duration) {
        let newer = self.timers.split_off(&cycle);
        for (_, token) in std::mem::replace(&mut self.timers, newer) {
            token.cancel();
        }
        if let Some(previous) = self.timers.remove(&cycle) {
            previous.cancel();
        }

        let token = CancellationToken::new();
        self.timers.insert(cycle, token.clone());

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(GraceElapsed { cycle });
                }
                _ = token.cancelled() => {}
            }
        });
    }

    pub fn cancel(&mut self, cycle: CycleId) {
        if let Some(token) = self.timers.remove(&cycle) {
            token.cancel();
            debug!(%cycle, "Grace timer cancelled");
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, token) in std::mem::take(&mut self.timers) {
            token.cancel();
        }
    }

    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GracePolicy {
    /// Sleep for each scheduled delay, as the interactive UI would.
    Honour,
    /// Fire grace callbacks immediately.
    Skip,
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub cycle: CycleId,
    /// Transcript entries appended during the turn, the user's included.
    pub messages: Vec<Message>,
}

impl TurnReport {
    pub fn reply(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|message| !message.is_from_user())
    }
}

/// Run one full submit-to-idle cycle without a UI.
pub async fn drive_turn(
    orchestrator: &mut ConversationOrchestrator,
    transport: &dyn QueryTransport,
    question: &str,
    policy: GracePolicy,
) -> Result<TurnReport, SubmitError> {
    let start = orchestrator.messages().len();
    let mut pending: VecDeque<OrchestratorCommand> = orchestrator.submit(question)?.into();
    let mut cycle = None;

    while let Some(command) = pending.pop_front() {
        match command {
            OrchestratorCommand::SendQuery {
                cycle: sent,
                question,
            } => {
                cycle = Some(sent);
                let outcome = QueryOutcome::from(transport.query(&question).await);
                pending.extend(outcome.apply(orchestrator, sent));
            }
            OrchestratorCommand::ScheduleGrace { cycle, delay } => {
                if policy == GracePolicy::Honour {
                    tokio::time::sleep(delay).await;
                }
                pending.extend(orchestrator.on_grace_elapsed(cycle));
            }
            OrchestratorCommand::CancelGrace { .. } => {}
        }
    }

    Ok(TurnReport {
        cycle: cycle.unwrap_or_default(),
        messages: orchestrator.messages()[start..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::AgentId;
    use crate::core::orchestrator::Timings;
    use crate::utils::test_utils::{database_answer, RecordingObserver, ScriptedTransport};

    #[tokio::test]
    async fn drive_turn_runs_to_idle() {
        let observer = RecordingObserver::new();
        let mut orchestrator =
            ConversationOrchestrator::with_observer(Timings::default(), observer.boxed());
        let transport = ScriptedTransport::new([Ok(database_answer())]);

        let report = drive_turn(&mut orchestrator, &transport, "AAPL?", GracePolicy::Skip)
            .await
            .expect("turn");

        assert!(orchestrator.phase().is_idle());
        assert_eq!(report.messages.len(), 2);
        assert_eq!(
            report.reply().and_then(|m| m.agent.clone()),
            Some(AgentId::DatabaseQuery)
        );
        assert_eq!(transport.questions(), vec!["AAPL?".to_string()]);
    }

    #[tokio::test]
    async fn drive_turn_surfaces_failures_as_messages() {
        let observer = RecordingObserver::new();
        let mut orchestrator =
            ConversationOrchestrator::with_observer(Timings::default(), observer.boxed());
        let transport =
            ScriptedTransport::new([Err(QueryError::Transport("connection refused".into()))]);

        let report = drive_turn(&mut orchestrator, &transport, "hi", GracePolicy::Skip)
            .await
            .expect("turn");

        assert!(orchestrator.phase().is_idle());
        assert!(report.reply().is_some_and(Message::is_error));
        assert_eq!(observer.classification_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn honoured_grace_waits_for_the_hold() {
        let mut orchestrator = ConversationOrchestrator::with_observer(
            Timings::default(),
            RecordingObserver::new().boxed(),
        );
        let transport = ScriptedTransport::new([Ok(database_answer())]);
        let started = tokio::time::Instant::now();

        drive_turn(&mut orchestrator, &transport, "AAPL?", GracePolicy::Honour)
            .await
            .expect("turn");

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(1100), "{elapsed:?}");
    }

    #[tokio::test]
    async fn blank_questions_never_reach_the_transport() {
        let mut orchestrator = ConversationOrchestrator::default();
        let transport = ScriptedTransport::new([]);
        let err = drive_turn(&mut orchestrator, &transport, "   ", GracePolicy::Skip)
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::EmptyMessage);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn query_service_tags_results_with_their_cycle() {
        let transport = Arc::new(ScriptedTransport::new([Ok(database_answer())]));
        let (service, mut rx) = QueryService::new(transport);

        service.spawn_query(CycleId::new(7), "AAPL?".to_string());
        let (outcome, cycle) = rx.recv().await.expect("outcome");
        assert_eq!(cycle, CycleId::new(7));
        assert!(matches!(outcome, QueryOutcome::Answered(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn grace_scheduler_fires_after_delay() {
        let (mut scheduler, mut rx) = GraceScheduler::new();
        scheduler.schedule(CycleId::new(1), Duration::from_millis(800));

        let elapsed = rx.recv().await.expect("grace elapsed");
        assert_eq!(elapsed, GraceElapsed { cycle: CycleId::new(1) });
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_grace_never_fires() {
        let (mut scheduler, mut rx) = GraceScheduler::new();
        scheduler.schedule(CycleId::new(1), Duration::from_millis(800));
        scheduler.cancel(CycleId::new(1));
        scheduler.schedule(CycleId::new(2), Duration::from_millis(500));

        let elapsed = rx.recv().await.expect("grace elapsed");
        assert_eq!(elapsed.cycle, CycleId::new(2));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn scheduling_a_newer_cycle_cancels_older_timers() {
        let (mut scheduler, mut rx) = GraceScheduler::new();
        scheduler.schedule(CycleId::new(1), Duration::from_millis(800));
        scheduler.schedule(CycleId::new(2), Duration::from_millis(800));
        assert_eq!(scheduler.pending(), 1);

        let elapsed = rx.recv().await.expect("grace elapsed");
        assert_eq!(elapsed.cycle, CycleId::new(2));
    }
}
