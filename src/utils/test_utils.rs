use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::api::{QueryError, QueryResponse, QueryTransport};
use crate::core::agent::AgentId;
use crate::core::app::App;
use crate::core::classifier::Classification;
use crate::core::config::Config;
use crate::core::observer::{CallbackKind, ConversationObserver};
use crate::core::orchestrator::{ConversationPhase, CycleId};
use crate::utils::logging::LoggingState;

/// Everything a [`RecordingObserver`] saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Submitted(CycleId),
    AgentResolved(CycleId, AgentId),
    IndicatorCorrected(CycleId, AgentId, AgentId),
    PhaseChanged(ConversationPhase, ConversationPhase),
    RequestFailed(CycleId),
    StaleDropped(CallbackKind, CycleId),
}

#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed(&self) -> Box<dyn ConversationObserver> {
        Box::new(self.clone())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn classification_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ObservedEvent::AgentResolved(..)))
            .count()
    }

    pub fn stale_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, ObservedEvent::StaleDropped(..)))
            .count()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ConversationObserver for RecordingObserver {
    fn submitted(&self, cycle: CycleId, _question: &str) {
        self.push(ObservedEvent::Submitted(cycle));
    }

    fn agent_resolved(&self, cycle: CycleId, classification: &Classification) {
        self.push(ObservedEvent::AgentResolved(cycle, classification.agent.clone()));
    }

    fn indicator_corrected(&self, cycle: CycleId, from: &AgentId, to: &AgentId) {
        self.push(ObservedEvent::IndicatorCorrected(cycle, from.clone(), to.clone()));
    }

    fn phase_changed(&self, from: &ConversationPhase, to: &ConversationPhase) {
        self.push(ObservedEvent::PhaseChanged(*from, *to));
    }

    fn request_failed(&self, cycle: CycleId, _error: &QueryError) {
        self.push(ObservedEvent::RequestFailed(cycle));
    }

    fn stale_callback_dropped(
        &self,
        kind: CallbackKind,
        cycle: CycleId,
        _current: Option<CycleId>,
    ) {
        self.push(ObservedEvent::StaleDropped(kind, cycle));
    }
}

/// Replays canned results in order; runs out into a transport error.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<QueryResponse, QueryError>>>,
    questions: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Result<QueryResponse, QueryError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryTransport for ScriptedTransport {
    async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.questions.lock().unwrap().push(question.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::Transport("script exhausted".to_string())))
    }
}

pub fn response_from(value: serde_json::Value) -> QueryResponse {
    QueryResponse::from_value(value).expect("test response must be valid")
}

pub fn database_answer() -> QueryResponse {
    response_from(json!({
        "answer": "Theo dữ liệu, cổ phiếu AAPL đóng cửa ở mức 190 USD.",
        "routing_info": {"selected_agents": ["database_query"]},
        "current_agent": "conversation"
    }))
}

pub fn plain_answer() -> QueryResponse {
    response_from(json!({"answer": "Xin chào!"}))
}

pub fn create_test_app() -> App {
    App::new(Config::default(), LoggingState::new(None).unwrap())
}

pub const SAMPLE_MARKDOWN_ANSWER: &str = "## Apple Inc. (AAPL)

Closing prices for the **last three sessions**:

| Date | Close |
|------|-------|
| 2024-05-01 | 169.30 |
| 2024-05-02 | 173.03 |

- Volume rose *12%*
- Source: `stock_prices` table

```sql
SELECT close FROM stock_prices WHERE ticker = 'AAPL';
```";
