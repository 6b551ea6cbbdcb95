use crate::api::client::ServiceEndpoint;
use crate::core::config::Config;
use crate::core::orchestrator::ConversationOrchestrator;
use crate::utils::logging::LoggingState;

pub mod actions;
pub mod session;
pub mod ui_state;

pub use actions::{
    apply_action, apply_actions, AppAction, AppActionContext, AppActionDispatcher,
    AppActionEnvelope, AppCommand,
};
pub use session::SessionContext;
pub use ui_state::UiState;

/// Everything the interactive client owns: the conversation, the service
/// session and the screen state.
pub struct App {
    pub conversation: ConversationOrchestrator,
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    pub fn new(config: Config, logging: LoggingState) -> Self {
        let endpoint = config.endpoint(None, None);
        Self::with_endpoint(config, endpoint, logging)
    }

    pub fn with_endpoint(config: Config, endpoint: ServiceEndpoint, logging: LoggingState) -> Self {
        Self {
            conversation: ConversationOrchestrator::new(config.timings()),
            session: SessionContext::new(endpoint, config.citation_prefixes(), logging),
            ui: UiState::new(config.markdown_enabled()),
        }
    }

    /// Mirror new transcript entries into the log file, reporting failures
    /// on the status line.
    pub fn sync_transcript_log(&mut self) {
        if let Err(message) = self
            .session
            .log_new_messages(self.conversation.messages())
        {
            self.ui.set_status(message);
        }
    }
}
