use crate::api::client::ServiceEndpoint;
use crate::core::config::ConfigStore;
use crate::core::message::Message;
use crate::utils::logging::{LoggingState, PlainTextContext};

pub struct SessionContext {
    pub endpoint: ServiceEndpoint,
    pub citation_prefixes: Vec<String>,
    pub logging: LoggingState,
    /// Where `/markdown` persists its choice. Unset in tests and when the
    /// platform has no config directory.
    pub config_store: Option<ConfigStore>,
    /// Number of transcript entries already handed to the transcript log.
    logged_len: usize,
}

impl SessionContext {
    pub fn new(
        endpoint: ServiceEndpoint,
        citation_prefixes: Vec<String>,
        logging: LoggingState,
    ) -> Self {
        Self {
            endpoint,
            citation_prefixes,
            logging,
            config_store: None,
            logged_len: 0,
        }
    }

    pub fn plain_text_context(&self) -> PlainTextContext {
        PlainTextContext {
            base_url: self.endpoint.base_url.clone(),
            citation_prefixes: self.citation_prefixes.clone(),
        }
    }

    /// Append entries added since the last call to the transcript log.
    /// Entries written while logging is paused are skipped, not queued.
    pub fn log_new_messages(&mut self, messages: &[Message]) -> Result<(), String> {
        let start = self.logged_len.min(messages.len());
        self.logged_len = messages.len();
        let context = self.plain_text_context();
        for message in &messages[start..] {
            self.logging
                .log_message(message, &context)
                .map_err(|err| format!("Log error: {err}"))?;
        }
        Ok(())
    }
}
