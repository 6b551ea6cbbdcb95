//! Registry of setting handlers.

use std::collections::HashMap;

use super::handlers::{
    base_url_handler, correction_hold_handler, error_grace_handler, grace_handler,
    health_path_handler, markdown_handler, query_path_handler, request_timeout_handler,
    CitationPrefixesHandler,
};
use super::SettingHandler;

/// Registry of all available setting handlers.
pub struct SettingRegistry {
    handlers: HashMap<&'static str, Box<dyn SettingHandler>>,
    /// Keys in display order for `financi config` output.
    display_order: Vec<&'static str>,
}

impl SettingRegistry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
            display_order: Vec::new(),
        };

        registry.register(Box::new(base_url_handler()));
        registry.register(Box::new(query_path_handler()));
        registry.register(Box::new(health_path_handler()));
        registry.register(Box::new(request_timeout_handler()));
        registry.register(Box::new(markdown_handler()));
        registry.register(Box::new(CitationPrefixesHandler));
        registry.register(Box::new(grace_handler()));
        registry.register(Box::new(correction_hold_handler()));
        registry.register(Box::new(error_grace_handler()));

        registry
    }

    fn register(&mut self, handler: Box<dyn SettingHandler>) {
        let key = handler.key();
        self.display_order.push(key);
        self.handlers.insert(key, handler);
    }

    /// Get a handler by key.
    pub fn get(&self, key: &str) -> Option<&dyn SettingHandler> {
        self.handlers.get(key).map(|h| h.as_ref())
    }

    /// Get all keys in display order.
    pub fn keys_display_order(&self) -> &[&'static str] {
        &self.display_order
    }
}

impl Default for SettingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
