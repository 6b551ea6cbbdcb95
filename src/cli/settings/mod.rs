//! Settings management for CLI set/unset commands.
//!
//! Each configuration key has a [`SettingHandler`]; the handler types are
//! data-driven where keys only differ in the field they touch:
//!
//! - Boolean settings (`markdown`)
//! - String settings (`base-url`, `query-path`, `health-path`)
//! - Number settings (`request-timeout-secs`, `grace-ms`, ...)
//! - List settings (`citation-prefixes`)

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod registry;

pub use error::SettingError;
pub use registry::SettingRegistry;

use crate::core::config::{Config, ConfigStore};

/// Context provided to setting handlers during set/unset operations.
pub struct SetContext<'a> {
    pub store: &'a ConfigStore,
    pub config: &'a Config,
}

/// Trait for handling a configuration setting.
///
/// Each implementation handles a specific configuration key,
/// providing set, unset, and format operations.
pub trait SettingHandler: Send + Sync {
    /// Returns the configuration key this handler manages.
    fn key(&self) -> &'static str;

    /// Set the configuration value from the arguments after the key.
    ///
    /// Returns the success message to display.
    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Unset (clear) the configuration value so the default applies.
    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError>;

    /// Format the current value for display in `financi config` output.
    fn format(&self, config: &Config) -> String;
}
