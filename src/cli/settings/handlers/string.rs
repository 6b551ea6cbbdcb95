//! String setting handlers for the service location.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::defaults::{DEFAULT_BASE_URL, DEFAULT_HEALTH_PATH, DEFAULT_QUERY_PATH};
use crate::core::config::Config;
use crate::utils::url::{normalize_base_url, strip_scheme};

/// Data-driven handler for single-string settings.
pub struct StringHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    validate: fn(&str) -> Result<String, SettingError>,
    get: fn(&Config) -> Option<&String>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for StringHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let input = args.join(" ");
        if input.trim().is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let value = (self.validate)(input.trim())?;
        let message = success_set(self.key, &value);
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.store,
            move |config| {
                set_field(config, Some(value));
                Ok(())
            },
            message,
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config_with_message(
            ctx.store,
            move |config| {
                set_field(config, None);
                Ok(())
            },
            success_unset(self.key, self.default_display),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

fn validate_base_url(input: &str) -> Result<String, SettingError> {
    let rest = strip_scheme(input);
    if rest.len() == input.len() || rest.trim_matches('/').is_empty() {
        return Err(SettingError::InvalidUrl(input.to_string()));
    }
    Ok(normalize_base_url(input))
}

fn validate_path(input: &str) -> Result<String, SettingError> {
    Ok(input.trim_start_matches('/').to_string())
}

/// Create a handler for the `base-url` setting.
pub fn base_url_handler() -> StringHandler {
    StringHandler {
        key: "base-url",
        hint: "To set the service root, provide an http(s) URL:",
        example: "financi set base-url http://localhost:8080",
        default_display: DEFAULT_BASE_URL,
        validate: validate_base_url,
        get: |c| c.base_url.as_ref(),
        set_field: |c, v| c.base_url = v,
    }
}

/// Create a handler for the `query-path` setting.
pub fn query_path_handler() -> StringHandler {
    StringHandler {
        key: "query-path",
        hint: "To set the query endpoint, provide a path relative to the service root:",
        example: "financi set query-path api/query",
        default_display: DEFAULT_QUERY_PATH,
        validate: validate_path,
        get: |c| c.query_path.as_ref(),
        set_field: |c, v| c.query_path = v,
    }
}

/// Create a handler for the `health-path` setting.
pub fn health_path_handler() -> StringHandler {
    StringHandler {
        key: "health-path",
        hint: "To set the health endpoint, provide a path relative to the service root:",
        example: "financi set health-path api/health",
        default_display: DEFAULT_HEALTH_PATH,
        validate: validate_path,
        get: |c| c.health_path.as_ref(),
        set_field: |c, v| c.health_path = v,
    }
}
