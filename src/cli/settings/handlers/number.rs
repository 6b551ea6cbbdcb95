//! Numeric setting handlers for the request timeout and presentation timings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::defaults::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::core::config::Config;
use crate::core::orchestrator::Timings;

/// Data-driven handler for positive integer settings.
pub struct NumberHandler {
    key: &'static str,
    example: &'static str,
    default_value: fn() -> u64,
    get: fn(&Config) -> Option<u64>,
    set_field: fn(&mut Config, Option<u64>),
}

impl SettingHandler for NumberHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let Some(input) = args.first() else {
            return Err(SettingError::MissingArgs {
                hint: "Provide a whole number:",
                example: self.example,
            });
        };

        let value = input
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| SettingError::InvalidNumber {
                key: self.key,
                input: input.clone(),
            })?;
        let set_field = self.set_field;

        mutate_config_with_message(
            ctx.store,
            move |config| {
                set_field(config, Some(value));
                Ok(())
            },
            success_set(self.key, &value.to_string()),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        let set_field = self.set_field;
        let default = (self.default_value)().to_string();
        mutate_config_with_message(
            ctx.store,
            move |config| {
                set_field(config, None);
                Ok(())
            },
            success_unset(self.key, &default),
        )
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {value}", self.key),
            None => format!(
                "  {}: (unset, default: {})",
                self.key,
                (self.default_value)()
            ),
        }
    }
}

fn millis(value: std::time::Duration) -> u64 {
    u64::try_from(value.as_millis()).unwrap_or(u64::MAX)
}

/// Create a handler for the `request-timeout-secs` setting.
pub fn request_timeout_handler() -> NumberHandler {
    NumberHandler {
        key: "request-timeout-secs",
        example: "financi set request-timeout-secs 60",
        default_value: || DEFAULT_REQUEST_TIMEOUT_SECS,
        get: |c| c.request_timeout_secs,
        set_field: |c, v| c.request_timeout_secs = v,
    }
}

/// Create a handler for the `grace-ms` setting.
pub fn grace_handler() -> NumberHandler {
    NumberHandler {
        key: "grace-ms",
        example: "financi set grace-ms 800",
        default_value: || millis(Timings::default().grace),
        get: |c| c.timings.grace_ms,
        set_field: |c, v| c.timings.grace_ms = v,
    }
}

/// Create a handler for the `correction-hold-ms` setting.
pub fn correction_hold_handler() -> NumberHandler {
    NumberHandler {
        key: "correction-hold-ms",
        example: "financi set correction-hold-ms 1500",
        default_value: || millis(Timings::default().correction_hold),
        get: |c| c.timings.correction_hold_ms,
        set_field: |c, v| c.timings.correction_hold_ms = v,
    }
}

/// Create a handler for the `error-grace-ms` setting.
pub fn error_grace_handler() -> NumberHandler {
    NumberHandler {
        key: "error-grace-ms",
        example: "financi set error-grace-ms 500",
        default_value: || millis(Timings::default().error_grace),
        get: |c| c.timings.error_grace_ms,
        set_field: |c, v| c.timings.error_grace_ms = v,
    }
}
