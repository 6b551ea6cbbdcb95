//! List-valued settings.

use crate::cli::settings::error::SettingError;
use crate::cli::settings::helpers::{mutate_config_with_message, success_set, success_unset};
use crate::cli::settings::{SetContext, SettingHandler};
use crate::core::config::defaults::DEFAULT_CITATION_PREFIXES;
use crate::core::config::Config;

/// Handler for the `citation-prefixes` setting.
///
/// Each argument is one prefix stripped from source links before display.
/// `none` stores an explicit empty list, which disables stripping.
pub struct CitationPrefixesHandler;

impl SettingHandler for CitationPrefixesHandler {
    fn key(&self) -> &'static str {
        "citation-prefixes"
    }

    fn set(&self, args: &[String], ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "Provide one or more URL prefixes, or 'none':",
                example: "financi set citation-prefixes https://example.com/ https://example.org/",
            });
        }

        let prefixes: Vec<String> =
            if args.len() == 1 && args[0].trim().eq_ignore_ascii_case("none") {
                Vec::new()
            } else {
                args.iter()
                    .map(|arg| arg.trim().to_string())
                    .filter(|arg| !arg.is_empty())
                    .collect()
            };
        let display = display_list(&prefixes);

        mutate_config_with_message(
            ctx.store,
            move |config| {
                config.citation_prefixes = Some(prefixes);
                Ok(())
            },
            success_set(self.key(), &display),
        )
    }

    fn unset(&self, ctx: &mut SetContext<'_>) -> Result<String, SettingError> {
        mutate_config_with_message(
            ctx.store,
            |config| {
                config.citation_prefixes = None;
                Ok(())
            },
            success_unset(self.key(), &DEFAULT_CITATION_PREFIXES.join(", ")),
        )
    }

    fn format(&self, config: &Config) -> String {
        match &config.citation_prefixes {
            Some(prefixes) => format!("  citation-prefixes: {}", display_list(prefixes)),
            None => format!(
                "  citation-prefixes: (unset, default: {})",
                DEFAULT_CITATION_PREFIXES.join(", ")
            ),
        }
    }
}

fn display_list(prefixes: &[String]) -> String {
    if prefixes.is_empty() {
        "(none)".to_string()
    } else {
        prefixes.join(", ")
    }
}
