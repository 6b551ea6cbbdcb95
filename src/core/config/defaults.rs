use std::time::Duration;

use crate::api::client::ServiceEndpoint;
use crate::core::config::data::Config;
use crate::core::orchestrator::Timings;
use crate::utils::url::normalize_base_url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_QUERY_PATH: &str = "api/query";
pub const DEFAULT_HEALTH_PATH: &str = "api/health";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CITATION_PREFIXES: &[&str] = &["https://tamanhhospital.vn/"];

/// Environment override for the service root.
pub const BASE_URL_ENV: &str = "FINANCI_BASE_URL";

impl Config {
    /// Flag, then environment, then config file, then the built-in default.
    /// Blank values at any level are skipped.
    pub fn resolve_base_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
        let chosen = [flag, env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or(DEFAULT_BASE_URL);
        normalize_base_url(chosen)
    }

    pub fn endpoint(&self, flag: Option<&str>, env: Option<&str>) -> ServiceEndpoint {
        ServiceEndpoint {
            base_url: self.resolve_base_url(flag, env),
            query_path: self
                .query_path
                .clone()
                .unwrap_or_else(|| DEFAULT_QUERY_PATH.to_string()),
            health_path: self
                .health_path
                .clone()
                .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn citation_prefixes(&self) -> Vec<String> {
        match &self.citation_prefixes {
            Some(prefixes) => prefixes.clone(),
            None => DEFAULT_CITATION_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
        }
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown.unwrap_or(true)
    }

    pub fn timings(&self) -> Timings {
        let defaults = Timings::default();
        let millis = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_millis).unwrap_or(fallback)
        };
        Timings {
            grace: millis(self.timings.grace_ms, defaults.grace),
            correction_hold: millis(self.timings.correction_hold_ms, defaults.correction_hold),
            error_grace: millis(self.timings.error_grace_ms, defaults.error_grace),
        }
    }
}
