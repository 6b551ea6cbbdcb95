use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Indicator delays in milliseconds. Unset values fall back to the defaults
/// in [`crate::core::orchestrator::Timings`].
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct TimingsConfig {
    pub grace_ms: Option<u64>,
    pub correction_hold_ms: Option<u64>,
    pub error_grace_ms: Option<u64>,
}

impl TimingsConfig {
    pub fn is_empty(&self) -> bool {
        self.grace_ms.is_none()
            && self.correction_hold_ms.is_none()
            && self.error_grace_ms.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Service root, e.g. `http://localhost:8080`. Chart paths resolve against it.
    pub base_url: Option<String>,
    pub query_path: Option<String>,
    pub health_path: Option<String>,
    pub request_timeout_secs: Option<u64>,
    /// Prefixes removed from citation links when building their labels
    pub citation_prefixes: Option<Vec<String>>,
    /// Render answers as markdown in the chat area
    pub markdown: Option<bool>,
    #[serde(default, skip_serializing_if = "TimingsConfig::is_empty")]
    pub timings: TimingsConfig,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
