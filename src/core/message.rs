use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::core::agent::AgentId;
use crate::core::response::{ChartRef, Citation, ParsedResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TranscriptRole {
    User,
    Assistant,
    AppInfo,
    AppError,
}

impl TranscriptRole {
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptRole::User => "user",
            TranscriptRole::Assistant => "assistant",
            TranscriptRole::AppInfo => "app/info",
            TranscriptRole::AppError => "app/error",
        }
    }

    pub fn is_user(self) -> bool {
        self == TranscriptRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == TranscriptRole::Assistant
    }

    pub fn is_app(self) -> bool {
        matches!(self, TranscriptRole::AppInfo | TranscriptRole::AppError)
    }
}

impl TryFrom<&str> for TranscriptRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(TranscriptRole::User),
            "assistant" => Ok(TranscriptRole::Assistant),
            "app/info" => Ok(TranscriptRole::AppInfo),
            "app/error" => Ok(TranscriptRole::AppError),
            _ => Err(format!("invalid transcript role: {value}")),
        }
    }
}

impl TryFrom<String> for TranscriptRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<TranscriptRole> for String {
    fn from(value: TranscriptRole) -> Self {
        value.as_str().to_string()
    }
}

/// One transcript entry. Entries are only ever appended; nothing edits them
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: TranscriptRole,
    pub content: String,
    pub timestamp: String,
    /// Agent credited for an assistant answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartRef>,
}

pub fn current_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

impl Message {
    pub fn new(role: TranscriptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: current_timestamp(),
            agent: None,
            citations: Vec::new(),
            chart: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::User, content)
    }

    pub fn assistant(parsed: ParsedResponse, agent: AgentId) -> Self {
        let ParsedResponse {
            answer,
            citations,
            chart,
        } = parsed;
        Self {
            agent: Some(agent),
            citations,
            chart,
            ..Self::new(TranscriptRole::Assistant, answer)
        }
    }

    pub fn app_info(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::AppInfo, content)
    }

    pub fn app_error(content: impl Into<String>) -> Self {
        Self::new(TranscriptRole::AppError, content)
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn is_from_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    pub fn is_error(&self) -> bool {
        self.role == TranscriptRole::AppError
    }

    pub fn chart_image_data(&self) -> Option<&str> {
        self.chart.as_ref().and_then(ChartRef::inline_data)
    }

    pub fn chart_image_path(&self) -> Option<&str> {
        self.chart.as_ref().and_then(ChartRef::service_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_messages_carry_parsed_fields() {
        let parsed = ParsedResponse {
            answer: "Revenue grew".to_string(),
            citations: vec![Citation::new("http://a")],
            chart: Some(ChartRef::Path(
                "/visualizations/visualization_1.png".to_string(),
            )),
        };
        let message = Message::assistant(parsed, AgentId::Visualize);
        assert!(message.is_assistant());
        assert!(!message.is_from_user());
        assert_eq!(message.agent, Some(AgentId::Visualize));
        assert_eq!(message.citations.len(), 1);
        assert_eq!(
            message.chart_image_path(),
            Some("/visualizations/visualization_1.png")
        );
        assert!(message.chart_image_data().is_none());
    }

    #[test]
    fn timestamps_use_wall_clock_format() {
        let message = Message::user("hello");
        assert_eq!(message.timestamp.len(), 8);
        assert_eq!(message.timestamp.matches(':').count(), 2);
    }

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(TranscriptRole::try_from("system").is_err());
        assert_eq!(
            TranscriptRole::try_from("app/error"),
            Ok(TranscriptRole::AppError)
        );
    }
}
