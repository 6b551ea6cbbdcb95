use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identity of the service-side agent that produced an answer.
///
/// The four known agents are closed variants. Anything else reported by the
/// service is kept verbatim in [`AgentId::Other`] so new agents can appear
/// without a client release; presentation treats them as the conversation
/// persona.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentId {
    #[default]
    Conversation,
    DatabaseQuery,
    GoogleSearch,
    Visualize,
    Other(String),
}

impl AgentId {
    pub const CONVERSATION: &'static str = "conversation";
    pub const DATABASE_QUERY: &'static str = "database_query";
    pub const GOOGLE_SEARCH: &'static str = "google_search";
    pub const VISUALIZE: &'static str = "visualize";

    /// Exact match against the canonical names after lowercase/trim.
    /// Unknown names are preserved; blank input collapses to conversation.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "" | Self::CONVERSATION => AgentId::Conversation,
            Self::DATABASE_QUERY => AgentId::DatabaseQuery,
            Self::GOOGLE_SEARCH => AgentId::GoogleSearch,
            Self::VISUALIZE => AgentId::Visualize,
            _ => AgentId::Other(normalized),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AgentId::Conversation => Self::CONVERSATION,
            AgentId::DatabaseQuery => Self::DATABASE_QUERY,
            AgentId::GoogleSearch => Self::GOOGLE_SEARCH,
            AgentId::Visualize => Self::VISUALIZE,
            AgentId::Other(name) => name.as_str(),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == AgentId::Conversation
    }

}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        AgentId::parse(&value)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        AgentId::parse(value)
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.as_str().to_string()
    }
}

impl PartialEq<&str> for AgentId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(AgentId::parse("  Database_Query "), AgentId::DatabaseQuery);
        assert_eq!(AgentId::parse("VISUALIZE"), AgentId::Visualize);
        assert_eq!(AgentId::parse("google_search"), AgentId::GoogleSearch);
    }

    #[test]
    fn blank_names_fall_back_to_conversation() {
        assert_eq!(AgentId::parse(""), AgentId::Conversation);
        assert_eq!(AgentId::parse("   "), AgentId::Conversation);
    }

    #[test]
    fn unknown_names_pass_through_lowercased() {
        let agent = AgentId::parse("Vector_Search");
        assert_eq!(agent, AgentId::Other("vector_search".to_string()));
        assert_eq!(agent.as_str(), "vector_search");
    }

    #[test]
    fn serde_uses_canonical_strings() {
        let json = serde_json::to_string(&AgentId::DatabaseQuery).unwrap();
        assert_eq!(json, "\"database_query\"");
        let back: AgentId = serde_json::from_str("\"visualize\"").unwrap();
        assert_eq!(back, AgentId::Visualize);
    }
}
