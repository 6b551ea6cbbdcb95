//! Attribution of an answer to the agent that produced it.
//!
//! Signals are tried from most to least authoritative: the agent the service
//! names itself, then the router's selection, then keywords in the answer.
//! The first signal that yields something other than the conversation agent
//! wins. Every input resolves to an [`AgentId`]; nothing here can fail.

use std::fmt;

use crate::api::{AgentHint, RoutingInfo};
use crate::core::agent::AgentId;

/// Answer keywords that point at the database agent.
pub const FINANCE_KEYWORDS: &[&str] = &["database", "sql", "query", "dữ liệu", "bảng", "cổ phiếu"];

/// Answer keywords that point at the web search agent.
pub const SEARCH_KEYWORDS: &[&str] = &[
    "search",
    "tìm kiếm",
    "google",
    "web",
    "tin tức",
    "mới nhất",
];

/// Which signal settled the classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Hint,
    Routing,
    Keywords,
    /// No signal named a specialised agent.
    Fallback,
}

impl SignalSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalSource::Hint => "hint",
            SignalSource::Routing => "routing",
            SignalSource::Keywords => "keywords",
            SignalSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub agent: AgentId,
    pub source: SignalSource,
}

impl Classification {
    fn new(agent: AgentId, source: SignalSource) -> Self {
        Self { agent, source }
    }
}

/// Everything the classifier looks at for one answer.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub hint: Option<&'a AgentHint>,
    pub answer: &'a str,
    pub routing: Option<&'a RoutingInfo>,
    pub has_chart: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentClassifier;

impl AgentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, input: ClassifierInput<'_>) -> AgentId {
        self.classify_detailed(input).agent
    }

    pub fn classify_detailed(&self, input: ClassifierInput<'_>) -> Classification {
        if let Some(agent) = input
            .hint
            .map(|hint| agent_from_hint(hint.as_str()))
            .filter(|agent| !agent.is_default())
        {
            return Classification::new(agent, SignalSource::Hint);
        }

        if let Some(agent) = input
            .routing
            .map(|routing| agent_from_routing(routing, input.has_chart))
            .filter(|agent| !agent.is_default())
        {
            return Classification::new(agent, SignalSource::Routing);
        }

        let agent = agent_from_answer(input.answer, input.has_chart);
        if agent.is_default() {
            Classification::new(agent, SignalSource::Fallback)
        } else {
            Classification::new(agent, SignalSource::Keywords)
        }
    }
}

/// Substring match on the normalised hint; unrecognised names pass through.
pub fn agent_from_hint(raw: &str) -> AgentId {
    let normalized = raw.trim().to_lowercase();
    if normalized.contains("visual") {
        AgentId::Visualize
    } else if normalized.contains("database") || normalized == "db" {
        AgentId::DatabaseQuery
    } else if normalized.contains("search") || normalized.contains("google") {
        AgentId::GoogleSearch
    } else {
        AgentId::parse(&normalized)
    }
}

/// Fixed priority over the selected agents. `visualize` only counts when
/// there is a chart to show for it.
pub fn agent_from_routing(routing: &RoutingInfo, has_chart: bool) -> AgentId {
    let selection = routing.selection();
    let selected: Vec<AgentId> = selection
        .names()
        .iter()
        .map(|name| AgentId::parse(name))
        .collect();

    if has_chart && selected.contains(&AgentId::Visualize) {
        return AgentId::Visualize;
    }
    for preferred in [AgentId::DatabaseQuery, AgentId::GoogleSearch] {
        if selected.contains(&preferred) {
            return preferred;
        }
    }

    selected
        .into_iter()
        .find(|agent| *agent != AgentId::Visualize)
        .unwrap_or_default()
}

/// Last resort: a chart, then finance keywords, then search keywords.
pub fn agent_from_answer(answer: &str, has_chart: bool) -> AgentId {
    if has_chart {
        return AgentId::Visualize;
    }

    let lowered = answer.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| lowered.contains(keyword));

    if mentions(FINANCE_KEYWORDS) {
        AgentId::DatabaseQuery
    } else if mentions(SEARCH_KEYWORDS) {
        AgentId::GoogleSearch
    } else {
        AgentId::Conversation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn routing(value: serde_json::Value) -> RoutingInfo {
        RoutingInfo::from_value(&value).expect("routing object")
    }

    fn classify(
        hint: Option<&str>,
        answer: &str,
        routing: Option<&RoutingInfo>,
        has_chart: bool,
    ) -> Classification {
        let hint = hint.map(AgentHint::new);
        AgentClassifier::new().classify_detailed(ClassifierInput {
            hint: hint.as_ref(),
            answer,
            routing,
            has_chart,
        })
    }

    #[test]
    fn malformed_routing_falls_back_to_conversation() {
        let junk = routing(json!({
            "selected_agents": "visualize",
            "agents": [1, null, {"name": 3}]
        }));
        let result = classify(None, "Xin chào!", Some(&junk), false);
        assert_eq!(result.agent, AgentId::Conversation);
        assert_eq!(result.source, SignalSource::Fallback);

        assert_eq!(classify(None, "Hello", None, false).agent, AgentId::Conversation);
    }

    #[test]
    fn visualize_outranks_database_only_with_a_chart() {
        let both = routing(json!({"selected_agents": ["database_query", "visualize"]}));
        assert_eq!(classify(None, "", Some(&both), true).agent, AgentId::Visualize);
        assert_eq!(classify(None, "", Some(&both), false).agent, AgentId::DatabaseQuery);
    }

    #[test]
    fn visualize_alone_without_chart_is_not_reported() {
        let only_visual = routing(json!({"selected_agents": ["visualize"]}));
        let result = classify(None, "Here is the summary", Some(&only_visual), false);
        assert_eq!(result.agent, AgentId::Conversation);
    }

    #[test]
    fn explicit_hint_wins_regardless_of_other_signals() {
        let search = routing(json!({"selected_agents": ["google_search"]}));
        let result = classify(Some("Database_Query"), "tin tức mới nhất", Some(&search), true);
        assert_eq!(result.agent, AgentId::DatabaseQuery);
        assert_eq!(result.source, SignalSource::Hint);
    }

    #[test]
    fn hint_matching_is_by_substring() {
        assert_eq!(agent_from_hint(" Visualization "), AgentId::Visualize);
        assert_eq!(agent_from_hint("DB"), AgentId::DatabaseQuery);
        assert_eq!(agent_from_hint("dbx"), AgentId::Other("dbx".to_string()));
        assert_eq!(agent_from_hint("google"), AgentId::GoogleSearch);
        assert_eq!(agent_from_hint("web_search_v2"), AgentId::GoogleSearch);
        assert_eq!(agent_from_hint("  "), AgentId::Conversation);
    }

    #[test]
    fn unknown_hints_pass_through() {
        let result = classify(Some("Synthesizer"), "", None, false);
        assert_eq!(result.agent, AgentId::Other("synthesizer".to_string()));
        assert_eq!(result.source, SignalSource::Hint);
    }

    #[test]
    fn hint_is_trusted_even_without_chart() {
        assert_eq!(classify(Some("visualize"), "", None, false).agent, AgentId::Visualize);
    }

    #[test]
    fn conversation_hint_defers_to_weaker_signals() {
        let db = routing(json!({"selected_agents": ["conversation", "database_query"]}));
        let result = classify(Some("conversation"), "", Some(&db), false);
        assert_eq!(result.agent, AgentId::DatabaseQuery);
        assert_eq!(result.source, SignalSource::Routing);
    }

    #[test]
    fn vietnamese_finance_keywords_select_database_agent() {
        let result = classify(None, "Dựa trên dữ liệu bảng cổ phiếu...", None, false);
        assert_eq!(result.agent, AgentId::DatabaseQuery);
        assert_eq!(result.source, SignalSource::Keywords);
    }

    #[test]
    fn keyword_matching_ignores_case() {
        assert_eq!(agent_from_answer("Theo TIN TỨC hôm nay", false), AgentId::GoogleSearch);
        assert_eq!(agent_from_answer("SQL returned 3 rows", false), AgentId::DatabaseQuery);
        assert_eq!(agent_from_answer("anything", true), AgentId::Visualize);
    }

    #[test]
    fn scored_agents_are_used_when_selection_is_empty() {
        let scored = routing(json!({
            "selected_agents": [],
            "agents": [
                {"name": "visualize", "selected": true},
                {"name": "google_search", "selected": true},
                {"name": "database_query", "selected": false}
            ]
        }));
        assert_eq!(classify(None, "", Some(&scored), false).agent, AgentId::GoogleSearch);
    }

    #[test]
    fn first_listed_agent_is_the_last_routing_choice() {
        let custom = routing(json!({"selected_agents": ["visualize", "Portfolio", "risk"]}));
        assert_eq!(
            classify(None, "", Some(&custom), false).agent,
            AgentId::Other("portfolio".to_string())
        );
    }

    #[test]
    fn routing_conversation_still_allows_keyword_fallback() {
        let chat = routing(json!({"selected_agents": ["conversation"]}));
        let result = classify(None, "Tôi đã tìm kiếm trên web", Some(&chat), false);
        assert_eq!(result.agent, AgentId::GoogleSearch);
        assert_eq!(result.source, SignalSource::Keywords);
    }
}
