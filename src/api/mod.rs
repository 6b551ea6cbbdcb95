//! Wire payloads exchanged with the answering service.
//!
//! The service is loosely typed, so decoding happens in two steps: the body
//! is read as a [`serde_json::Value`] and then narrowed into explicit types.
//! Only a missing or non-string `answer` is treated as malformed; every
//! other field degrades to `None`/empty when absent or of the wrong shape.

pub mod client;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::{HttpQueryClient, QueryError, QueryTransport};

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub question: String,
}

/// A decoded `/api/query` reply.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub answer: String,
    pub routing: Option<RoutingInfo>,
    pub current_agent: Option<AgentHint>,
    pub visualization_base64: Option<String>,
    /// Raw reference entries; filtering happens in the response parser.
    pub references: Vec<Value>,
}

#[derive(Deserialize)]
struct QueryResponseWire {
    #[serde(default)]
    answer: Option<Value>,
    #[serde(default)]
    routing_info: Option<Value>,
    #[serde(default)]
    visualization_base64: Option<Value>,
    #[serde(default)]
    current_agent: Option<Value>,
    #[serde(default, alias = "citations")]
    references: Option<Value>,
}

impl QueryResponse {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }

    pub fn from_json(body: &str) -> Result<Self, QueryError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|err| QueryError::Malformed(format!("response is not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, QueryError> {
        if !value.is_object() {
            return Err(QueryError::Malformed(
                "response body is not a JSON object".to_string(),
            ));
        }

        let wire: QueryResponseWire = serde_json::from_value(value)
            .map_err(|err| QueryError::Malformed(format!("unexpected response shape: {err}")))?;

        let answer = match wire.answer {
            Some(Value::String(answer)) => answer,
            Some(other) => {
                return Err(QueryError::Malformed(format!(
                    "`answer` must be a string, got {}",
                    json_kind(&other)
                )))
            }
            None => {
                return Err(QueryError::Malformed(
                    "response is missing `answer`".to_string(),
                ))
            }
        };

        let visualization_base64 = match wire.visualization_base64 {
            Some(Value::String(data)) if !data.trim().is_empty() => Some(data),
            _ => None,
        };

        let references = match wire.references {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        Ok(Self {
            answer,
            routing: wire.routing_info.as_ref().and_then(RoutingInfo::from_value),
            current_agent: wire.current_agent.as_ref().and_then(AgentHint::from_value),
            visualization_base64,
            references,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Agent name the service reports for itself via `current_agent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentHint(String);

impl AgentHint {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Scalars are stringified; null, arrays and objects carry no hint.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Self(text.clone())),
            Value::Number(number) => Some(Self(number.to_string())),
            Value::Bool(flag) => Some(Self(flag.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Router metadata attached to an answer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingInfo {
    pub selected_agents: Vec<String>,
    pub agents: Vec<AgentScore>,
    pub references: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentScore {
    pub name: String,
    pub selected: bool,
}

/// Which part of the routing metadata names the chosen agents.
#[derive(Debug, Clone, PartialEq)]
pub enum RoutingSelection<'a> {
    Selected(Vec<&'a str>),
    Scored(Vec<&'a str>),
    Empty,
}

impl RoutingInfo {
    /// Lenient decode: anything that is not an object yields `None`, and
    /// entries of the wrong type are skipped instead of failing the whole
    /// value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let selected_agents = object
            .get("selected_agents")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let agents = object
            .get("agents")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(AgentScore::from_value).collect())
            .unwrap_or_default();

        let references = object
            .get("references")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Some(Self {
            selected_agents,
            agents,
            references,
        })
    }

    /// `selected_agents` wins when non-empty; otherwise the `selected=true`
    /// subset of the scored agents is used.
    pub fn selection(&self) -> RoutingSelection<'_> {
        let selected: Vec<&str> = self
            .selected_agents
            .iter()
            .map(String::as_str)
            .filter(|name| !name.trim().is_empty())
            .collect();
        if !selected.is_empty() {
            return RoutingSelection::Selected(selected);
        }

        let scored: Vec<&str> = self
            .agents
            .iter()
            .filter(|agent| agent.selected)
            .map(|agent| agent.name.as_str())
            .filter(|name| !name.trim().is_empty())
            .collect();
        if !scored.is_empty() {
            return RoutingSelection::Scored(scored);
        }

        RoutingSelection::Empty
    }
}

impl AgentScore {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let name = object.get("name")?.as_str()?.to_string();
        Some(Self {
            name,
            selected: object
                .get("selected")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }
}

impl RoutingSelection<'_> {
    pub fn names(&self) -> &[&str] {
        match self {
            RoutingSelection::Selected(names) | RoutingSelection::Scored(names) => names,
            RoutingSelection::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_service_reply() {
        let body = json!({
            "answer": "Apple closed at 190 USD.",
            "routing_info": {
                "question": "AAPL?",
                "agents": [
                    {"name": "database_query", "confidence": 0.8, "selected": true},
                    {"name": "visualize", "confidence": 0.1, "selected": false}
                ],
                "selected_agents": ["database_query"]
            },
            "visualization_base64": null,
            "current_agent": "database_query"
        });

        let response = QueryResponse::from_value(body).expect("valid response");
        assert_eq!(response.answer, "Apple closed at 190 USD.");
        assert_eq!(
            response.current_agent.as_ref().map(AgentHint::as_str),
            Some("database_query")
        );
        assert!(response.visualization_base64.is_none());
        let routing = response.routing.expect("routing info");
        assert_eq!(routing.selected_agents, vec!["database_query".to_string()]);
        assert_eq!(routing.agents.len(), 2);
        assert!(routing.agents[0].selected);
    }

    #[test]
    fn missing_answer_is_malformed() {
        let err = QueryResponse::from_value(json!({"routing_info": {}})).unwrap_err();
        assert!(matches!(err, QueryError::Malformed(_)));
        assert!(err.to_string().contains("answer"));
    }

    #[test]
    fn non_string_answer_is_malformed() {
        let err = QueryResponse::from_value(json!({"answer": 42})).unwrap_err();
        assert!(err.to_string().contains("a number"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = QueryResponse::from_json("<html>oops</html>").unwrap_err();
        assert!(matches!(err, QueryError::Malformed(_)));
    }

    #[test]
    fn malformed_optional_fields_degrade_to_none() {
        let response = QueryResponse::from_value(json!({
            "answer": "hi",
            "routing_info": "not-an-object",
            "current_agent": {"nested": true},
            "visualization_base64": 17,
            "references": "http://single"
        }))
        .expect("answer is present");

        assert!(response.routing.is_none());
        assert!(response.current_agent.is_none());
        assert!(response.visualization_base64.is_none());
        assert!(response.references.is_empty());
    }

    #[test]
    fn scalar_hints_are_stringified() {
        assert_eq!(
            AgentHint::from_value(&json!(7)).map(|h| h.as_str().to_string()),
            Some("7".to_string())
        );
        assert!(AgentHint::from_value(&Value::Null).is_none());
    }

    #[test]
    fn selection_prefers_selected_agents_then_scored_subset() {
        let routing = RoutingInfo::from_value(&json!({
            "selected_agents": [],
            "agents": [
                {"name": "google_search", "selected": true},
                {"name": "conversation", "selected": false},
                {"selected": true},
                "garbage"
            ]
        }))
        .expect("object");
        assert_eq!(routing.selection(), RoutingSelection::Scored(vec!["google_search"]));

        let routing = RoutingInfo::from_value(&json!({
            "selected_agents": ["visualize", 3, "database_query"],
            "agents": [{"name": "google_search", "selected": true}]
        }))
        .expect("object");
        assert_eq!(
            routing.selection(),
            RoutingSelection::Selected(vec!["visualize", "database_query"])
        );

        let routing = RoutingInfo::from_value(&json!({})).expect("object");
        assert_eq!(routing.selection(), RoutingSelection::Empty);
    }
}
