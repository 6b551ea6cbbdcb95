use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{HealthResponse, QueryRequest, QueryResponse};
use crate::utils::url::construct_api_url;

/// Failures that end a request cycle with a visible error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Network failure or non-2xx status.
    Transport(String),
    /// Body was not JSON or lacked a string `answer`.
    Malformed(String),
}

impl QueryError {
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Transport(_) => "transport",
            QueryError::Malformed(_) => "malformed_response",
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Transport(message) => f.write_str(message),
            QueryError::Malformed(message) => write!(f, "Malformed response: {message}"),
        }
    }
}

impl StdError for QueryError {}

/// Anything that can answer a question. The HTTP client is the production
/// implementation; tests script their own.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn query(&self, question: &str) -> Result<QueryResponse, QueryError>;
}

/// Where the service lives. Paths are relative to `base_url`, which is also
/// the root that chart paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub query_path: String,
    pub health_path: String,
}

impl ServiceEndpoint {
    pub fn query_url(&self) -> String {
        construct_api_url(&self.base_url, &self.query_path)
    }

    pub fn health_url(&self) -> String {
        construct_api_url(&self.base_url, &self.health_path)
    }
}

#[derive(Clone)]
pub struct HttpQueryClient {
    client: reqwest::Client,
    endpoint: ServiceEndpoint,
}

impl HttpQueryClient {
    pub fn new(endpoint: ServiceEndpoint, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("financi/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    pub async fn health(&self) -> Result<HealthResponse, QueryError> {
        let url = self.endpoint.health_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| QueryError::Transport(format_api_error(&err.to_string())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        if !status.is_success() {
            return Err(QueryError::Transport(format!(
                "Server error: {status}\n{}",
                format_api_error(&body)
            )));
        }

        serde_json::from_str::<HealthResponse>(&body)
            .map_err(|err| QueryError::Malformed(format!("health body is not valid JSON: {err}")))
    }
}

#[async_trait]
impl QueryTransport for HttpQueryClient {
    async fn query(&self, question: &str) -> Result<QueryResponse, QueryError> {
        let url = self.endpoint.query_url();
        debug!(%url, chars = question.chars().count(), "Sending question");

        let request = QueryRequest {
            question: question.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| QueryError::Transport(format_api_error(&err.to_string())))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(QueryError::Transport(format!(
                "Server error: {status}\n{}",
                format_api_error(&error_text)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| QueryError::Transport(format_api_error(&err.to_string())))?;
        debug!(%status, bytes = body.len(), "Received answer");

        QueryResponse::from_json(&body)
    }
}

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .get("detail")
        .and_then(|detail| match detail {
            Value::String(text) => Some(text.clone()),
            Value::Array(items) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        })
        .or_else(|| {
            value
                .pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .or_else(|| value.get("error").and_then(Value::as_str).map(str::to_owned))
        .or_else(|| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Summarise an error body for display, keeping the raw text in a fence.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            if let Some(summary) = extract_error_summary(&json_value) {
                if !summary.is_empty() {
                    return format!("API Error: {}\n```json\n{}\n```", summary, pretty_json);
                }
            }
            return format!("API Error:\n```json\n{}\n```", pretty_json);
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```html\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one canned HTTP response and returns the request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (ServiceEndpoint, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.expect("read");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let lower = line.to_ascii_lowercase();
                            lower
                                .strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write");
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).to_string()
        });

        let endpoint = ServiceEndpoint {
            base_url: format!("http://{addr}/"),
            query_path: "/api/query".to_string(),
            health_path: "api/health".to_string(),
        };
        (endpoint, handle)
    }

    fn client_for(endpoint: ServiceEndpoint) -> HttpQueryClient {
        HttpQueryClient::new(endpoint, Duration::from_secs(5)).expect("client")
    }

    #[tokio::test]
    async fn query_posts_question_and_decodes_answer() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 200 OK",
            concat!(
                r#"{"answer":"Hello","current_agent":"conversation","#,
                r#""routing_info":{"selected_agents":["conversation"]}}"#,
            ),
        )
        .await;

        let response = client_for(endpoint)
            .query("Xin chào")
            .await
            .expect("successful query");
        assert_eq!(response.answer, "Hello");

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /api/query HTTP/1.1"));
        assert!(request.contains(r#"{"question":"Xin chào"}"#));
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let (endpoint, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error",
            r#"{"detail":"Lỗi xử lý: boom"}"#,
        )
        .await;

        let err = client_for(endpoint).query("q").await.unwrap_err();
        let _ = server.await;
        match err {
            QueryError::Transport(text) => {
                assert!(text.starts_with("Server error: 500 Internal Server Error"));
                assert!(text.contains("API Error: Lỗi xử lý: boom"));
            }
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_answer_is_malformed() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", r#"{"routing_info":{}}"#).await;
        let err = client_for(endpoint).query("q").await.unwrap_err();
        let _ = server.await;
        assert!(matches!(err, QueryError::Malformed(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let endpoint = ServiceEndpoint {
            base_url: format!("http://{addr}"),
            query_path: "api/query".to_string(),
            health_path: "api/health".to_string(),
        };
        let err = client_for(endpoint).query("q").await.unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[tokio::test]
    async fn health_reports_status() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", r#"{"status":"healthy"}"#).await;
        let health = client_for(endpoint).health().await.expect("healthy");
        let request = server.await.expect("server task");
        assert_eq!(health.status.as_deref(), Some("healthy"));
        assert!(request.starts_with("GET /api/health HTTP/1.1"));
    }

    #[test]
    fn format_api_error_summarises_fastapi_detail() {
        let formatted = format_api_error(r#"{"detail":[{"msg":"field required"},{"msg":"bad"}]}"#);
        assert!(formatted.starts_with("API Error: field required; bad\n```json\n"));
    }

    #[test]
    fn format_api_error_handles_markup_and_plaintext() {
        assert_eq!(
            format_api_error("<h1>502</h1>"),
            "API Error:\n```html\n<h1>502</h1>\n```"
        );
        assert_eq!(
            format_api_error("  connection reset "),
            "API Error:\n```\nconnection reset\n```"
        );
        assert_eq!(format_api_error(""), "API Error:\n```\n<empty>\n```");
    }
}
