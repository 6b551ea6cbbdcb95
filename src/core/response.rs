//! Turns a decoded service reply into the pieces the transcript displays.
//!
//! Parsing is total: absent or oddly typed fields produce empty results and
//! the parser never fails, so a partial reply still renders.

use std::collections::HashSet;
use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::QueryResponse;
use crate::utils::url::{has_http_scheme, strip_scheme};

static CHART_PATH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\.?/)?(visualizations/visualization_[0-9_]+\.(?:png|jpe?g|svg))")
        .unwrap_or_else(|err| panic!("chart path pattern must compile: {err}"))
});

/// A reference link attached to an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
}

impl Citation {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Human-friendly label. The first matching prefix (or else the scheme)
    /// is dropped, dashes become spaces and each word is capitalised. The
    /// link target stays [`Citation::url`].
    pub fn display_text(&self, strip_prefixes: &[String]) -> String {
        let url = self.url.trim();
        let stripped = strip_prefixes
            .iter()
            .filter(|prefix| !prefix.is_empty())
            .find_map(|prefix| url.strip_prefix(prefix.as_str()))
            .unwrap_or_else(|| strip_scheme(url));
        let stripped = stripped.trim_end_matches('/');

        let text = stripped
            .replace('-', " ")
            .split(' ')
            .map(capitalize_first)
            .collect::<Vec<_>>()
            .join(" ");

        if text.trim().is_empty() {
            url.to_string()
        } else {
            text
        }
    }
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The single chart attached to an answer, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ChartRef {
    /// Base64 image bytes embedded in the reply.
    Inline(String),
    /// Absolute-from-service-root path, e.g. `/visualizations/visualization_1.png`.
    Path(String),
}

impl ChartRef {
    pub fn inline_data(&self) -> Option<&str> {
        match self {
            ChartRef::Inline(data) => Some(data),
            ChartRef::Path(_) => None,
        }
    }

    pub fn service_path(&self) -> Option<&str> {
        match self {
            ChartRef::Path(path) => Some(path),
            ChartRef::Inline(_) => None,
        }
    }

    /// Decode an inline payload, tolerating a `data:` URL header and
    /// embedded whitespace. Path charts have nothing to decode.
    pub fn decode_inline(&self) -> Option<Result<Vec<u8>, base64::DecodeError>> {
        let data = self.inline_data()?;
        let payload = match data.find("base64,") {
            Some(idx) if data.starts_with("data:") => &data[idx + "base64,".len()..],
            _ => data,
        };
        let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        Some(STANDARD.decode(compact))
    }

    /// Rough decoded size without decoding.
    pub fn approx_inline_bytes(&self) -> Option<usize> {
        self.inline_data().map(|data| data.trim().len() / 4 * 3)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub chart: Option<ChartRef>,
}

impl ParsedResponse {
    pub fn has_chart(&self) -> bool {
        self.chart.is_some()
    }

    pub fn chart_data(&self) -> Option<&str> {
        self.chart.as_ref().and_then(ChartRef::inline_data)
    }

    pub fn chart_path(&self) -> Option<&str> {
        self.chart.as_ref().and_then(ChartRef::service_path)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, raw: &QueryResponse) -> ParsedResponse {
        let routing_references = raw
            .routing
            .as_ref()
            .map(|routing| routing.references.as_slice())
            .unwrap_or_default();

        ParsedResponse {
            answer: raw.answer.clone(),
            citations: extract_citations(raw.references.iter().chain(routing_references)),
            chart: extract_chart(raw.visualization_base64.as_deref(), &raw.answer),
        }
    }
}

/// Keep string entries starting with `http`, first occurrence wins.
pub fn extract_citations<'a>(entries: impl IntoIterator<Item = &'a Value>) -> Vec<Citation> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|url| !url.is_empty() && has_http_scheme(url))
        .filter(|url| seen.insert(url.to_string()))
        .map(Citation::new)
        .collect()
}

/// Inline payload first; otherwise the first chart path mentioned in the
/// answer, rewritten from `./visualizations/...` to `/visualizations/...`.
pub fn extract_chart(inline: Option<&str>, answer: &str) -> Option<ChartRef> {
    if let Some(data) = inline.map(str::trim).filter(|data| !data.is_empty()) {
        return Some(ChartRef::Inline(data.to_string()));
    }

    CHART_PATH_PATTERN
        .captures(answer)
        .and_then(|captures| captures.get(1))
        .map(|relative| ChartRef::Path(format!("/{}", relative.as_str())))
}
