use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::message::{current_timestamp, Message, TranscriptRole};
use crate::core::presentation::persona_for;
use crate::core::response::ChartRef;
use crate::utils::url::construct_api_url;

/// What plain-text rendering needs beyond the message itself.
#[derive(Debug, Clone, Default)]
pub struct PlainTextContext {
    /// Service root that chart paths are resolved against.
    pub base_url: String,
    pub citation_prefixes: Vec<String>,
}

/// Chart line as shown to the user: a resolved URL for path charts, a size
/// note for inline ones.
pub fn describe_chart(chart: &ChartRef, base_url: &str) -> String {
    match chart {
        ChartRef::Path(path) => construct_api_url(base_url, path),
        ChartRef::Inline(_) => {
            let bytes = chart.approx_inline_bytes().unwrap_or_default();
            format!("inline PNG, ~{} KB", bytes.div_ceil(1024))
        }
    }
}

/// One transcript entry as plain text, without a trailing blank line.
pub fn format_message_plain(message: &Message, context: &PlainTextContext) -> String {
    let mut out = String::new();
    match message.role {
        TranscriptRole::User => out.push_str(&format!("You: {}", message.content)),
        TranscriptRole::Assistant => {
            let persona = persona_for(&message.agent.clone().unwrap_or_default());
            out.push_str(&format!("[{}]\n{}", persona.label, message.content));
            if let Some(chart) = &message.chart {
                out.push_str(&format!("\nChart: {}", describe_chart(chart, &context.base_url)));
            }
            if !message.citations.is_empty() {
                out.push_str("\nSources:");
                for citation in &message.citations {
                    out.push_str(&format!(
                        "\n- {} <{}>",
                        citation.display_text(&context.citation_prefixes),
                        citation.url
                    ));
                }
            }
        }
        TranscriptRole::AppInfo | TranscriptRole::AppError => {
            out.push_str(&format!("## {}", message.content))
        }
    }
    out
}

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    /// A path given up front starts logging immediately.
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut logging = LoggingState {
            file_path: None,
            is_active: false,
        };
        if let Some(path) = log_file {
            logging.set_log_file(path)?;
        }
        Ok(logging)
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match self.file_path.clone() {
            Some(path) => {
                if self.is_active {
                    self.log_text(&format!("## Logging paused at {}", current_timestamp()))?;
                    self.is_active = false;
                    Ok(format!("Logging paused (file: {path})"))
                } else {
                    self.is_active = true;
                    Ok(format!("Logging resumed to: {path}"))
                }
            }
            None => {
                Err("No log file specified. Use /log <filename> to enable logging first.".into())
            }
        }
    }

    pub fn log_message(
        &self,
        message: &Message,
        context: &PlainTextContext,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let entry = format!("[{}] {}", message.timestamp, format_message_plain(message, context));
        self.log_text(&entry)
    }

    fn log_text(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        match (&self.file_path, self.is_active) {
            (Some(path), true) => append_entry(path, content),
            _ => Ok(()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_status_string(&self) -> String {
        let file_name = |path: &str| {
            Path::new(path)
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string()
        };
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!("active ({})", file_name(path)),
            (Some(path), false) => format!("paused ({})", file_name(path)),
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

fn append_entry(path: &str, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for line in content.lines() {
        writeln!(writer, "{line}")?;
    }
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write the whole transcript to `path`, replacing it atomically.
pub fn dump_transcript(
    messages: &[Message],
    context: &PlainTextContext,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = NamedTempFile::new_in(parent)?;

    for message in messages {
        writeln!(
            temp_file,
            "[{}] {}",
            message.timestamp,
            format_message_plain(message, context)
        )?;
        writeln!(temp_file)?;
    }

    temp_file.flush()?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::agent::AgentId;
    use crate::core::response::{Citation, ParsedResponse};
    use std::fs;
    use tempfile::tempdir;

    fn context() -> PlainTextContext {
        PlainTextContext {
            base_url: "http://localhost:8080".to_string(),
            citation_prefixes: vec!["https://tamanhhospital.vn/".to_string()],
        }
    }

    fn assistant() -> Message {
        Message::assistant(
            ParsedResponse {
                answer: "AAPL closed at 190 USD.".to_string(),
                citations: vec![Citation::new("https://tamanhhospital.vn/gia-co-phieu/")],
                chart: Some(ChartRef::Path(
                    "/visualizations/visualization_1.png".to_string(),
                )),
            },
            AgentId::DatabaseQuery,
        )
        .with_timestamp("10:00:00")
    }

    #[test]
    fn assistant_entries_include_agent_chart_and_sources() {
        let text = format_message_plain(&assistant(), &context());
        assert_eq!(
            text,
            "[Database Agent]\nAAPL closed at 190 USD.\n\
             Chart: http://localhost:8080/visualizations/visualization_1.png\n\
             Sources:\n- Gia Co Phieu <https://tamanhhospital.vn/gia-co-phieu/>"
        );
    }

    #[test]
    fn inline_charts_are_described_by_size() {
        let chart = ChartRef::Inline("A".repeat(4096));
        assert_eq!(describe_chart(&chart, "http://x"), "inline PNG, ~3 KB");
    }

    #[test]
    fn logging_appends_only_while_active() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let path_str = path.to_string_lossy().to_string();

        let mut logging = LoggingState::new(Some(path_str.clone())).unwrap();
        assert!(logging.is_active());
        logging
            .log_message(&Message::user("Giá AAPL?").with_timestamp("09:59:59"), &context())
            .unwrap();
        logging.toggle_logging().unwrap();
        logging.log_message(&assistant(), &context()).unwrap();
        assert!(logging.get_status_string().starts_with("paused"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[09:59:59] You: Giá AAPL?\n\n"));
        assert!(contents.contains("## Logging paused at"));
        assert!(!contents.contains("Database Agent"));
    }

    #[test]
    fn toggle_without_file_is_an_error() {
        let mut logging = LoggingState::new(None).unwrap();
        assert!(logging.toggle_logging().is_err());
        assert_eq!(logging.get_status_string(), "disabled");
    }

    #[test]
    fn dump_writes_every_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dump.txt");
        let messages = vec![
            Message::user("hello").with_timestamp("10:00:00"),
            assistant(),
            Message::app_error("Error: boom").with_timestamp("10:00:01"),
        ];

        dump_transcript(&messages, &context(), &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("[10:00:00] You: hello\n\n[10:00:00] [Database Agent]\n"));
        assert!(contents.ends_with("[10:00:01] ## Error: boom\n\n"));
    }
}
