//! TUI-less "ask" command

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::api::client::ServiceEndpoint;
use crate::api::{HttpQueryClient, QueryTransport};
use crate::core::config::Config;
use crate::core::message::Message;
use crate::core::orchestrator::{ConversationOrchestrator, Timings};
use crate::core::response::ChartRef;
use crate::core::runtime::{drive_turn, GracePolicy};
use crate::utils::logging::{format_message_plain, LoggingState, PlainTextContext};

pub async fn run_ask(
    question: Vec<String>,
    config: &Config,
    endpoint: ServiceEndpoint,
    save_chart: Option<std::path::PathBuf>,
    log_file: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let question = question.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: financi ask <question>");
        std::process::exit(1);
    }

    let context = PlainTextContext {
        base_url: endpoint.base_url.clone(),
        citation_prefixes: config.citation_prefixes(),
    };
    let logging = LoggingState::new(log_file)?;
    let client = HttpQueryClient::new(endpoint, config.request_timeout())?;
    let reply = ask_once(&client, config.timings(), &question, &logging, &context).await?;

    if reply.is_error() {
        eprintln!("❌ {}", reply.content);
        std::process::exit(1);
    }
    println!("{}", format_message_plain(&reply, &context));

    if let Some(path) = save_chart {
        match reply.chart.as_ref() {
            Some(chart) => match save_inline_chart(chart, &path)? {
                Some(bytes) => eprintln!("💾 Chart saved to {} ({bytes} bytes)", path.display()),
                None => eprintln!("⚠️  Chart is served by the service; see the URL above."),
            },
            None => eprintln!("⚠️  The answer has no chart to save."),
        }
    }

    Ok(())
}

/// Run one question to completion and return the entry shown for it. The
/// question and its reply go to the transcript log when one is active.
pub async fn ask_once(
    transport: &dyn QueryTransport,
    timings: Timings,
    question: &str,
    logging: &LoggingState,
    context: &PlainTextContext,
) -> Result<Message, Box<dyn Error>> {
    let mut orchestrator = ConversationOrchestrator::new(timings);
    let report = drive_turn(&mut orchestrator, transport, question, GracePolicy::Skip).await?;
    for message in &report.messages {
        logging.log_message(message, context)?;
    }
    report
        .reply()
        .cloned()
        .ok_or_else(|| "the service produced no reply".into())
}

/// Decode an inline chart into `path`. Path charts are left alone and yield
/// `None`.
pub fn save_inline_chart(chart: &ChartRef, path: &Path) -> Result<Option<usize>, Box<dyn Error>> {
    let Some(decoded) = chart.decode_inline() else {
        return Ok(None);
    };
    let bytes = decoded.map_err(|err| format!("chart is not valid base64: {err}"))?;
    fs::write(path, &bytes)?;
    Ok(Some(bytes.len()))
}
