use std::path::Path;

use chrono::Local;

use super::registry::{all_commands, CommandInvocation};
use super::CommandResult;
use crate::core::app::App;
use crate::core::presentation::known_personas;
use crate::utils::logging::dump_transcript;

const USAGE_LOG: &str = "Usage: /log [filename]";
const USAGE_DUMP: &str = "Usage: /dump [filename]";
const USAGE_MARKDOWN: &str = "Usage: /markdown [on|off|toggle]";

const KEYS_HELP: &str = "## Keys\n\
- `Enter` send the question\n\
- `Alt+Enter` or `Ctrl+J` insert a newline\n\
- `Up`/`Down` scroll one line, `PageUp`/`PageDown` one page\n\
- `Ctrl+Home`/`Ctrl+End` jump to the top or bottom of the transcript\n\
- `Ctrl+C` or `Ctrl+D` quit";

fn usage_status(app: &mut App, usage: &'static str) -> CommandResult {
    app.ui.set_status(usage);
    CommandResult::Continue
}

pub(super) fn handle_help(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut help_md = KEYS_HELP.to_string();
    help_md.push_str("\n\n## Commands\n");
    for command in all_commands() {
        for usage in command.usages {
            help_md.push_str(&format!("- `{}` {}\n", usage.syntax, usage.description));
        }
    }
    app.conversation.add_app_note(help_md.trim_end());
    CommandResult::Continue
}

pub(super) fn handle_agents(app: &mut App, _invocation: CommandInvocation<'_>) -> CommandResult {
    let mut listing = String::from("## Agents\n");
    for (agent, persona) in known_personas() {
        listing.push_str(&format!(
            "- {} **{}** (`{}`) {}\n",
            persona.glyph(),
            persona.label,
            agent,
            persona.description
        ));
    }
    app.conversation.add_app_note(listing.trim_end());
    CommandResult::Continue
}

pub(super) fn handle_log(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let result = match invocation.args_len() {
        0 => app.session.logging.toggle_logging(),
        1 => match invocation.arg(0) {
            Some(filename) => app.session.logging.set_log_file(filename.to_string()),
            None => return usage_status(app, USAGE_LOG),
        },
        _ => return usage_status(app, USAGE_LOG),
    };

    match result {
        Ok(message) => app.ui.set_status(message),
        Err(e) => app.ui.set_status(format!("Log error: {e}")),
    }
    CommandResult::Continue
}

pub(super) fn handle_dump(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let filename = match invocation.args_len() {
        0 => format!("financi-log-{}.txt", Local::now().format("%Y-%m-%d")),
        1 => match invocation.arg(0) {
            Some(filename) => filename.to_string(),
            None => return usage_status(app, USAGE_DUMP),
        },
        _ => return usage_status(app, USAGE_DUMP),
    };

    match dump_conversation(app, &filename) {
        Ok(()) => app.ui.set_status(format!("Conversation dumped to: {filename}")),
        Err(e) => app.ui.set_status(format!("Dump error: {e}")),
    }
    CommandResult::Continue
}

/// Write the transcript to `filename`, refusing to replace an existing file.
pub fn dump_conversation(app: &App, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let messages = app.conversation.messages();
    if !messages.iter().any(|message| !message.role.is_app()) {
        return Err("No conversation to dump - the chat history is empty.".into());
    }

    let path = Path::new(filename);
    if path.exists() {
        return Err(format!(
            "File '{filename}' already exists. \
             Please specify a different filename with /dump <filename>."
        )
        .into());
    }

    dump_transcript(messages, &app.session.plain_text_context(), path)
}

pub(super) fn handle_markdown(app: &mut App, invocation: CommandInvocation<'_>) -> CommandResult {
    let Some(action) = invocation.toggle_action() else {
        return usage_status(app, USAGE_MARKDOWN);
    };

    let enabled = action.apply(app.ui.markdown_enabled);
    app.ui.markdown_enabled = enabled;
    let state_word = if enabled { "enabled" } else { "disabled" };

    let status = match &app.session.config_store {
        Some(store) => match store.mutate(|config| {
            config.markdown = Some(enabled);
            Ok(())
        }) {
            Ok(()) => format!("Markdown {state_word}"),
            Err(e) => format!("Markdown {state_word} (unsaved: {e})"),
        },
        None => format!("Markdown {state_word} (not saved)"),
    };
    app.ui.set_status(status);
    CommandResult::Continue
}
