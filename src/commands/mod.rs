mod handlers;
mod registry;

pub use handlers::dump_conversation;
pub use registry::{all_commands, matching_commands, CommandInvocation, ToggleAction};

use crate::core::app::App;

pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
}

/// Usage hint for a partially typed `/name`, shown while the input holds
/// nothing but the command word. `None` once arguments start or nothing
/// matches.
pub fn command_hint(input: &str) -> Option<String> {
    let name = input.strip_prefix('/')?;
    if name.chars().any(char::is_whitespace) {
        return None;
    }
    let syntaxes: Vec<&str> = matching_commands(name)
        .into_iter()
        .flat_map(|command| command.usages.iter().map(|usage| usage.syntax))
        .collect();
    if syntaxes.is_empty() {
        None
    } else {
        Some(syntaxes.join("  ·  "))
    }
}

/// Run `input` as a slash command when it names one. Anything else,
/// including unknown `/words`, goes to the service as a question.
pub fn process_input(app: &mut App, input: &str) -> CommandResult {
    let trimmed = input.trim();

    let Some(rest) = trimmed.strip_prefix('/') else {
        return CommandResult::ProcessAsMessage(input.to_string());
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        (command.handler)(app, CommandInvocation { args })
    } else {
        CommandResult::ProcessAsMessage(input.to_string())
    }
}
