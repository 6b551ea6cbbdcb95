use super::CommandResult;
use crate::core::app::App;

pub type CommandHandler = fn(&mut App, CommandInvocation<'_>) -> CommandResult;

pub struct CommandUsage {
    pub syntax: &'static str,
    pub description: &'static str,
}

pub struct Command {
    pub name: &'static str,
    pub usages: &'static [CommandUsage],
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.split_whitespace().nth(index)
    }

    pub fn args_len(&self) -> usize {
        self.args.split_whitespace().count()
    }

    /// Interpret the arguments as `[on|off|toggle]`.
    pub fn toggle_action(&self) -> Option<ToggleAction> {
        match self.args_len() {
            0 => Some(ToggleAction::Toggle),
            1 => match self.arg(0).map(str::to_ascii_lowercase).as_deref() {
                Some("on") => Some(ToggleAction::On),
                Some("off") => Some(ToggleAction::Off),
                Some("toggle") => Some(ToggleAction::Toggle),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    On,
    Off,
    Toggle,
}

impl ToggleAction {
    pub fn apply(self, current: bool) -> bool {
        match self {
            ToggleAction::On => true,
            ToggleAction::Off => false,
            ToggleAction::Toggle => !current,
        }
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, case-insensitively.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usages: &[CommandUsage {
            syntax: "/help",
            description: "Show keys and commands.",
        }],
        handler: super::handlers::handle_help,
    },
    Command {
        name: "agents",
        usages: &[CommandUsage {
            syntax: "/agents",
            description: "List the agents that can answer a question.",
        }],
        handler: super::handlers::handle_agents,
    },
    Command {
        name: "log",
        usages: &[
            CommandUsage {
                syntax: "/log <filename>",
                description: "Start appending the transcript to a file.",
            },
            CommandUsage {
                syntax: "/log",
                description: "Pause or resume transcript logging.",
            },
        ],
        handler: super::handlers::handle_log,
    },
    Command {
        name: "dump",
        usages: &[CommandUsage {
            syntax: "/dump [filename]",
            description: "Write the whole transcript to a new file.",
        }],
        handler: super::handlers::handle_dump,
    },
    Command {
        name: "markdown",
        usages: &[CommandUsage {
            syntax: "/markdown [on|off|toggle]",
            description: "Render answers as markdown or as plain text.",
        }],
        handler: super::handlers::handle_markdown,
    },
];
