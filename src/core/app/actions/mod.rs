mod conversation;
mod input;

use std::time::Duration;

use tokio::sync::mpsc;

use super::App;
use crate::core::orchestrator::{CycleId, OrchestratorCommand};
use crate::core::runtime::QueryOutcome;

pub enum AppAction {
    SubmitMessage { message: String },
    ProcessCommand { input: String },
    QueryFinished { cycle: CycleId, outcome: QueryOutcome },
    GraceElapsed { cycle: CycleId },
    ScrollUp { lines: u16 },
    ScrollDown { lines: u16 },
    PageUp,
    PageDown,
    ScrollToTop,
    ScrollToBottom,
    SetStatus { message: String },
    ClearStatus,
    Quit,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AppActionContext {
    pub term_width: u16,
    pub term_height: u16,
}

pub struct AppActionEnvelope {
    pub action: AppAction,
    pub context: AppActionContext,
}

#[derive(Clone)]
pub struct AppActionDispatcher {
    tx: mpsc::UnboundedSender<AppActionEnvelope>,
}

impl AppActionDispatcher {
    pub fn new(tx: mpsc::UnboundedSender<AppActionEnvelope>) -> Self {
        Self { tx }
    }

    pub fn dispatch(&self, action: AppAction, ctx: AppActionContext) {
        self.dispatch_many([action], ctx);
    }

    pub fn dispatch_many<I>(&self, actions: I, ctx: AppActionContext)
    where
        I: IntoIterator<Item = AppAction>,
    {
        for action in actions.into_iter() {
            let _ = self.tx.send(AppActionEnvelope {
                action,
                context: ctx,
            });
        }
    }
}

/// Side effects the event loop performs after actions are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    SpawnQuery { cycle: CycleId, question: String },
    ScheduleGrace { cycle: CycleId, delay: Duration },
    CancelGrace { cycle: CycleId },
}

impl From<OrchestratorCommand> for AppCommand {
    fn from(command: OrchestratorCommand) -> Self {
        match command {
            OrchestratorCommand::SendQuery { cycle, question } => {
                AppCommand::SpawnQuery { cycle, question }
            }
            OrchestratorCommand::ScheduleGrace { cycle, delay } => {
                AppCommand::ScheduleGrace { cycle, delay }
            }
            OrchestratorCommand::CancelGrace { cycle } => AppCommand::CancelGrace { cycle },
        }
    }
}

pub fn apply_actions(
    app: &mut App,
    envelopes: impl IntoIterator<Item = AppActionEnvelope>,
) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    for envelope in envelopes {
        commands.extend(apply_action(app, envelope.action, envelope.context));
    }
    app.sync_transcript_log();
    commands
}

pub fn apply_action(app: &mut App, action: AppAction, ctx: AppActionContext) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitMessage { .. }
        | AppAction::QueryFinished { .. }
        | AppAction::GraceElapsed { .. } => conversation::handle_conversation_action(app, action),

        AppAction::ProcessCommand { .. }
        | AppAction::ScrollUp { .. }
        | AppAction::ScrollDown { .. }
        | AppAction::PageUp
        | AppAction::PageDown
        | AppAction::ScrollToTop
        | AppAction::ScrollToBottom
        | AppAction::SetStatus { .. }
        | AppAction::ClearStatus
        | AppAction::Quit => input::handle_input_action(app, action, ctx),
    }
}

fn into_app_commands(commands: Vec<OrchestratorCommand>) -> Vec<AppCommand> {
    commands.into_iter().map(AppCommand::from).collect()
}
