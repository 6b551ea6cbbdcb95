use super::{into_app_commands, App, AppAction, AppCommand};
use crate::core::orchestrator::SubmitError;

pub(super) fn handle_conversation_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => submit_message(app, message),
        AppAction::QueryFinished { cycle, outcome } => {
            into_app_commands(outcome.apply(&mut app.conversation, cycle))
        }
        AppAction::GraceElapsed { cycle } => {
            into_app_commands(app.conversation.on_grace_elapsed(cycle))
        }
        _ => Vec::new(),
    }
}

pub(super) fn submit_message(app: &mut App, message: String) -> Vec<AppCommand> {
    match app.conversation.submit(&message) {
        Ok(commands) => {
            app.ui.show_intro = false;
            app.ui.scroll_to_bottom();
            into_app_commands(commands)
        }
        Err(SubmitError::EmptyMessage) => Vec::new(),
        Err(err @ SubmitError::RequestInFlight { .. }) => {
            // Keep what was typed so it can be sent once the answer lands.
            app.ui.set_input_text(message);
            app.ui.set_status(err.to_string());
            Vec::new()
        }
    }
}
