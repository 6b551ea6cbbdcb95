use super::conversation::submit_message;
use super::{App, AppAction, AppActionContext, AppCommand};
use crate::commands::{process_input, CommandResult};

/// Rows taken by the input box, status line and borders.
const CHROME_ROWS: u16 = 6;

pub(super) fn handle_input_action(
    app: &mut App,
    action: AppAction,
    ctx: AppActionContext,
) -> Vec<AppCommand> {
    match action {
        AppAction::ProcessCommand { input } => return process_command(app, input),
        AppAction::ScrollUp { lines } => app.ui.scroll_up(lines),
        AppAction::ScrollDown { lines } => app.ui.scroll_down(lines),
        AppAction::PageUp => app.ui.scroll_up(page_size(ctx)),
        AppAction::PageDown => app.ui.scroll_down(page_size(ctx)),
        AppAction::ScrollToTop => app.ui.scroll_to_top(),
        AppAction::ScrollToBottom => app.ui.scroll_to_bottom(),
        AppAction::SetStatus { message } => app.ui.set_status(message),
        AppAction::ClearStatus => app.ui.clear_status(),
        AppAction::Quit => app.ui.exit_requested = true,
        _ => {}
    }
    Vec::new()
}

fn process_command(app: &mut App, input: String) -> Vec<AppCommand> {
    if input.trim().is_empty() {
        return Vec::new();
    }

    match process_input(app, &input) {
        CommandResult::Continue => {
            app.ui.scroll_to_bottom();
            Vec::new()
        }
        CommandResult::ProcessAsMessage(message) => submit_message(app, message),
    }
}

fn page_size(ctx: AppActionContext) -> u16 {
    ctx.term_height.saturating_sub(CHROME_ROWS).max(1)
}
