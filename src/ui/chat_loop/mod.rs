//! Main chat event loop.
//!
//! Terminal events, query results and grace timers all arrive on channels
//! and are turned into [`AppAction`]s; applying those yields the
//! [`AppCommand`]s this loop executes against the runtime services.

mod keybindings;
pub mod lifecycle;

pub use self::keybindings::{classify_key, KeyAction};

use std::{
    error::Error,
    io,
    sync::Arc,
    time::{Duration, Instant},
};

use ratatui::crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::prelude::Size;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

use self::lifecycle::{restore_terminal, setup_terminal, SharedTerminal};
use crate::api::QueryTransport;
use crate::core::app::{
    apply_actions, App, AppAction, AppActionContext, AppActionDispatcher, AppActionEnvelope,
    AppCommand,
};
use crate::core::orchestrator::CycleId;
use crate::core::runtime::{GraceElapsed, GraceScheduler, QueryOutcome, QueryService};
use crate::ui::renderer::ui;
use crate::ui::theme::Theme;

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
    RequestRedraw,
}

async fn is_exit_requested(app: &Arc<Mutex<App>>) -> bool {
    let app_guard = app.lock().await;
    app_guard.ui.exit_requested
}

async fn current_terminal_size(terminal: &SharedTerminal) -> Size {
    let terminal_guard = terminal.lock().await;
    terminal_guard.size().unwrap_or_default()
}

async fn try_draw_frame(
    app: &Arc<Mutex<App>>,
    terminal: &SharedTerminal,
    theme: &Theme,
    request_redraw: &mut bool,
    last_draw: &mut Instant,
    frame_duration: Duration,
) -> io::Result<()> {
    if !*request_redraw {
        return Ok(());
    }

    let now = Instant::now();
    if now.duration_since(*last_draw) < frame_duration {
        return Ok(());
    }

    let mut app_guard = app.lock().await;
    let mut terminal_guard = terminal.lock().await;
    terminal_guard.draw(|f| ui(f, &mut app_guard, theme))?;
    *last_draw = now;
    *request_redraw = false;
    Ok(())
}

struct EventProcessingOutcome {
    events_processed: bool,
    request_redraw: bool,
}

async fn process_ui_events(
    app: &Arc<Mutex<App>>,
    event_rx: &mut mpsc::UnboundedReceiver<UiEvent>,
    dispatcher: &AppActionDispatcher,
    term_size: Size,
) -> EventProcessingOutcome {
    let mut outcome = EventProcessingOutcome {
        events_processed: false,
        request_redraw: false,
    };
    let ctx = AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    };

    while let Ok(ev) = event_rx.try_recv() {
        outcome.events_processed = true;
        outcome.request_redraw = true;
        match ev {
            UiEvent::RequestRedraw => {}
            UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                handle_key_event(app, dispatcher, key, ctx).await;
            }
            UiEvent::Crossterm(Event::Paste(text)) => {
                handle_paste_event(app, text).await;
            }
            UiEvent::Crossterm(_) => {}
        }
    }

    outcome
}

async fn handle_key_event(
    app: &Arc<Mutex<App>>,
    dispatcher: &AppActionDispatcher,
    key: KeyEvent,
    ctx: AppActionContext,
) {
    let action = match classify_key(&key) {
        KeyAction::Quit => AppAction::Quit,
        KeyAction::Submit => {
            let input = app.lock().await.ui.take_input();
            if input.trim().is_empty() {
                return;
            }
            AppAction::ProcessCommand { input }
        }
        KeyAction::Newline => {
            app.lock().await.ui.textarea_mut().insert_newline();
            return;
        }
        KeyAction::ScrollUp => AppAction::ScrollUp { lines: 1 },
        KeyAction::ScrollDown => AppAction::ScrollDown { lines: 1 },
        KeyAction::PageUp => AppAction::PageUp,
        KeyAction::PageDown => AppAction::PageDown,
        KeyAction::ScrollToTop => AppAction::ScrollToTop,
        KeyAction::ScrollToBottom => AppAction::ScrollToBottom,
        KeyAction::Edit => {
            app.lock().await.ui.textarea_mut().input(key);
            return;
        }
    };
    dispatcher.dispatch(action, ctx);
}

async fn handle_paste_event(app: &Arc<Mutex<App>>, text: String) {
    let sanitized_text = text
        .replace('\t', "    ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\n' || !c.is_control())
        .collect::<String>();
    app.lock()
        .await
        .ui
        .textarea_mut()
        .insert_str(&sanitized_text);
}

/// Forward finished queries and elapsed timers as actions.
fn process_runtime_updates(
    dispatcher: &AppActionDispatcher,
    query_rx: &mut mpsc::UnboundedReceiver<(QueryOutcome, CycleId)>,
    grace_rx: &mut mpsc::UnboundedReceiver<GraceElapsed>,
    term_size: Size,
) -> bool {
    let mut actions = Vec::new();
    while let Ok((outcome, cycle)) = query_rx.try_recv() {
        actions.push(AppAction::QueryFinished { cycle, outcome });
    }
    while let Ok(GraceElapsed { cycle }) = grace_rx.try_recv() {
        actions.push(AppAction::GraceElapsed { cycle });
    }

    if actions.is_empty() {
        return false;
    }

    let ctx = AppActionContext {
        term_width: term_size.width,
        term_height: term_size.height,
    };
    dispatcher.dispatch_many(actions, ctx);
    true
}

async fn drain_action_queue(
    app: &Arc<Mutex<App>>,
    query_service: &QueryService,
    grace: &mut GraceScheduler,
    action_rx: &mut mpsc::UnboundedReceiver<AppActionEnvelope>,
) -> bool {
    let mut pending = Vec::new();
    while let Ok(envelope) = action_rx.try_recv() {
        pending.push(envelope);
    }

    if pending.is_empty() {
        return false;
    }

    let mut app_guard = app.lock().await;
    let commands = apply_actions(&mut app_guard, pending);
    drop(app_guard);
    for cmd in commands {
        match cmd {
            AppCommand::SpawnQuery { cycle, question } => {
                query_service.spawn_query(cycle, question);
            }
            AppCommand::ScheduleGrace { cycle, delay } => grace.schedule(cycle, delay),
            AppCommand::CancelGrace { cycle } => grace.cancel(cycle),
        }
    }
    true
}

pub async fn run_chat(app: App, transport: Arc<dyn QueryTransport>) -> Result<(), Box<dyn Error>> {
    let app = Arc::new(Mutex::new(app));
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AppActionEnvelope>();
    let dispatcher = AppActionDispatcher::new(action_tx);

    let terminal = setup_terminal()?;
    info!("Interactive session started");

    let (query_service, mut query_rx) = QueryService::new(transport);
    let (mut grace, mut grace_rx) = GraceScheduler::new();

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = {
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            loop {
                if let Ok(true) = event::poll(Duration::from_millis(10)) {
                    match event::read() {
                        Ok(ev) => {
                            if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            debug!(error = %err, "Terminal event read failed");
                            continue;
                        }
                    }
                } else {
                    tokio::task::yield_now().await;
                }
            }
        })
    };
    let _ = event_tx.send(UiEvent::RequestRedraw);

    let theme = Theme::default();
    const MAX_FPS: u64 = 60;
    let frame_duration = Duration::from_millis(1000 / MAX_FPS);
    let mut last_draw = Instant::now() - frame_duration;
    let mut request_redraw = true;

    let result: Result<(), Box<dyn Error>> = 'main_loop: loop {
        if is_exit_requested(&app).await {
            break 'main_loop Ok(());
        }

        if let Err(err) = try_draw_frame(
            &app,
            &terminal,
            &theme,
            &mut request_redraw,
            &mut last_draw,
            frame_duration,
        )
        .await
        {
            break 'main_loop Err(err.into());
        }

        let term_size = current_terminal_size(&terminal).await;

        let event_outcome = process_ui_events(&app, &mut event_rx, &dispatcher, term_size).await;
        if event_outcome.request_redraw {
            request_redraw = true;
        }

        let received_any =
            process_runtime_updates(&dispatcher, &mut query_rx, &mut grace_rx, term_size);

        let actions_applied =
            drain_action_queue(&app, &query_service, &mut grace, &mut action_rx).await;
        if actions_applied || received_any {
            request_redraw = true;
        }

        {
            let mut app_guard = app.lock().await;
            if app_guard.ui.status_expired(Instant::now()) {
                app_guard.ui.clear_status();
                request_redraw = true;
            }
            // Keep the pulse animating while the indicator is up.
            if app_guard.conversation.thinking().is_active {
                request_redraw = true;
            }
        }

        let idle = !event_outcome.events_processed && !received_any && !actions_applied;
        if idle {
            tokio::time::sleep(Duration::from_millis(16)).await;
        }
    };

    event_reader_handle.abort();
    query_service.shutdown();
    grace.cancel_all();
    restore_terminal(&terminal).await?;
    info!("Interactive session ended");

    result
}
