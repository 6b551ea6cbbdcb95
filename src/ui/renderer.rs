use std::time::{Duration, Instant};

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::commands::command_hint;
use crate::core::app::App;
use crate::core::message::{Message, TranscriptRole};
use crate::core::presentation::{persona_for, AgentPersona};
use crate::ui::markdown::{render_markdown, render_plain};
use crate::ui::theme::Theme;
use crate::utils::logging::{describe_chart, PlainTextContext};

pub const PULSE_FRAMES: [&str; 4] = ["○", "◐", "●", "◐"];
pub const PULSE_PERIOD: Duration = Duration::from_millis(250);
const MAX_INPUT_LINES: u16 = 6;
const USER_PREFIX: &str = "You: ";
const USER_INDENT: &str = "     ";

const INTRO: &[&str] = &[
    "Ask about listed companies, market news or price history.",
    "Questions are routed to the database, web search or chart agents automatically.",
    "Type /help for keys and commands.",
];

pub fn ui(f: &mut Frame, app: &mut App, theme: &Theme) {
    let input_height = app.ui.input_line_count().clamp(1, MAX_INPUT_LINES) + 2;
    let thinking_height = u16::from(app.conversation.thinking().is_active);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(thinking_height),
            Constraint::Length(1),
            Constraint::Length(input_height),
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(title_text(app), theme.title_style))),
        chunks[0],
    );

    render_transcript(f, app, theme, chunks[1]);

    if thinking_height > 0 {
        let frame = app
            .ui
            .pulse_frame(Instant::now(), PULSE_FRAMES.len(), PULSE_PERIOD);
        f.render_widget(
            Paragraph::new(thinking_line(app, theme, frame)),
            chunks[2],
        );
    }

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(status_text(app), theme.status_style))),
        chunks[3],
    );

    let mut textarea = app.ui.textarea().clone();
    if let Some(block) = textarea.block().cloned() {
        textarea.set_block(block.border_style(theme.input_border_style));
    }
    f.render_widget(&textarea, chunks[4]);
}

fn render_transcript(f: &mut Frame, app: &mut App, theme: &Theme, area: Rect) {
    let context = app.session.plain_text_context();
    let lines = build_transcript_lines(app, theme, &context);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    let total = u16::try_from(paragraph.line_count(area.width)).unwrap_or(u16::MAX);
    app.ui.update_max_scroll(total.saturating_sub(area.height));

    f.render_widget(paragraph.scroll((app.ui.scroll_offset, 0)), area);
}

fn title_text(app: &App) -> String {
    format!(
        "Financi v{} • {} • Logging: {}",
        env!("CARGO_PKG_VERSION"),
        app.session.endpoint.base_url,
        app.session.logging.get_status_string()
    )
}

fn status_text(app: &App) -> String {
    match &app.ui.status {
        Some(status) => status.clone(),
        None if app.conversation.is_submitting() => "Waiting for the answer…".to_string(),
        None => command_hint(&app.ui.get_input_text()).unwrap_or_default(),
    }
}

/// Indicator row: pulse, agent glyph and what the agent is doing.
pub fn thinking_line(app: &App, theme: &Theme, frame: usize) -> Line<'static> {
    let persona = persona_for(&app.conversation.thinking().displayed_agent);
    let pulse = PULSE_FRAMES[frame % PULSE_FRAMES.len()];
    Line::from(vec![
        Span::styled(format!("{pulse} "), theme.thinking_style),
        Span::styled(persona.badge(), theme.agent_style(persona.icon)),
        Span::styled(
            format!(" · {}…", persona.description),
            theme.thinking_style.add_modifier(Modifier::ITALIC),
        ),
    ])
}

pub fn build_transcript_lines(
    app: &App,
    theme: &Theme,
    context: &PlainTextContext,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if app.ui.show_intro {
        let persona = persona_for(&Default::default());
        lines.push(Line::from(Span::styled(
            format!("{} Financi", persona.glyph()),
            theme.agent_style(persona.icon),
        )));
        for text in INTRO {
            lines.push(Line::from(Span::styled(*text, theme.intro_style)));
        }
        lines.push(Line::default());
    }

    for message in app.conversation.messages() {
        match message.role {
            TranscriptRole::User => push_user_lines(&mut lines, message, theme),
            TranscriptRole::Assistant => {
                push_assistant_lines(&mut lines, message, theme, context, app.ui.markdown_enabled)
            }
            TranscriptRole::AppInfo => {
                lines.extend(render_markdown(&message.content, theme.app_info_style, theme))
            }
            TranscriptRole::AppError => {
                lines.extend(render_markdown(&message.content, theme.app_error_style, theme))
            }
        }
        lines.push(Line::default());
    }

    lines
}

fn push_user_lines(lines: &mut Vec<Line<'static>>, message: &Message, theme: &Theme) {
    for (index, text) in message.content.lines().enumerate() {
        let prefix = if index == 0 { USER_PREFIX } else { USER_INDENT };
        lines.push(Line::from(vec![
            Span::styled(prefix, theme.user_prefix_style),
            Span::styled(text.to_string(), theme.user_text_style),
        ]));
    }
}

fn push_assistant_lines(
    lines: &mut Vec<Line<'static>>,
    message: &Message,
    theme: &Theme,
    context: &PlainTextContext,
    markdown: bool,
) {
    let persona: AgentPersona = persona_for(&message.agent.clone().unwrap_or_default());
    lines.push(Line::from(Span::styled(
        persona.badge(),
        theme.agent_style(persona.icon),
    )));

    if markdown {
        lines.extend(render_markdown(
            &message.content,
            theme.assistant_text_style,
            theme,
        ));
    } else {
        lines.extend(render_plain(&message.content, theme.assistant_text_style));
    }

    if let Some(chart) = &message.chart {
        lines.push(Line::from(vec![
            Span::styled("▥ Chart: ", theme.chart_style.add_modifier(Modifier::BOLD)),
            Span::styled(describe_chart(chart, &context.base_url), theme.chart_style),
        ]));
    }

    if !message.citations.is_empty() {
        lines.push(Line::from(Span::styled(
            "Sources:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (index, citation) in message.citations.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::raw(format!("  [{}] ", index + 1)),
                Span::styled(
                    citation.display_text(&context.citation_prefixes),
                    theme.citation_style,
                ),
                Span::styled(format!(" <{}>", citation.url), theme.app_info_style),
            ]));
        }
    }
}
