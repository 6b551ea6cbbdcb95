use std::time::{Duration, Instant};

use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders};
use tui_textarea::{CursorMove, TextArea};

/// Status messages disappear after this long.
pub const STATUS_TTL: Duration = Duration::from_secs(4);

pub struct UiState {
    textarea: TextArea<'static>,
    pub scroll_offset: u16,
    /// Largest useful `scroll_offset`, recorded by the renderer on each frame.
    pub max_scroll: u16,
    pub auto_scroll: bool,
    pub status: Option<String>,
    status_set_at: Option<Instant>,
    pub pulse_start: Instant,
    pub show_intro: bool,
    pub markdown_enabled: bool,
    pub exit_requested: bool,
}

impl UiState {
    pub fn new(markdown_enabled: bool) -> Self {
        let mut ui = Self {
            textarea: TextArea::default(),
            scroll_offset: 0,
            max_scroll: 0,
            auto_scroll: true,
            status: None,
            status_set_at: None,
            pulse_start: Instant::now(),
            show_intro: true,
            markdown_enabled,
            exit_requested: false,
        };
        ui.configure_textarea();
        ui
    }

    fn configure_textarea(&mut self) {
        self.textarea.set_cursor_line_style(Style::default());
        self.textarea
            .set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        self.textarea
            .set_placeholder_text("Ask about a stock, a market trend, or request a chart…");
        self.textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Enter to send · Alt+Enter for newline · /help "),
        );
    }

    pub fn textarea(&self) -> &TextArea<'static> {
        &self.textarea
    }

    pub fn textarea_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.textarea
    }

    pub fn get_input_text(&self) -> String {
        self.textarea.lines().join("\n")
    }

    pub fn set_input_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        let lines: Vec<String> = if text.is_empty() {
            vec![String::new()]
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.textarea = TextArea::new(lines);
        self.configure_textarea();
        self.textarea.move_cursor(CursorMove::Bottom);
        self.textarea.move_cursor(CursorMove::End);
    }

    pub fn clear_input(&mut self) {
        self.set_input_text(String::new());
    }

    /// Take the current input and leave the box empty.
    pub fn take_input(&mut self) -> String {
        let text = self.get_input_text();
        self.clear_input();
        text
    }

    pub fn input_line_count(&self) -> u16 {
        u16::try_from(self.textarea.lines().len()).unwrap_or(u16::MAX)
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
        self.status_set_at = Some(Instant::now());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_set_at = None;
    }

    pub fn status_expired(&self, now: Instant) -> bool {
        self.status_set_at
            .is_some_and(|set_at| now.duration_since(set_at) >= STATUS_TTL)
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.auto_scroll {
            self.scroll_offset = self.max_scroll;
        }
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Reaching the bottom re-enables follow mode.
    pub fn scroll_down(&mut self, lines: u16) {
        if self.auto_scroll {
            return;
        }
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    pub fn scroll_to_bottom(&mut self) {
        self.auto_scroll = true;
        self.scroll_offset = self.max_scroll;
    }

    pub fn scroll_to_top(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = 0;
    }

    /// Called by the renderer once the transcript height is known.
    pub fn update_max_scroll(&mut self, max_scroll: u16) {
        self.max_scroll = max_scroll;
        if self.auto_scroll || self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
    }

    /// Animation phase of the thinking indicator, in `0..frames`.
    pub fn pulse_frame(&self, now: Instant, frames: usize, period: Duration) -> usize {
        if frames == 0 || period.is_zero() {
            return 0;
        }
        let elapsed = now.duration_since(self.pulse_start).as_millis();
        let step = period.as_millis().max(1);
        usize::try_from((elapsed / step) % frames as u128).unwrap_or(0)
    }
}
