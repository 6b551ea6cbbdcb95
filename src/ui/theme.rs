use ratatui::style::{Color, Modifier, Style};

use crate::core::presentation::AgentIcon;

#[derive(Debug, Clone)]
pub struct Theme {
    // Transcript
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub app_info_style: Style,
    pub app_error_style: Style,
    pub citation_style: Style,
    pub chart_style: Style,

    // Chrome
    pub title_style: Style,
    pub thinking_style: Style,
    pub status_style: Style,
    pub intro_style: Style,
    pub input_border_style: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark_default()
    }
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            app_info_style: Style::default().fg(Color::DarkGray),
            app_error_style: Style::default().fg(Color::Red),
            citation_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            chart_style: Style::default().fg(Color::Magenta),

            title_style: Style::default().fg(Color::Gray),
            thinking_style: Style::default().fg(Color::White),
            status_style: Style::default().fg(Color::Yellow),
            intro_style: Style::default().fg(Color::Gray),
            input_border_style: Style::default().fg(Color::Gray),
        }
    }

    /// Accent used for an agent's glyph and label.
    pub fn agent_style(&self, icon: AgentIcon) -> Style {
        let color = match icon {
            AgentIcon::ChartBar => Color::Magenta,
            AgentIcon::Database => Color::Green,
            AgentIcon::Search => Color::Yellow,
            AgentIcon::ChartLine => Color::LightBlue,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    pub fn md_heading_style(&self, level: u8) -> Style {
        let base = Style::default().add_modifier(Modifier::BOLD);
        match level {
            1 => base.fg(Color::LightCyan).add_modifier(Modifier::UNDERLINED),
            2 => base.fg(Color::LightCyan),
            _ => base.fg(Color::Cyan),
        }
    }

    pub fn md_inline_code_style(&self) -> Style {
        Style::default().fg(Color::LightYellow)
    }

    pub fn md_codeblock_style(&self) -> Style {
        Style::default().fg(Color::LightYellow).bg(Color::Rgb(30, 30, 30))
    }

    pub fn md_list_marker_style(&self) -> Style {
        Style::default().fg(Color::Yellow)
    }

    pub fn md_link_style(&self) -> Style {
        self.citation_style
    }

    pub fn md_blockquote_style(&self) -> Style {
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)
    }

    pub fn md_table_border_style(&self) -> Style {
        Style::default().fg(Color::DarkGray)
    }
}
