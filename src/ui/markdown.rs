//! Markdown to styled terminal lines.
//!
//! Only the constructs the answering service actually produces are given
//! special treatment: headings, emphasis, lists, block quotes, code and
//! tables. Wrapping is left to the transcript paragraph.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::ui::theme::Theme;

const CODE_INDENT: &str = "  ";

/// Render `content` as markdown. The result never ends in a blank line.
pub fn render_markdown(content: &str, base: Style, theme: &Theme) -> Vec<Line<'static>> {
    MarkdownRenderer::new(theme, base).render(content)
}

/// Render `content` verbatim, one line per source line.
pub fn render_plain(content: &str, base: Style) -> Vec<Line<'static>> {
    content
        .lines()
        .map(|line| Line::from(Span::styled(detab(line), base)))
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

#[derive(Default)]
struct TableBuffer {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    current_row: Vec<String>,
    current_cell: Option<String>,
    in_header: bool,
}

impl TableBuffer {
    fn push_text(&mut self, text: &str) {
        if let Some(cell) = self.current_cell.as_mut() {
            cell.push_str(text);
        }
    }

    fn end_cell(&mut self) {
        if let Some(cell) = self.current_cell.take() {
            self.current_row.push(cell.trim().to_string());
        }
    }

    fn end_row(&mut self) {
        let row = std::mem::take(&mut self.current_row);
        if self.in_header {
            self.header = row;
        } else {
            self.rows.push(row);
        }
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0);
        (0..columns)
            .map(|index| {
                std::iter::once(&self.header)
                    .chain(self.rows.iter())
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.width())
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect()
    }

    /// Pipe-delimited rows with a dashed rule under the header.
    fn into_lines(self, theme: &Theme, base: Style) -> Vec<Line<'static>> {
        let widths = self.column_widths();
        let border = theme.md_table_border_style();
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        let format_row = |row: &[String], style: Style| {
            let mut spans = vec![Span::styled("|", border)];
            for (index, width) in widths.iter().enumerate() {
                let cell = row.get(index).map(String::as_str).unwrap_or("");
                let padding = width.saturating_sub(cell.width());
                spans.push(Span::styled(
                    format!(" {}{} ", cell, " ".repeat(padding)),
                    style,
                ));
                spans.push(Span::styled("|", border));
            }
            Line::from(spans)
        };

        if !self.header.is_empty() {
            lines.push(format_row(
                self.header.as_slice(),
                base.add_modifier(Modifier::BOLD),
            ));
            let rule: String = widths
                .iter()
                .map(|width| format!("{}|", "-".repeat(width + 2)))
                .collect();
            lines.push(Line::from(Span::styled(format!("|{rule}"), border)));
        }
        for row in &self.rows {
            lines.push(format_row(row.as_slice(), base));
        }
        lines
    }
}

struct MarkdownRenderer<'t> {
    theme: &'t Theme,
    lines: Vec<Line<'static>>,
    current_spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    pending_indent: Option<usize>,
    code_block: Option<Vec<String>>,
    table: Option<TableBuffer>,
}

impl<'t> MarkdownRenderer<'t> {
    fn new(theme: &'t Theme, base: Style) -> Self {
        Self {
            theme,
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![base],
            list_stack: Vec::new(),
            pending_indent: None,
            code_block: None,
            table: None,
        }
    }

    fn base(&self) -> Style {
        self.style_stack.first().copied().unwrap_or_default()
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => {
                    if let Some(code_lines) = self.code_block.as_mut() {
                        push_codeblock_text(code_lines, &text);
                    } else if let Some(table) = self.table.as_mut() {
                        table.push_text(&text);
                    } else {
                        let style = self.current_style();
                        self.push_span(Span::styled(detab(&text), style));
                    }
                }
                Event::Code(code) => {
                    if let Some(table) = self.table.as_mut() {
                        table.push_text(&code);
                    } else {
                        let style = self.theme.md_inline_code_style();
                        self.push_span(Span::styled(detab(&code), style));
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(table) = self.table.as_mut() {
                        table.push_text(" ");
                    } else {
                        self.flush_line();
                        if !self.list_stack.is_empty() {
                            self.pending_indent = Some(self.list_indent());
                        }
                    }
                }
                Event::Rule => {
                    self.flush_line();
                    self.lines.push(Line::from(Span::styled(
                        "─".repeat(24),
                        self.theme.md_table_border_style(),
                    )));
                    self.push_blank();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.push_span(Span::styled(marker, self.theme.md_list_marker_style()));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    let style = self.current_style();
                    self.push_span(Span::styled(html.to_string(), style));
                }
                _ => {}
            }
        }

        self.flush_line();
        while self
            .lines
            .last()
            .is_some_and(|line| line.spans.iter().all(|span| span.content.trim().is_empty()))
        {
            self.lines.pop();
        }
        self.lines
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let style = self.theme.md_heading_style(level as u8);
                self.style_stack.push(style);
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.style_stack.push(self.theme.md_blockquote_style());
                self.push_span(Span::styled("│ ", self.theme.md_blockquote_style()));
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.pending_indent = Some(self.list_indent().saturating_sub(2));
                self.push_span(Span::styled(marker, self.theme.md_list_marker_style()));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                if let CodeBlockKind::Fenced(lang) = kind {
                    let lang = lang.trim();
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("{CODE_INDENT}{lang}"),
                            self.theme.md_table_border_style(),
                        )));
                    }
                }
                self.code_block = Some(Vec::new());
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } | Tag::Image { .. } => {
                self.style_stack.push(self.theme.md_link_style());
            }
            Tag::Table(_) => {
                self.flush_line();
                self.table = Some(TableBuffer::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.in_header = true;
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.current_cell = Some(String::new());
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.push_blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.pop_style();
                self.push_blank();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.pop_style();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_blank();
                }
            }
            TagEnd::Item => {
                self.flush_line();
                self.pending_indent = None;
            }
            TagEnd::CodeBlock => {
                let code_lines = self.code_block.take().unwrap_or_default();
                let style = self.theme.md_codeblock_style();
                for line in code_lines {
                    self.lines.push(Line::from(Span::styled(
                        format!("{CODE_INDENT}{}", detab(&line)),
                        style,
                    )));
                }
                self.push_blank();
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => self.pop_style(),
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row();
                    table.in_header = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row();
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    let base = self.base();
                    self.lines.extend(table.into_lines(self.theme, base));
                    self.push_blank();
                }
            }
            _ => {}
        }
    }

    /// Width of the markers of all enclosing list levels.
    fn list_indent(&self) -> usize {
        self.list_stack.len() * 2
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.current_spans.is_empty() {
            if let Some(indent) = self.pending_indent.take() {
                if indent > 0 {
                    self.current_spans.push(Span::raw(" ".repeat(indent)));
                }
            }
        }
        self.current_spans.push(span);
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }

    fn push_blank(&mut self) {
        if self.lines.last().is_some_and(|line| !line.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}

fn push_codeblock_text(code_lines: &mut Vec<String>, text: &str) {
    for line in text.split_inclusive('\n') {
        code_lines.push(line.trim_end_matches('\n').to_string());
    }
}

fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}
