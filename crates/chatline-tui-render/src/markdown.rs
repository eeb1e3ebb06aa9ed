//! Markdown rendering for assistant prose.
//!
//! Soft breaks end the line, so streamed text keeps the line structure the
//! model produced. Code blocks are highlighted and never wrapped; tables are
//! drawn as boxes.

use chatline_tui_core::{RenderSettings, Theme};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::syntax::highlight_code_with_settings;
use crate::text::{
    display_width, expand_tabs, line_width, normalize_line_endings, pad_to_width,
    sanitize_for_display, truncate_line, wrap_line,
};

/// Widest horizontal rule.
const RULE_WIDTH: usize = 40;

/// An open markdown element, popped on its matching end event.
#[derive(Debug)]
enum Open {
    Paragraph,
    Heading,
    Quote,
    CodeBlock { language: String, code: String },
    /// Next ordinal for numbered lists.
    List(Option<u64>),
    Item { marker: String, shown: bool },
    Table { rows: Vec<Vec<String>> },
    Row(Vec<String>),
    Cell(String),
    Styled,
    Link { url: String, text: String },
    Other,
}

/// Render `text` as styled lines no wider than `width`.
///
/// Empty input yields a single empty line.
pub fn render_markdown(
    text: &str,
    width: usize,
    theme: &Theme,
    settings: &RenderSettings,
) -> Vec<Line<'static>> {
    let text = sanitize_for_display(&expand_tabs(
        &normalize_line_endings(text),
        settings.tab_width,
    ));

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(width.max(1), theme, settings);
    for event in Parser::new_ext(&text, options) {
        renderer.event(event);
    }
    renderer.finish()
}

struct Renderer<'a> {
    width: usize,
    theme: &'a Theme,
    settings: &'a RenderSettings,
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    open: Vec<Open>,
    /// A blank line is owed before the next block.
    gap: bool,
}

impl<'a> Renderer<'a> {
    fn new(width: usize, theme: &'a Theme, settings: &'a RenderSettings) -> Self {
        Self {
            width,
            theme,
            settings,
            lines: Vec::new(),
            current: Vec::new(),
            styles: vec![theme.text_style()],
            open: Vec::new(),
            gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                if let Some(cell) = self.cell_mut() {
                    cell.push_str(&code);
                } else {
                    self.current
                        .push(Span::styled(code.to_string(), self.theme.code_style()));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => self.text(&html),
            Event::SoftBreak | Event::HardBreak => {
                if let Some(cell) = self.cell_mut() {
                    cell.push(' ');
                } else {
                    self.flush();
                }
            }
            Event::Rule => {
                self.block_start();
                let rule = "─".repeat(self.width.min(RULE_WIDTH));
                self.emit(vec![Span::styled(rule, self.theme.muted_style())], false);
                self.gap = true;
            }
            Event::TaskListMarker(done) => {
                let mark = if done { "[x] " } else { "[ ] " };
                self.current
                    .push(Span::styled(mark, self.theme.muted_style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let open = match tag {
            Tag::Paragraph => {
                self.block_start();
                Open::Paragraph
            }
            Tag::Heading { level, .. } => {
                self.block_start();
                let style = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => self.theme.bold(),
                    _ => self.theme.primary_style().add_modifier(Modifier::BOLD),
                };
                self.styles.push(style);
                Open::Heading
            }
            Tag::BlockQuote(..) => {
                self.block_start();
                self.styles
                    .push(self.theme.muted_style().add_modifier(Modifier::ITALIC));
                Open::Quote
            }
            Tag::CodeBlock(kind) => {
                self.block_start();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or_default().to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                Open::CodeBlock {
                    language,
                    code: String::new(),
                }
            }
            Tag::List(first) => {
                if self.in_item() {
                    self.flush();
                } else {
                    self.block_start();
                }
                Open::List(first)
            }
            Tag::Item => {
                self.flush();
                let marker = match self.open.iter_mut().rev().find_map(|o| match o {
                    Open::List(next) => Some(next),
                    _ => None,
                }) {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                Open::Item {
                    marker,
                    shown: false,
                }
            }
            Tag::Table(_) => {
                self.block_start();
                Open::Table { rows: Vec::new() }
            }
            Tag::TableHead | Tag::TableRow => Open::Row(Vec::new()),
            Tag::TableCell => Open::Cell(String::new()),
            Tag::Emphasis => {
                self.styles.push(self.style().add_modifier(Modifier::ITALIC));
                Open::Styled
            }
            Tag::Strong => {
                self.styles.push(self.style().add_modifier(Modifier::BOLD));
                Open::Styled
            }
            Tag::Strikethrough => {
                self.styles
                    .push(self.style().add_modifier(Modifier::CROSSED_OUT));
                Open::Styled
            }
            Tag::Link { dest_url, .. } => {
                self.styles.push(
                    self.theme
                        .accent_style()
                        .add_modifier(Modifier::UNDERLINED),
                );
                Open::Link {
                    url: dest_url.to_string(),
                    text: String::new(),
                }
            }
            _ => Open::Other,
        };
        self.open.push(open);
    }

    fn end(&mut self) {
        let Some(open) = self.open.pop() else {
            return;
        };
        match open {
            Open::Paragraph => {
                self.flush();
                self.gap = true;
            }
            Open::Heading | Open::Quote => {
                self.flush();
                self.styles.pop();
                self.gap = true;
            }
            Open::CodeBlock { language, code } => {
                self.code_block(&language, &code);
                self.gap = true;
            }
            Open::List(_) => {
                self.flush();
                if !self.in_item() {
                    self.gap = true;
                }
            }
            Open::Item { .. } => {
                // The marker belongs to the item being closed.
                self.open.push(open);
                self.flush();
                self.open.pop();
            }
            Open::Table { rows } => {
                self.table(&rows);
                self.gap = true;
            }
            Open::Row(cells) => {
                if let Some(Open::Table { rows }) = self.open.last_mut() {
                    rows.push(cells);
                }
            }
            Open::Cell(text) => {
                if let Some(Open::Row(cells)) = self.open.last_mut() {
                    cells.push(text);
                }
            }
            Open::Styled => {
                self.styles.pop();
            }
            Open::Link { url, text } => {
                self.styles.pop();
                if !url.is_empty() && url != text {
                    self.current
                        .push(Span::styled(format!(" ({url})"), self.theme.muted_style()));
                }
            }
            Open::Other => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(Open::CodeBlock { code, .. }) = self.open.last_mut() {
            code.push_str(text);
            return;
        }
        if let Some(cell) = self.cell_mut() {
            cell.push_str(text);
            return;
        }
        if let Some(Open::Link { text: link_text, .. }) = self
            .open
            .iter_mut()
            .rev()
            .find(|o| matches!(o, Open::Link { .. }))
        {
            link_text.push_str(text);
        }

        let style = self.style();
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.flush();
            }
            if !part.is_empty() {
                self.current.push(Span::styled(part.to_string(), style));
            }
        }
    }

    fn cell_mut(&mut self) -> Option<&mut String> {
        self.open.iter_mut().rev().find_map(|o| match o {
            Open::Cell(text) => Some(text),
            _ => None,
        })
    }

    fn in_item(&self) -> bool {
        self.open.iter().any(|o| matches!(o, Open::Item { .. }))
    }

    /// Pay the owed blank line before a new block.
    fn block_start(&mut self) {
        self.flush();
        if self.gap && !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.gap = false;
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.emit(spans, true);
    }

    /// Container prefixes for the next line: quote bars, list indents and
    /// the item marker on an item's first line.
    fn prefix(&self, first: bool) -> Vec<Span<'static>> {
        let mut spans = Vec::new();
        let mut in_item = false;
        for open in &self.open {
            match open {
                Open::Quote => spans.push(Span::styled("│ ", self.theme.muted_style())),
                Open::List(_) if !in_item => spans.push(Span::raw("  ")),
                Open::Item { marker, shown } => {
                    in_item = true;
                    if first && !shown {
                        spans.push(Span::styled(marker.clone(), self.theme.muted_style()));
                    } else {
                        spans.push(Span::raw(" ".repeat(display_width(marker))));
                    }
                }
                _ => {}
            }
        }
        spans
    }

    /// Push `spans` behind the container prefix, wrapped or truncated.
    fn emit(&mut self, spans: Vec<Span<'static>>, wrap: bool) {
        let first = self.prefix(true);
        let rest = self.prefix(false);
        let available = self
            .width
            .saturating_sub(line_width(&Line::from(first.clone())))
            .max(1);

        let content = Line::from(spans);
        let pieces = if wrap {
            wrap_line(content, available)
        } else {
            vec![truncate_line(content, available)]
        };
        for (i, piece) in pieces.into_iter().enumerate() {
            let mut line = if i == 0 { first.clone() } else { rest.clone() };
            line.extend(trim_end(piece).spans);
            self.lines.push(Line::from(line));
        }

        for open in &mut self.open {
            if let Open::Item { shown, .. } = open {
                *shown = true;
            }
        }
    }

    fn code_block(&mut self, language: &str, code: &str) {
        let label = if language.is_empty() { "code" } else { language };
        self.emit(
            vec![Span::styled(label.to_string(), self.theme.muted_style())],
            false,
        );
        let code = code.trim_end_matches('\n');
        for line in highlight_code_with_settings(code, language, self.theme, self.settings) {
            let mut spans = vec![Span::raw("  ")];
            spans.extend(line.spans);
            self.emit(spans, false);
        }
    }

    fn table(&mut self, rows: &[Vec<String>]) {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }
        let mut widths = vec![3; columns];
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(display_width(cell.trim()));
            }
        }

        let border = self.theme.border_style();
        let rule = |left: char, middle: char, right: char| {
            let inner: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}", inner.join(&middle.to_string()))
        };

        let top = rule('┌', '┬', '┐');
        let separator = rule('├', '┼', '┤');
        let bottom = rule('└', '┴', '┘');

        self.emit(vec![Span::styled(top, border)], false);
        for (index, row) in rows.iter().enumerate() {
            let style = if index == 0 {
                self.theme.bold()
            } else {
                self.theme.text_style()
            };
            let mut spans = vec![Span::styled("│", border)];
            for (column, width) in widths.iter().enumerate() {
                let cell = row.get(column).map(|c| c.trim()).unwrap_or_default();
                spans.push(Span::styled(format!(" {} ", pad_to_width(cell, *width)), style));
                spans.push(Span::styled("│", border));
            }
            self.emit(spans, false);
            if index == 0 && rows.len() > 1 {
                self.emit(vec![Span::styled(separator.clone(), border)], false);
            }
        }
        self.emit(vec![Span::styled(bottom, border)], false);
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        // Unclosed elements at the end of a partial stream.
        while !self.open.is_empty() {
            self.end();
        }
        self.flush();
        if self.lines.is_empty() {
            self.lines.push(Line::default());
        }
        self.lines
    }
}

/// Drop trailing spaces left at a wrap point.
fn trim_end(mut line: Line<'static>) -> Line<'static> {
    while let Some(last) = line.spans.last_mut() {
        let trimmed = last.content.trim_end_matches(' ');
        if trimmed.is_empty() {
            line.spans.pop();
        } else {
            if trimmed.len() != last.content.len() {
                last.content = trimmed.to_string().into();
            }
            break;
        }
    }
    line
}
