//! Prose, reasoning, run metadata and divider items.

use chatline_tui_core::RenderContext;
use chatline_tui_render::{center_label, format_duration, render_markdown, wrap_text};
use ratatui::{
    style::Modifier,
    text::{Line, Span},
};

use crate::item::Expandable;

/// Streaming assistant text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBlock {
    pub content: String,
}

impl TextBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Prose wraps at `min(width - 2, max_text_width)` behind a two column indent.
    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let wrap = (width.saturating_sub(2))
            .min(ctx.settings.max_text_width)
            .max(1) as usize;
        let content = self.content.trim_end_matches('\n');
        let lines = if ctx.settings.markdown_enabled {
            render_markdown(content, wrap, &ctx.theme, &ctx.settings)
        } else {
            wrap_text(content, wrap)
                .into_iter()
                .map(|line| Line::from(Span::styled(line, ctx.theme.text_style())))
                .collect()
        };
        lines
            .into_iter()
            .map(|line| {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(line.spans);
                Line::from(spans)
            })
            .collect()
    }
}

/// A message typed by the user, shown right-aligned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserBlock {
    pub content: String,
}

impl UserBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let wrap = (width.saturating_sub(4))
            .min(ctx.settings.max_text_width)
            .max(1) as usize;
        let style = ctx.theme.user_style().add_modifier(Modifier::BOLD);
        wrap_text(&self.content, wrap)
            .into_iter()
            .map(|line| Line::from(vec![Span::styled(line, style), Span::raw(" ")]).right_aligned())
            .collect()
    }
}

/// Model reasoning. Collapsed by default to its last few lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinkingBlock {
    pub content: String,
    pub collapsed: bool,
    pub finished: bool,
    pub duration_ms: Option<u64>,
}

impl Default for ThinkingBlock {
    fn default() -> Self {
        Self {
            content: String::new(),
            collapsed: true,
            finished: false,
            duration_ms: None,
        }
    }
}

impl ThinkingBlock {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn finish(&mut self, duration_ms: Option<u64>) {
        self.finished = true;
        self.duration_ms = duration_ms;
    }

    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let theme = &ctx.theme;
        let style = theme.thinking_style();
        let wrap = (width.saturating_sub(4))
            .min(ctx.settings.max_text_width)
            .max(1) as usize;

        let label = if self.finished { "  ✻ Thinking" } else { "  ✻ Thinking…" };
        let mut lines = vec![Line::from(Span::styled(label, theme.accent_style()))];

        let logical: Vec<&str> = self.content.trim_end().lines().collect();
        let total = logical.len();
        let visible = ctx.settings.thinking_visible_lines.max(1);
        let shown: &[&str] = if self.collapsed && total > visible {
            lines.push(Line::from(Span::styled(
                format!("  … ({} lines hidden)", total - visible),
                theme.muted_style(),
            )));
            &logical[total - visible..]
        } else {
            &logical
        };

        for raw in shown {
            for wrapped in wrap_text(raw, wrap) {
                lines.push(Line::from(vec![
                    Span::styled("  ┃ ", theme.muted_style()),
                    Span::styled(wrapped, style),
                ]));
            }
        }

        if !self.collapsed && total > visible {
            lines.push(Line::from(Span::styled(
                "  (click to collapse)",
                theme.muted_style(),
            )));
        }

        if self.finished {
            let footer = match self.duration_ms {
                Some(ms) => format!("  Thought for {}", format_duration(ms)),
                None => "  Thought".to_string(),
            };
            lines.push(Line::from(Span::styled(footer, theme.muted_style())));
        }
        lines
    }
}

impl Expandable for ThinkingBlock {
    fn is_expanded(&self) -> bool {
        !self.collapsed
    }

    fn toggle_expanded(&mut self) {
        self.collapsed = !self.collapsed;
    }
}

/// Metadata for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInfo {
    pub model: String,
    pub provider: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub canceled: bool,
}

impl RunInfo {
    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let theme = &ctx.theme;
        let parts: Vec<String> = [self.model.as_str(), self.provider.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .chain(std::iter::once(format_duration(self.duration_ms)))
            .collect();

        let mut lines = vec![Line::from(vec![
            Span::styled("  ◆ ", theme.primary_style()),
            Span::styled(parts.join(" · "), theme.muted_style()),
        ])];

        if self.canceled {
            lines.push(Line::from(Span::styled("  ⊘ canceled", theme.warning_style())));
        }
        if let Some(error) = self.error.as_deref().filter(|e| !e.trim().is_empty()) {
            let wrap = (width.saturating_sub(4)).max(1) as usize;
            for (i, line) in wrap_text(error.trim(), wrap).into_iter().enumerate() {
                let prefix = if i == 0 { "  ✕ " } else { "    " };
                lines.push(Line::from(vec![
                    Span::styled(prefix, theme.error_style()),
                    Span::styled(line, theme.error_style()),
                ]));
            }
        }
        lines
    }
}

/// Separator between agent iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Divider {
    pub iteration: u32,
}

impl Divider {
    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let label = format!(" Iteration {} ", self.iteration);
        vec![Line::from(Span::styled(
            center_label(&label, width as usize, '─'),
            ctx.theme.muted_style(),
        ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatline_tui_render::{line_text, line_width};
    use ratatui::layout::Alignment;

    fn texts(lines: &[Line<'static>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    #[test]
    fn test_text_wraps_at_width_minus_two() {
        let ctx = RenderContext::default();
        let block = TextBlock::new("aaaa bbbb cccc");
        let lines = block.render(11, &ctx);
        assert_eq!(texts(&lines), vec!["  aaaa bbbb", "  cccc"]);
    }

    #[test]
    fn test_text_wrap_is_capped() {
        let ctx = RenderContext::default();
        let block = TextBlock::new("word ".repeat(100));
        let lines = block.render(300, &ctx);
        assert!(lines.iter().all(|l| line_width(l) <= 122));
        assert!(lines.len() > 1);
    }

    #[test]
    fn test_text_renders_markdown() {
        let ctx = RenderContext::default();
        let block = TextBlock::new("**Done.**\n\n- one\n- two");
        let lines = block.render(40, &ctx);
        assert_eq!(texts(&lines), vec!["  Done.", "", "    • one", "    • two"]);
        let bold = lines[0].spans.iter().find(|s| s.content == "Done.").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_text_markdown_can_be_disabled() {
        let mut ctx = RenderContext::default();
        ctx.settings.markdown_enabled = false;
        let lines = TextBlock::new("**Done.**").render(40, &ctx);
        assert_eq!(texts(&lines), vec!["  **Done.**"]);
    }

    #[test]
    fn test_user_is_right_aligned() {
        let ctx = RenderContext::default();
        let lines = UserBlock::new("hi there").render(40, &ctx);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));
        assert_eq!(line_text(&lines[0]), "hi there ");
    }

    #[test]
    fn test_thinking_collapsed_shows_tail() {
        let ctx = RenderContext::default();
        let content: Vec<String> = (1..=15).map(|i| format!("step {i}")).collect();
        let block = ThinkingBlock::new(content.join("\n"));
        let lines = texts(&block.render(80, &ctx));
        assert!(lines[1].contains("(5 lines hidden)"));
        assert!(lines[2].ends_with("step 6"));
        assert!(lines.last().unwrap().ends_with("step 15"));
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn test_thinking_expanded_shows_all() {
        let ctx = RenderContext::default();
        let content: Vec<String> = (1..=15).map(|i| format!("step {i}")).collect();
        let mut block = ThinkingBlock::new(content.join("\n"));
        block.toggle_expanded();
        let lines = texts(&block.render(80, &ctx));
        assert!(lines.iter().any(|l| l.ends_with("step 1")));
        assert!(!lines.iter().any(|l| l.contains("hidden")));
        assert!(lines.last().unwrap().contains("click to collapse"));
    }

    #[test]
    fn test_thinking_short_content_unaffected_by_toggle() {
        let ctx = RenderContext::default();
        let mut block = ThinkingBlock::new("one\ntwo");
        let before = block.render(80, &ctx);
        block.toggle_expanded();
        assert_eq!(block.render(80, &ctx), before);
    }

    #[test]
    fn test_thinking_finished_footer() {
        let ctx = RenderContext::default();
        let mut block = ThinkingBlock::new("hmm");
        block.finish(Some(2_300));
        let lines = texts(&block.render(80, &ctx));
        assert_eq!(lines.last().unwrap(), "  Thought for 2.3s");
    }

    #[test]
    fn test_run_info_render() {
        let ctx = RenderContext::default();
        let info = RunInfo {
            model: "gpt-x".to_string(),
            provider: "acme".to_string(),
            duration_ms: 1_500,
            error: Some("rate limited".to_string()),
            canceled: true,
        };
        let lines = texts(&info.render(80, &ctx));
        assert_eq!(lines[0], "  ◆ gpt-x · acme · 1.5s");
        assert_eq!(lines[1], "  ⊘ canceled");
        assert_eq!(lines[2], "  ✕ rate limited");
    }

    #[test]
    fn test_divider_is_centered() {
        let ctx = RenderContext::default();
        let lines = Divider { iteration: 3 }.render(30, &ctx);
        let text = line_text(&lines[0]);
        assert_eq!(line_width(&lines[0]), 30);
        assert!(text.contains(" Iteration 3 "));
        assert!(text.starts_with('─') && text.ends_with('─'));
    }
}
