//! Tool call and subagent items.

use std::ops::Range;

use chatline_tui_core::RenderContext;
use chatline_tui_render::{
    count_changes, display_width, expand_tabs, highlight_code_with_settings, language_from_path,
    normalize_line_endings, render_side_by_side, sanitize_for_display, truncate_line,
    truncate_with_ellipsis, wrap_text, DiffLayout,
};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::diagnostics::{parse_diagnostics, DiagnosticsBlock, Severity};
use crate::item::Expandable;
use crate::numbered::{is_numbered_output, parse_numbered_line};

const HEADER_PREFIX: &str = "  ╭─ ";
const BODY_PREFIX: &str = "  │ ";
const FOOTER: &str = "  ╰─";

/// Input keys that name what a tool operates on, in display priority order.
const SUMMARY_KEYS: &[&str] = &[
    "command",
    "filePath",
    "file_path",
    "path",
    "pattern",
    "url",
    "description",
];

/// Payload keys never used as a summary.
const PAYLOAD_KEYS: &[&str] = &["oldString", "newString", "content"];

/// Input key whose presence marks a delegated subagent call.
pub const SUBAGENT_MARKER: &str = "subagent_type";

/// Lifecycle status of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolStatus {
    #[default]
    Pending,
    Running,
    Success,
    Error,
    Canceled,
}

impl ToolStatus {
    /// Parse a wire status string. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(ToolStatus::Pending),
            "in_progress" | "running" => Some(ToolStatus::Running),
            "completed" | "success" => Some(ToolStatus::Success),
            "error" | "failed" => Some(ToolStatus::Error),
            "canceled" | "cancelled" => Some(ToolStatus::Canceled),
            _ => None,
        }
    }

    /// Pending or running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, ToolStatus::Pending | ToolStatus::Running)
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            ToolStatus::Pending => "○",
            ToolStatus::Running => "●",
            ToolStatus::Success => "✓",
            ToolStatus::Error => "✕",
            ToolStatus::Canceled => "⊘",
        }
    }

    fn style(&self, ctx: &RenderContext) -> Style {
        let theme = &ctx.theme;
        match self {
            ToolStatus::Pending | ToolStatus::Canceled => theme.muted_style(),
            ToolStatus::Running => theme.warning_style(),
            ToolStatus::Success => theme.success_style(),
            ToolStatus::Error => theme.error_style(),
        }
    }
}

/// Before/after contents of a file changed by a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDiff {
    pub path: String,
    pub before: String,
    pub after: String,
    pub additions: usize,
    pub deletions: usize,
}

/// Reduce `mcp__server__tool` to `tool`; other names are returned as is.
pub fn normalize_tool_name(name: &str) -> &str {
    match name.strip_prefix("mcp__") {
        Some(rest) => rest.rsplit("__").next().unwrap_or(rest),
        None => name,
    }
}

/// One-line description of a tool's arguments.
pub fn arg_summary(input: &Map<String, Value>) -> Option<String> {
    let value = SUMMARY_KEYS
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            input
                .iter()
                .filter(|(key, _)| !PAYLOAD_KEYS.contains(&key.as_str()))
                .filter_map(|(_, value)| value.as_str())
                .find(|s| !s.trim().is_empty())
        })?;
    value.lines().next().map(|l| l.trim().to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolItem {
    /// External correlation key.
    pub call_id: String,
    pub title: String,
    /// Tool kind tag, e.g. `edit` or `bash`.
    pub kind: String,
    pub status: ToolStatus,
    pub input: Map<String, Value>,
    pub output: String,
    pub diff: Option<FileDiff>,
    pub expanded: bool,
    /// Output lines shown before truncating. Falls back to the render settings.
    pub max_lines: Option<usize>,
}

impl ToolItem {
    pub fn new(call_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Kind with any MCP prefix removed.
    pub fn normalized_kind(&self) -> &str {
        normalize_tool_name(&self.kind)
    }

    /// True if the input marks this call as a subagent delegation.
    pub fn is_subagent(&self) -> bool {
        is_subagent_input(&self.input)
    }

    fn input_str(&self, key: &str) -> Option<&str> {
        self.input.get(key).and_then(Value::as_str)
    }

    fn file_path(&self) -> Option<&str> {
        self.input_str("filePath")
            .or_else(|| self.input_str("file_path"))
            .or_else(|| self.input_str("path"))
            .or_else(|| self.diff.as_ref().map(|d| d.path.as_str()))
            .filter(|p| !p.is_empty())
    }

    fn line_budget(&self, ctx: &RenderContext) -> usize {
        self.max_lines
            .unwrap_or(ctx.settings.tool_output_max_lines)
            .max(1)
    }

    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        self.render_block(&mut lines, None, width, ctx);
        lines
    }

    /// Header, optional extra body lines, tool body, footer.
    fn render_block(
        &self,
        lines: &mut Vec<Line<'static>>,
        extra: Option<Vec<Line<'static>>>,
        width: u16,
        ctx: &RenderContext,
    ) {
        let inner = (width as usize)
            .saturating_sub(display_width(BODY_PREFIX))
            .max(ctx.settings.min_panel_width as usize);

        lines.push(self.header(width as usize, ctx));
        let (body, laid_out) = self.body(inner, ctx);
        let extra = extra.into_iter().flatten().map(|line| truncate_line(line, inner));
        let body = body.into_iter().enumerate().map(|(i, line)| {
            if laid_out.contains(&i) {
                line
            } else {
                truncate_line(line, inner)
            }
        });
        for line in extra.chain(body) {
            let mut spans = vec![Span::styled(BODY_PREFIX, ctx.theme.tool_border_style())];
            spans.extend(line.spans);
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(Span::styled(FOOTER, ctx.theme.tool_border_style())));
    }

    fn header(&self, width: usize, ctx: &RenderContext) -> Line<'static> {
        let theme = &ctx.theme;
        let title = if !self.title.is_empty() {
            self.title.clone()
        } else if !self.kind.is_empty() {
            self.normalized_kind().to_string()
        } else {
            "tool".to_string()
        };

        let glyph = self.status.glyph();
        let used = display_width(HEADER_PREFIX) + display_width(glyph) + 1 + display_width(&title);
        let mut spans = vec![
            Span::styled(HEADER_PREFIX, theme.tool_border_style()),
            Span::styled(glyph, self.status.style(ctx)),
            Span::raw(" "),
            Span::styled(title, theme.bold()),
        ];

        let remaining = width.saturating_sub(used + 2);
        if let Some(summary) = arg_summary(&self.input) {
            if remaining > 3 {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    truncate_with_ellipsis(&summary, remaining),
                    theme.muted_style(),
                ));
            }
        }
        Line::from(spans)
    }

    /// Body lines, plus the range of rows that carry their own column
    /// layout and must not be cut to `inner`.
    fn body(&self, inner: usize, ctx: &RenderContext) -> (Vec<Line<'static>>, Range<usize>) {
        if self.status == ToolStatus::Success {
            if let Some((mut lines, rows)) = self.diff_body(inner, ctx) {
                if let Some(block) = parse_diagnostics(&self.output) {
                    lines.extend(render_diagnostics(&block, ctx));
                }
                return (lines, rows);
            }
        }
        if self.normalized_kind() == "write" && self.diff.is_none() {
            if let Some(lines) = self.write_body(ctx) {
                return (lines, 0..0);
            }
        }
        (self.output_body(inner, ctx), 0..0)
    }

    /// Structured diff, or the `oldString`/`newString` fallback.
    ///
    /// Diff columns are floored at the minimum panel width, so on narrow
    /// terminals the rows may be wider than `inner`.
    fn diff_body(
        &self,
        inner: usize,
        ctx: &RenderContext,
    ) -> Option<(Vec<Line<'static>>, Range<usize>)> {
        let (before, after, mut additions, mut deletions) = match &self.diff {
            Some(diff) => (
                diff.before.as_str(),
                diff.after.as_str(),
                diff.additions,
                diff.deletions,
            ),
            None => (
                self.input_str("oldString")?,
                self.input_str("newString")?,
                0,
                0,
            ),
        };

        let rows = render_side_by_side(before, after, &DiffLayout::new(inner, &ctx.settings), &ctx.theme);
        if rows.is_empty() {
            return None;
        }
        if additions == 0 && deletions == 0 {
            (additions, deletions) = count_changes(before, after);
        }

        let theme = &ctx.theme;
        let mut lines = Vec::with_capacity(rows.len() + 2);
        let mut header = Vec::new();
        if let Some(path) = self.file_path() {
            header.push(Span::styled(format!("{path}  "), theme.muted_style()));
        }
        header.push(Span::styled(format!("+{additions}"), theme.success_style()));
        header.push(Span::raw(" "));
        header.push(Span::styled(format!("-{deletions}"), theme.error_style()));
        lines.push(Line::from(header));

        // Diffs get twice the plain output budget.
        let budget = self.line_budget(ctx) * 2;
        let total = rows.len();
        lines.extend(rows.into_iter().take(if self.expanded { total } else { budget }));
        let laid_out = 1..lines.len();
        push_truncation_hint(&mut lines, total, budget, self.expanded, ctx);
        Some((lines, laid_out))
    }

    /// Numbered, highlighted preview of written file content.
    fn write_body(&self, ctx: &RenderContext) -> Option<Vec<Line<'static>>> {
        let content = self.input_str("content")?;
        let content = expand_tabs(&normalize_line_endings(content), ctx.settings.tab_width);
        let content = content.trim_end_matches('\n');
        let language = self
            .file_path()
            .and_then(language_from_path)
            .unwrap_or_default();

        let total = content.split('\n').count();
        let budget = self.line_budget(ctx);
        let shown = if self.expanded { total } else { total.min(budget) };
        let visible: Vec<&str> = content.split('\n').take(shown).collect();
        let highlighted =
            highlight_code_with_settings(&visible.join("\n"), &language, &ctx.theme, &ctx.settings);

        let gutter = total
            .to_string()
            .len()
            .max(ctx.settings.min_gutter_width as usize);
        let mut lines: Vec<Line<'static>> = highlighted
            .into_iter()
            .enumerate()
            .map(|(i, code)| numbered_line(i + 1, gutter, code, ctx))
            .collect();

        if total > shown {
            push_truncation_hint(&mut lines, total, budget, self.expanded, ctx);
        } else {
            let noun = if total == 1 { "line" } else { "lines" };
            lines.push(Line::from(Span::styled(
                format!("({total} {noun})"),
                ctx.theme.muted_style(),
            )));
            if self.expanded && total > budget {
                push_truncation_hint(&mut lines, total, budget, true, ctx);
            }
        }
        Some(lines)
    }

    fn output_body(&self, inner: usize, ctx: &RenderContext) -> Vec<Line<'static>> {
        let theme = &ctx.theme;
        let text = sanitize_for_display(&expand_tabs(
            &normalize_line_endings(&self.output),
            ctx.settings.tab_width,
        ));

        let diagnostics = parse_diagnostics(&text);
        let plain = match &diagnostics {
            Some(block) => format!("{}{}", &text[..block.span.start], &text[block.span.end..]),
            None => text,
        };
        let plain = plain.trim_end();

        let mut lines = Vec::new();
        if plain.trim().is_empty() {
            if self.status == ToolStatus::Success && diagnostics.is_none() {
                lines.push(Line::from(Span::styled("(no output)", theme.muted_style())));
            }
        } else if self.status == ToolStatus::Error {
            for line in plain.lines() {
                for wrapped in wrap_text(line, inner) {
                    lines.push(Line::from(Span::styled(wrapped, theme.error_style())));
                }
            }
        } else {
            let source: Vec<&str> = plain.lines().collect();
            let total = source.len();
            let budget = self.line_budget(ctx);
            let shown = if self.expanded { total } else { total.min(budget) };
            let visible = &source[..shown];

            if is_numbered_output(plain) {
                lines.extend(self.numbered_output(visible, ctx));
            } else {
                lines.extend(
                    visible
                        .iter()
                        .map(|l| Line::from(Span::styled(l.to_string(), theme.muted_style()))),
                );
            }
            push_truncation_hint(&mut lines, total, budget, self.expanded, ctx);
        }

        if let Some(block) = diagnostics {
            lines.extend(render_diagnostics(&block, ctx));
        }
        lines
    }

    /// `NNNNN| content` lines with a gutter and highlighted content.
    fn numbered_output(&self, visible: &[&str], ctx: &RenderContext) -> Vec<Line<'static>> {
        let parsed: Vec<Option<(usize, &str)>> =
            visible.iter().map(|l| parse_numbered_line(l)).collect();
        let max_number = parsed.iter().flatten().map(|(n, _)| *n).max().unwrap_or(0);
        let gutter = max_number
            .to_string()
            .len()
            .max(ctx.settings.min_gutter_width as usize);

        let language = self
            .file_path()
            .and_then(language_from_path)
            .unwrap_or_default();
        let code: Vec<&str> = parsed.iter().flatten().map(|(_, c)| *c).collect();
        let mut highlighted =
            highlight_code_with_settings(&code.join("\n"), &language, &ctx.theme, &ctx.settings)
                .into_iter();

        parsed
            .iter()
            .zip(visible)
            .map(|(entry, raw)| match entry {
                Some((number, content)) => {
                    let code = highlighted
                        .next()
                        .unwrap_or_else(|| Line::from(content.to_string()));
                    numbered_line(*number, gutter, code, ctx)
                }
                None => Line::from(Span::styled(raw.to_string(), ctx.theme.muted_style())),
            })
            .collect()
    }
}

impl Expandable for ToolItem {
    fn is_expanded(&self) -> bool {
        self.expanded
    }

    fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }
}

/// A tool call that delegated work to a subagent session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubagentItem {
    pub tool: ToolItem,
    /// Delegated session, empty until the subagent reports it.
    pub session_id: String,
}

impl SubagentItem {
    pub fn from_tool(tool: ToolItem, session_id: impl Into<String>) -> Self {
        Self {
            tool,
            session_id: session_id.into(),
        }
    }

    pub fn subagent_type(&self) -> &str {
        self.tool.input_str(SUBAGENT_MARKER).unwrap_or_default()
    }

    /// Clicking opens the session once one is known.
    pub fn has_session(&self) -> bool {
        !self.session_id.is_empty()
    }

    pub fn render(&self, width: u16, ctx: &RenderContext) -> Vec<Line<'static>> {
        let mut tool = self.tool.clone();
        if tool.title.is_empty() {
            tool.title = self.subagent_type().to_string();
        }

        let extra = self.has_session().then(|| {
            vec![Line::from(Span::styled(
                format!("↳ open session {}", self.session_id),
                ctx.theme.accent_style().add_modifier(Modifier::UNDERLINED),
            ))]
        });

        let mut lines = Vec::new();
        tool.render_block(&mut lines, extra, width, ctx);
        lines
    }
}

impl Expandable for SubagentItem {
    fn is_expanded(&self) -> bool {
        self.tool.expanded
    }

    fn toggle_expanded(&mut self) {
        self.tool.toggle_expanded();
    }
}

pub fn is_subagent_input(input: &Map<String, Value>) -> bool {
    input
        .get(SUBAGENT_MARKER)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

fn numbered_line(number: usize, gutter: usize, code: Line<'static>, ctx: &RenderContext) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{number:>gutter$} "),
        ctx.theme.muted_style(),
    )];
    spans.extend(code.spans);
    Line::from(spans)
}

/// Hidden-count hint when collapsed, collapse hint when expanded.
fn push_truncation_hint(
    lines: &mut Vec<Line<'static>>,
    total: usize,
    budget: usize,
    expanded: bool,
    ctx: &RenderContext,
) {
    if total <= budget {
        return;
    }
    let text = if expanded {
        "(click to collapse)".to_string()
    } else {
        format!("… ({} lines hidden)", total - budget)
    };
    lines.push(Line::from(Span::styled(text, ctx.theme.muted_style())));
}

fn render_diagnostics(block: &DiagnosticsBlock, ctx: &RenderContext) -> Vec<Line<'static>> {
    let theme = &ctx.theme;
    let mut lines = vec![Line::from(vec![
        Span::styled(block.file.clone(), theme.muted_style()),
        Span::styled(
            format!(
                "  {} errors, {} warnings",
                block.error_count(),
                block.warning_count()
            ),
            theme.muted_style(),
        ),
    ])];
    for diag in &block.diagnostics {
        let (glyph, style) = match diag.severity {
            Severity::Error => ("✕", theme.error_style()),
            Severity::Warning => ("⚠", theme.warning_style()),
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{glyph} "), style),
            Span::styled(format!("{}:{} ", diag.line, diag.column), theme.muted_style()),
            Span::styled(diag.message.clone(), style),
        ]));
    }
    lines
}
