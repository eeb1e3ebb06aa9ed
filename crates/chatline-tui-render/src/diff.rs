//! Side-by-side diff rendering.
//!
//! The line diff comes from `similar`; this module groups it into hunks,
//! pairs deleted and inserted runs row by row, and lays the result out as
//! two fixed-width columns.

use chatline_tui_core::{RenderSettings, Theme};
use ratatui::text::{Line, Span};
use similar::{DiffOp, DiffTag, TextDiff};

use crate::text::{display_width, expand_tabs, normalize_line_endings, pad_to_width, truncate_with_ellipsis};

/// Glyph between the two columns.
pub const DIVIDER: &str = "│";

/// Placeholder shown on both sides between hunks.
pub const HUNK_SEPARATOR: &str = "⋯";

/// Geometry of a side-by-side diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLayout {
    /// Total available width in columns.
    pub width: usize,
    /// Unchanged lines kept around each change.
    pub context: usize,
    pub min_column_width: usize,
    pub min_gutter_width: usize,
    pub tab_width: usize,
}

impl DiffLayout {
    pub fn new(width: usize, settings: &RenderSettings) -> Self {
        Self {
            width,
            context: settings.diff_context_lines,
            min_column_width: settings.min_panel_width as usize,
            min_gutter_width: settings.min_gutter_width as usize,
            tab_width: settings.tab_width,
        }
    }

    /// Width of each column: half of what remains after the divider.
    pub fn column_width(&self) -> usize {
        (self.width.saturating_sub(display_width(DIVIDER)) / 2).max(self.min_column_width)
    }
}

#[derive(Debug, Clone, Copy)]
enum Cell<'a> {
    Context(usize, &'a str),
    Changed(usize, &'a str),
    Blank,
}

#[derive(Debug)]
enum Row<'a> {
    Pair(Cell<'a>, Cell<'a>),
    Separator,
}

/// Terminate the last line so `"b"` and `"b\n"` compare equal.
fn terminate_last_line(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// Count (additions, deletions) between two texts.
pub fn count_changes(before: &str, after: &str) -> (usize, usize) {
    let before = terminate_last_line(normalize_line_endings(before));
    let after = terminate_last_line(normalize_line_endings(after));
    let diff = TextDiff::from_lines(before.as_str(), after.as_str());
    diff.ops().iter().fold((0, 0), |(add, del), op| match op.tag() {
        DiffTag::Equal => (add, del),
        DiffTag::Delete => (add, del + op.old_range().len()),
        DiffTag::Insert => (add + op.new_range().len(), del),
        DiffTag::Replace => (add + op.new_range().len(), del + op.old_range().len()),
    })
}

/// Render `before` and `after` as two aligned columns.
///
/// Identical inputs produce no lines.
pub fn render_side_by_side(
    before: &str,
    after: &str,
    layout: &DiffLayout,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let before = terminate_last_line(expand_tabs(&normalize_line_endings(before), layout.tab_width));
    let after = terminate_last_line(expand_tabs(&normalize_line_endings(after), layout.tab_width));

    let diff = TextDiff::from_lines(before.as_str(), after.as_str());
    let groups: Vec<Vec<DiffOp>> = diff
        .grouped_ops(layout.context)
        .into_iter()
        .filter(|group| group.iter().any(|op| op.tag() != DiffTag::Equal))
        .collect();
    if groups.is_empty() {
        return Vec::new();
    }

    let old_lines: Vec<&str> = diff
        .old_slices()
        .iter()
        .map(|s| s.trim_end_matches('\n'))
        .collect();
    let new_lines: Vec<&str> = diff
        .new_slices()
        .iter()
        .map(|s| s.trim_end_matches('\n'))
        .collect();

    let max_line_number = groups
        .iter()
        .flatten()
        .map(|op| op.old_range().end.max(op.new_range().end))
        .max()
        .unwrap_or(0);
    let gutter_width = max_line_number
        .to_string()
        .len()
        .max(layout.min_gutter_width);

    let mut rows = Vec::new();
    for (i, group) in groups.iter().enumerate() {
        if i > 0 {
            rows.push(Row::Separator);
        }
        pair_group(group, &old_lines, &new_lines, &mut rows);
    }

    let column_width = layout.column_width();
    rows.iter()
        .map(|row| render_row(row, column_width, gutter_width, theme))
        .collect()
}

/// Equal lines go straight through; delete and insert runs between them are
/// zipped into rows, padding the shorter run with blanks.
fn pair_group<'a>(group: &[DiffOp], old: &[&'a str], new: &[&'a str], rows: &mut Vec<Row<'a>>) {
    let mut deletes: Vec<usize> = Vec::new();
    let mut inserts: Vec<usize> = Vec::new();

    for op in group {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                flush_changes(&mut deletes, &mut inserts, old, new, rows);
                for (o, n) in old_range.zip(new_range) {
                    rows.push(Row::Pair(
                        Cell::Context(o + 1, line_at(old, o)),
                        Cell::Context(n + 1, line_at(new, n)),
                    ));
                }
            }
            DiffTag::Delete => deletes.extend(old_range),
            DiffTag::Insert => inserts.extend(new_range),
            DiffTag::Replace => {
                deletes.extend(old_range);
                inserts.extend(new_range);
            }
        }
    }
    flush_changes(&mut deletes, &mut inserts, old, new, rows);
}

fn flush_changes<'a>(
    deletes: &mut Vec<usize>,
    inserts: &mut Vec<usize>,
    old: &[&'a str],
    new: &[&'a str],
    rows: &mut Vec<Row<'a>>,
) {
    let count = deletes.len().max(inserts.len());
    for i in 0..count {
        let left = deletes
            .get(i)
            .map_or(Cell::Blank, |&o| Cell::Changed(o + 1, line_at(old, o)));
        let right = inserts
            .get(i)
            .map_or(Cell::Blank, |&n| Cell::Changed(n + 1, line_at(new, n)));
        rows.push(Row::Pair(left, right));
    }
    deletes.clear();
    inserts.clear();
}

fn line_at<'a>(lines: &[&'a str], index: usize) -> &'a str {
    lines.get(index).copied().unwrap_or("")
}

fn render_row(row: &Row<'_>, column_width: usize, gutter_width: usize, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(5);
    match row {
        Row::Pair(left, right) => {
            push_cell(&mut spans, left, false, column_width, gutter_width, theme);
            spans.push(Span::styled(DIVIDER, theme.border_style()));
            push_cell(&mut spans, right, true, column_width, gutter_width, theme);
        }
        Row::Separator => {
            let placeholder = pad_to_width(
                &format!("{:>gutter_width$}", HUNK_SEPARATOR),
                column_width,
            );
            spans.push(Span::styled(placeholder.clone(), theme.diff_hunk_style()));
            spans.push(Span::styled(DIVIDER, theme.border_style()));
            spans.push(Span::styled(placeholder, theme.diff_hunk_style()));
        }
    }
    Line::from(spans)
}

fn push_cell(
    spans: &mut Vec<Span<'static>>,
    cell: &Cell<'_>,
    is_new: bool,
    column_width: usize,
    gutter_width: usize,
    theme: &Theme,
) {
    let content_width = column_width.saturating_sub(gutter_width + 1).max(1);
    let (number, text, style) = match *cell {
        Cell::Blank => {
            spans.push(Span::raw(" ".repeat(column_width)));
            return;
        }
        Cell::Context(n, text) => (n, text, theme.text_style()),
        Cell::Changed(n, text) if is_new => (n, text, theme.diff_added_style()),
        Cell::Changed(n, text) => (n, text, theme.diff_removed_style()),
    };

    spans.push(Span::styled(
        format!("{number:>gutter_width$} "),
        theme.muted_style(),
    ));
    spans.push(Span::styled(
        pad_to_width(&truncate_with_ellipsis(text, content_width), content_width),
        style,
    ));
}
