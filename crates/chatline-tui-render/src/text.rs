//! Text layout helpers shared by all message renderers.
//!
//! Widths are terminal display columns, not bytes or chars.

use once_cell::sync::Lazy;
use ratatui::text::{Line, Span};
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// CSI and OSC escape sequences.
static ANSI_ESCAPE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;?=<>]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").ok()
});

const ELLIPSIS: char = '…';

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Display width of a styled line.
pub fn line_width(line: &Line<'_>) -> usize {
    line.spans.iter().map(|s| display_width(&s.content)).sum()
}

/// Plain text of a styled line.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|s| s.content.as_ref()).collect()
}

/// Truncate to `max_width` columns, ending in `…` when anything was cut.
pub fn truncate_with_ellipsis(s: &str, max_width: usize) -> String {
    if display_width(s) <= max_width {
        return s.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut out = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        out.push(ch);
        width += w;
    }
    out.push(ELLIPSIS);
    out
}

/// Truncate a styled line to `max_width` columns, keeping span styles.
pub fn truncate_line(line: Line<'static>, max_width: usize) -> Line<'static> {
    if line_width(&line) <= max_width {
        return line;
    }
    let mut spans = Vec::new();
    let mut used = 0;
    for span in line.spans {
        let w = display_width(&span.content);
        if used + w < max_width {
            used += w;
            spans.push(span);
            continue;
        }
        let text = truncate_with_ellipsis(&format!("{}{}", span.content, ELLIPSIS), max_width - used);
        spans.push(Span::styled(text, span.style));
        break;
    }
    Line::from(spans)
}

/// Pad with trailing spaces to exactly `width` columns. Longer input is returned as is.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let current = display_width(s);
    if current >= width {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + width - current);
    out.push_str(s);
    out.extend(std::iter::repeat(' ').take(width - current));
    out
}

/// Center `label` in `width` columns, filling both sides with `fill`.
pub fn center_label(label: &str, width: usize, fill: char) -> String {
    let label_width = display_width(label);
    if label_width >= width {
        return truncate_with_ellipsis(label, width);
    }
    let left = (width - label_width) / 2;
    let right = width - label_width - left;
    let mut out = String::new();
    out.extend(std::iter::repeat(fill).take(left));
    out.push_str(label);
    out.extend(std::iter::repeat(fill).take(right));
    out
}

/// Human readable duration: `850ms`, `2.3s`, `1m 05s`.
pub fn format_duration(ms: u64) -> String {
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1_000.0)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// Convert `\r\n` and lone `\r` to `\n`.
pub fn normalize_line_endings(s: &str) -> String {
    if !s.contains('\r') {
        return s.to_string();
    }
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Replace tabs with spaces up to the next tab stop.
pub fn expand_tabs(s: &str, tab_width: usize) -> String {
    if !s.contains('\t') {
        return s.to_string();
    }
    let tab_width = tab_width.max(1);
    let mut out = String::with_capacity(s.len());
    let mut column = 0;
    for ch in s.chars() {
        match ch {
            '\t' => {
                let spaces = tab_width - column % tab_width;
                out.extend(std::iter::repeat(' ').take(spaces));
                column += spaces;
            }
            '\n' => {
                out.push(ch);
                column = 0;
            }
            _ => {
                out.push(ch);
                column += ch.width().unwrap_or(0);
            }
        }
    }
    out
}

/// Make tool output safe to draw.
///
/// ANSI escape sequences are removed. Other control characters, except
/// newline and tab, become visible control pictures (`␇`, `␀`, `␡`).
pub fn sanitize_for_display(text: &str) -> String {
    let stripped = match ANSI_ESCAPE.as_ref() {
        Some(re) if text.contains('\x1b') => re.replace_all(text, "").into_owned(),
        _ => text.to_string(),
    };

    if !stripped
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return stripped;
    }

    stripped
        .chars()
        .map(|c| match c {
            '\n' | '\t' => c,
            '\x7f' => '␡',
            c if (c as u32) < 0x20 => char::from_u32(0x2400 + c as u32).unwrap_or('?'),
            c if c.is_control() => '?',
            c => c,
        })
        .collect()
}

/// Word-wrap a styled line to `max_width` columns.
///
/// Breaks at spaces and keeps span styles. Words wider than the line are
/// split at character boundaries.
pub fn wrap_line(line: Line<'static>, max_width: usize) -> Vec<Line<'static>> {
    if max_width == 0 || line_width(&line) <= max_width {
        return vec![line];
    }

    let mut result: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for span in line.spans {
        let style = span.style;
        for piece in span.content.split_inclusive(' ') {
            let word = piece.trim_end_matches(' ');
            let spaces = &piece[word.len()..];
            let word_width = display_width(word);

            if current_width > 0 && current_width + word_width > max_width {
                result.push(Line::from(std::mem::take(&mut current)));
                current_width = 0;
            }

            if word_width > max_width {
                let mut chunk = String::new();
                let mut chunk_width = 0;
                for ch in word.chars() {
                    let w = ch.width().unwrap_or(0);
                    if chunk_width + w > max_width && !chunk.is_empty() {
                        result.push(Line::from(Span::styled(std::mem::take(&mut chunk), style)));
                        chunk_width = 0;
                    }
                    chunk.push(ch);
                    chunk_width += w;
                }
                current.push(Span::styled(chunk, style));
                current_width = chunk_width;
            } else if !word.is_empty() {
                current.push(Span::styled(word.to_string(), style));
                current_width += word_width;
            }

            // Spaces that would overflow are dropped at the break.
            let spaces_width = spaces.len();
            if spaces_width > 0 && current_width + spaces_width <= max_width {
                current.push(Span::styled(spaces.to_string(), style));
                current_width += spaces_width;
            }
        }
    }

    if !current.is_empty() {
        result.push(Line::from(current));
    }
    if result.is_empty() {
        result.push(Line::default());
    }
    result
}

/// Word-wrap plain text. Every input line yields at least one output line.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    text.split('\n')
        .flat_map(|raw| wrap_line(Line::raw(raw.to_string()), max_width))
        .map(|line| line_text(&line).trim_end().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::{Color, Style};

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 8), "hello w…");
        assert_eq!(truncate_with_ellipsis("hello", 0), "");
        assert_eq!(display_width(&truncate_with_ellipsis("日本語テキスト", 6)), 5);
    }

    #[test]
    fn test_truncate_line() {
        let red = Style::default().fg(Color::Red);
        let line = Line::from(vec![Span::raw("abc "), Span::styled("defghij", red)]);
        let cut = truncate_line(line, 7);
        assert_eq!(line_text(&cut), "abc de…");
        assert_eq!(cut.spans[1].style, red);
        let short = Line::from("ok");
        assert_eq!(truncate_line(short.clone(), 7), short);
    }

    #[test]
    fn test_pad_to_width() {
        assert_eq!(pad_to_width("ab", 4), "ab  ");
        assert_eq!(pad_to_width("abcdef", 4), "abcdef");
    }

    #[test]
    fn test_center_label() {
        assert_eq!(center_label(" x ", 9, '─'), "─── x ───");
        assert_eq!(center_label(" x ", 8, '─'), "── x ───");
        assert_eq!(display_width(&center_label("a long label", 4, '─')), 4);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(850), "850ms");
        assert_eq!(format_duration(2_345), "2.3s");
        assert_eq!(format_duration(65_000), "1m 05s");
    }

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tx", 4), "ab  x");
        assert_eq!(expand_tabs("a\n\tb", 2), "a\n  b");
    }

    #[test]
    fn test_sanitize_strips_ansi() {
        assert_eq!(sanitize_for_display("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(sanitize_for_display("\x1b]0;title\x07text"), "text");
    }

    #[test]
    fn test_sanitize_control_pictures() {
        assert_eq!(sanitize_for_display("a\x07b"), "a␇b");
        assert_eq!(sanitize_for_display("a\x00b\x7f"), "a␀b␡");
        assert_eq!(sanitize_for_display("keep\n\tthis"), "keep\n\tthis");
    }

    #[test]
    fn test_wrap_text_words() {
        let lines = wrap_text("hello world foo", 11);
        assert_eq!(lines, vec!["hello world", "foo"]);
    }

    #[test]
    fn test_wrap_text_long_word() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        let lines = wrap_text("a\n\nb", 10);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_wrap_line_keeps_styles() {
        let red = Style::default().fg(Color::Red);
        let line = Line::from(vec![
            Span::raw("plain words "),
            Span::styled("red words", red),
        ]);
        let wrapped = wrap_line(line, 12);
        assert_eq!(wrapped.len(), 2);
        assert!(wrapped[1].spans.iter().all(|s| s.style == red));
        for l in &wrapped {
            assert!(line_width(l) <= 12);
        }
    }

    #[test]
    fn test_wrap_line_fits() {
        let line = Line::from("short");
        assert_eq!(wrap_line(line.clone(), 10), vec![line]);
    }
}
