//! Syntax highlighting for code blocks and numbered tool output.
//!
//! Uses syntect for tokenizing and maps its palette onto the active theme.

use std::path::Path;

use chatline_tui_core::{RenderSettings, Theme};
use once_cell::sync::Lazy;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// Highlight `code`, producing exactly one line per `\n`-separated input line.
///
/// Any tokenizer failure degrades to plain text on the code background.
pub fn highlight_code(code: &str, language: &str, theme: &Theme) -> Vec<Line<'static>> {
    let syntect_theme = THEME_SET
        .themes
        .get("base16-eighties.dark")
        .or_else(|| THEME_SET.themes.get("base16-ocean.dark"));
    let Some(syntect_theme) = syntect_theme else {
        tracing::warn!("No syntect theme available, highlighting disabled");
        return plain_lines(code, theme);
    };

    let mut highlighter = HighlightLines::new(find_syntax(language), syntect_theme);
    let mut lines = Vec::new();

    for raw in code.split('\n') {
        let with_newline = format!("{raw}\n");
        match highlighter.highlight_line(&with_newline, &SYNTAX_SET) {
            Ok(ranges) => {
                let spans: Vec<Span<'static>> = ranges
                    .into_iter()
                    .filter_map(|(style, text)| {
                        let text = text.trim_end_matches('\n');
                        if text.is_empty() {
                            return None;
                        }
                        let mut ratatui_style = Style::default()
                            .fg(map_syntect_to_theme(style.foreground, theme))
                            .bg(theme.background_element);
                        if style.font_style.contains(FontStyle::BOLD) {
                            ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
                        }
                        if style.font_style.contains(FontStyle::ITALIC) {
                            ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
                        }
                        Some(Span::styled(text.to_string(), ratatui_style))
                    })
                    .collect();
                lines.push(Line::from(spans));
            }
            Err(e) => {
                tracing::warn!(error = %e, language, "Syntax highlighting failed");
                lines.push(Line::from(Span::styled(raw.to_string(), theme.code_style())));
            }
        }
    }

    lines
}

/// Highlight when enabled in `settings`, otherwise plain code lines.
pub fn highlight_code_with_settings(
    code: &str,
    language: &str,
    theme: &Theme,
    settings: &RenderSettings,
) -> Vec<Line<'static>> {
    if !settings.syntax_highlighting_enabled {
        return plain_lines(code, theme);
    }
    highlight_code(code, language, theme)
}

fn plain_lines(code: &str, theme: &Theme) -> Vec<Line<'static>> {
    code.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), theme.code_style())))
        .collect()
}

fn find_syntax(language: &str) -> &'static SyntaxReference {
    let lang_lower = language.to_lowercase();
    SYNTAX_SET
        .find_syntax_by_token(language)
        .or_else(|| SYNTAX_SET.find_syntax_by_extension(&lang_lower))
        .or_else(|| {
            let name = match lang_lower.as_str() {
                "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" => "JavaScript",
                "py" | "python3" => "Python",
                "rb" => "Ruby",
                "rs" => "Rust",
                "sh" | "bash" | "shell" | "zsh" => "Bourne Again Shell (bash)",
                "yml" => "YAML",
                "md" => "Markdown",
                "cpp" | "cc" | "hpp" => "C++",
                "cs" | "csharp" => "C#",
                "kt" | "kts" => "Java",
                _ => language,
            };
            SYNTAX_SET.find_syntax_by_name(name)
        })
        .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text())
}

/// Guess a highlighting language from a file path.
///
/// Returns the extension (or a well-known file name) lowercased, which
/// [`highlight_code`] resolves against its syntax set.
pub fn language_from_path(path: &str) -> Option<String> {
    let path = Path::new(path);
    let file_name = path.file_name()?.to_str()?;
    match file_name {
        "Dockerfile" => return Some("dockerfile".to_string()),
        "Makefile" | "makefile" => return Some("makefile".to_string()),
        _ => {}
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Map base16-eighties colors to the theme's syntax palette.
fn map_syntect_to_theme(color: syntect::highlighting::Color, theme: &Theme) -> Color {
    let (r, g, b) = (color.r, color.g, color.b);

    if is_gray(r, g, b) && r < 180 {
        return theme.syntax_comment;
    }
    if r > 200 && g > 200 && b > 200 {
        return theme.text;
    }
    if r > 200 && g < 140 && b < 160 {
        return theme.syntax_variable;
    }
    if r > 220 && g > 120 && g < 180 && b < 120 {
        return theme.syntax_number;
    }
    if r > 220 && g > 180 && b < 140 {
        return theme.syntax_type;
    }
    if g > 170 && r < 180 && b < 180 {
        return theme.syntax_string;
    }
    if g > 180 && b > 180 && r < 140 {
        return theme.syntax_operator;
    }
    if b > 170 && r < 140 && g > 120 && g < 180 {
        return theme.syntax_function;
    }
    if r > 170 && b > 170 && g < 170 {
        return theme.syntax_keyword;
    }
    theme.text
}

fn is_gray(r: u8, g: u8, b: u8) -> bool {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    (max - min) < 25
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::line_text;

    #[test]
    fn test_highlight_preserves_text() {
        let theme = Theme::default();
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let lines = highlight_code(code, "rust", &theme);
        assert_eq!(lines.len(), 3);
        assert_eq!(line_text(&lines[1]), "    println!(\"hi\");");
    }

    #[test]
    fn test_highlight_one_line_per_input_line() {
        let theme = Theme::default();
        let lines = highlight_code("a\n\nb\n", "txt", &theme);
        assert_eq!(lines.len(), 4);
        assert_eq!(line_text(&lines[3]), "");
    }

    #[test]
    fn test_unknown_language_falls_back_to_plain() {
        let theme = Theme::default();
        let lines = highlight_code("some text", "no-such-language", &theme);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "some text");
    }

    #[test]
    fn test_highlighting_disabled() {
        let theme = Theme::default();
        let lines =
            highlight_code_with_settings("let x = 1;", "rs", &theme, &RenderSettings::plain());
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].style, theme.code_style());
    }

    #[test]
    fn test_language_from_path() {
        assert_eq!(language_from_path("src/main.rs").as_deref(), Some("rs"));
        assert_eq!(language_from_path("/a/b/App.TSX").as_deref(), Some("tsx"));
        assert_eq!(language_from_path("Dockerfile").as_deref(), Some("dockerfile"));
        assert_eq!(language_from_path("README"), None);
    }
}
