//! Color themes and render settings.
//!
//! Rendering never reaches for a global palette: the caller builds a
//! [`RenderContext`] and passes it into every render call.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Color theme for the message view.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Theme name.
    pub name: String,

    pub background: Color,
    /// Panel background (tool blocks).
    pub background_panel: Color,
    /// Element background (code blocks, diff columns).
    pub background_element: Color,

    pub text: Color,
    pub text_muted: Color,

    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub border: Color,
    /// Tool block border, kept subtle.
    pub tool_border: Color,

    pub diff_added_bg: Color,
    pub diff_removed_bg: Color,
    pub diff_added: Color,
    pub diff_removed: Color,

    pub syntax_comment: Color,
    pub syntax_keyword: Color,
    pub syntax_function: Color,
    pub syntax_variable: Color,
    pub syntax_string: Color,
    pub syntax_number: Color,
    pub syntax_type: Color,
    pub syntax_operator: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::chatline()
    }
}

impl Theme {
    /// Get a theme by name. Unknown names fall back to the default theme.
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "light" => Self::light(),
            "catppuccin" | "catppuccin-mocha" => Self::catppuccin_mocha(),
            _ => Self::chatline(),
        }
    }

    /// List available theme names.
    pub fn available() -> &'static [&'static str] {
        &["chatline", "light", "catppuccin"]
    }

    /// Default dark theme.
    pub fn chatline() -> Self {
        Self {
            name: "chatline".to_string(),

            background: Color::Rgb(12, 12, 14),
            background_panel: Color::Rgb(20, 20, 23),
            background_element: Color::Rgb(26, 26, 30),

            text: Color::Rgb(236, 236, 240),
            text_muted: Color::Rgb(124, 124, 134),

            primary: Color::Rgb(120, 200, 255),
            secondary: Color::Rgb(92, 156, 245),
            accent: Color::Rgb(190, 140, 240),

            success: Color::Rgb(120, 210, 140),
            warning: Color::Rgb(240, 180, 80),
            error: Color::Rgb(235, 100, 110),
            info: Color::Rgb(92, 156, 245),

            border: Color::Rgb(58, 58, 66),
            tool_border: Color::Rgb(44, 44, 50),

            diff_added_bg: Color::Rgb(26, 48, 36),
            diff_removed_bg: Color::Rgb(58, 30, 36),
            diff_added: Color::Rgb(120, 210, 140),
            diff_removed: Color::Rgb(235, 100, 110),

            syntax_comment: Color::Rgb(110, 110, 120),
            syntax_keyword: Color::Rgb(190, 140, 240),
            syntax_function: Color::Rgb(120, 200, 255),
            syntax_variable: Color::Rgb(235, 120, 120),
            syntax_string: Color::Rgb(150, 210, 130),
            syntax_number: Color::Rgb(240, 170, 100),
            syntax_type: Color::Rgb(230, 200, 120),
            syntax_operator: Color::Rgb(100, 200, 200),
        }
    }

    /// Light theme.
    pub fn light() -> Self {
        Self {
            name: "light".to_string(),

            background: Color::Rgb(255, 255, 255),
            background_panel: Color::Rgb(248, 248, 248),
            background_element: Color::Rgb(242, 242, 242),

            text: Color::Rgb(30, 30, 30),
            text_muted: Color::Rgb(120, 120, 120),

            primary: Color::Rgb(30, 110, 200),
            secondary: Color::Rgb(50, 100, 200),
            accent: Color::Rgb(130, 80, 180),

            success: Color::Rgb(40, 150, 70),
            warning: Color::Rgb(190, 120, 20),
            error: Color::Rgb(200, 60, 70),
            info: Color::Rgb(50, 100, 200),

            border: Color::Rgb(215, 215, 220),
            tool_border: Color::Rgb(205, 205, 210),

            diff_added_bg: Color::Rgb(220, 250, 225),
            diff_removed_bg: Color::Rgb(252, 222, 222),
            diff_added: Color::Rgb(40, 150, 70),
            diff_removed: Color::Rgb(200, 60, 70),

            syntax_comment: Color::Rgb(128, 128, 128),
            syntax_keyword: Color::Rgb(130, 80, 180),
            syntax_function: Color::Rgb(30, 110, 200),
            syntax_variable: Color::Rgb(200, 60, 70),
            syntax_string: Color::Rgb(40, 150, 70),
            syntax_number: Color::Rgb(190, 120, 20),
            syntax_type: Color::Rgb(170, 130, 40),
            syntax_operator: Color::Rgb(40, 130, 140),
        }
    }

    /// Catppuccin Mocha palette.
    pub fn catppuccin_mocha() -> Self {
        Self {
            name: "catppuccin".to_string(),

            background: Color::Rgb(30, 30, 46),         // base
            background_panel: Color::Rgb(24, 24, 37),   // mantle
            background_element: Color::Rgb(49, 50, 68), // surface0

            text: Color::Rgb(205, 214, 244),
            text_muted: Color::Rgb(127, 132, 156), // overlay1

            primary: Color::Rgb(137, 220, 235),   // sky
            secondary: Color::Rgb(137, 180, 250), // blue
            accent: Color::Rgb(203, 166, 247),    // mauve

            success: Color::Rgb(166, 227, 161),
            warning: Color::Rgb(249, 226, 175),
            error: Color::Rgb(243, 139, 168),
            info: Color::Rgb(137, 180, 250),

            border: Color::Rgb(69, 71, 90), // surface1
            tool_border: Color::Rgb(49, 50, 68),

            diff_added_bg: Color::Rgb(40, 60, 50),
            diff_removed_bg: Color::Rgb(60, 40, 50),
            diff_added: Color::Rgb(166, 227, 161),
            diff_removed: Color::Rgb(243, 139, 168),

            syntax_comment: Color::Rgb(127, 132, 156),
            syntax_keyword: Color::Rgb(203, 166, 247),
            syntax_function: Color::Rgb(137, 180, 250),
            syntax_variable: Color::Rgb(243, 139, 168),
            syntax_string: Color::Rgb(166, 227, 161),
            syntax_number: Color::Rgb(250, 179, 135),
            syntax_type: Color::Rgb(249, 226, 175),
            syntax_operator: Color::Rgb(148, 226, 213),
        }
    }

    // Style helpers

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn accent_style(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Style for the frame drawn around tool blocks.
    pub fn tool_border_style(&self) -> Style {
        Style::default().fg(self.tool_border)
    }

    /// Plain code on the element background.
    pub fn code_style(&self) -> Style {
        Style::default().fg(self.text).bg(self.background_element)
    }

    pub fn bold(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    pub fn user_style(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    /// Reasoning text, rendered dimmed.
    pub fn thinking_style(&self) -> Style {
        Style::default()
            .fg(self.text_muted)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn diff_added_style(&self) -> Style {
        Style::default().fg(self.diff_added).bg(self.diff_added_bg)
    }

    pub fn diff_removed_style(&self) -> Style {
        Style::default()
            .fg(self.diff_removed)
            .bg(self.diff_removed_bg)
    }

    pub fn diff_hunk_style(&self) -> Style {
        Style::default().fg(self.info)
    }
}

/// Settings that control layout thresholds and optional features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Enable syntax highlighting for code and numbered output.
    pub syntax_highlighting_enabled: bool,
    /// Render assistant prose as markdown instead of plain wrapped text.
    pub markdown_enabled: bool,
    /// Cap on the wrap width of assistant prose.
    pub max_text_width: u16,
    /// Tool output lines shown before truncating.
    pub tool_output_max_lines: usize,
    /// Reasoning lines shown while collapsed.
    pub thinking_visible_lines: usize,
    /// Context lines kept around each diff change.
    pub diff_context_lines: usize,
    /// Narrowest panel (diff column, tool body) before degrading.
    pub min_panel_width: u16,
    /// Narrowest line-number gutter.
    pub min_gutter_width: u16,
    pub tab_width: usize,
    /// Show a scroll percentage when content overflows.
    pub show_scroll_indicator: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            syntax_highlighting_enabled: true,
            markdown_enabled: true,
            max_text_width: 120,
            tool_output_max_lines: 10,
            thinking_visible_lines: 10,
            diff_context_lines: 3,
            min_panel_width: 20,
            min_gutter_width: 3,
            tab_width: 4,
            show_scroll_indicator: true,
        }
    }
}

impl RenderSettings {
    /// Settings for slow terminals: no highlighting.
    pub fn plain() -> Self {
        Self {
            syntax_highlighting_enabled: false,
            ..Self::default()
        }
    }
}

/// Styling context threaded through every render call.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    pub theme: Theme,
    pub settings: RenderSettings,
}

impl RenderContext {
    pub fn new(theme: Theme, settings: RenderSettings) -> Self {
        Self { theme, settings }
    }
}
