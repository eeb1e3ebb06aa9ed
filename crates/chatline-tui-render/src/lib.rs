//! Rendering utilities for the chatline message view.
//!
//! - Text layout helpers (wrap, truncate, pad, sanitize)
//! - Markdown rendering for assistant prose
//! - Syntax highlighting for code and numbered tool output
//! - Side-by-side diff pagination

pub mod diff;
pub mod markdown;
pub mod syntax;
pub mod text;

pub use diff::{count_changes, render_side_by_side, DiffLayout};
pub use markdown::render_markdown;
pub use syntax::{highlight_code, highlight_code_with_settings, language_from_path};
pub use text::{
    center_label, display_width, expand_tabs, format_duration, line_text, line_width,
    normalize_line_endings, pad_to_width, sanitize_for_display, truncate_line, truncate_with_ellipsis,
    wrap_line, wrap_text,
};
