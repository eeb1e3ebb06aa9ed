//! Compiler/LSP diagnostics embedded in tool output.
//!
//! ```text
//! <file_diagnostics file="src/lib.rs">
//! ERROR [12:5] cannot find value `x` in this scope
//! WARNING [3:1] unused import
//! </file_diagnostics>
//! ```

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static OPEN_TAG: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"<([A-Za-z_][\w-]*)\s+file="([^"]*)"\s*>"#).ok());

static ENTRY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^\s*(ERROR|WARNING)\s*\[(\d+):(\d+)\]\s*(.*)$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// A parsed diagnostics block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsBlock {
    pub file: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Byte range of the whole block, tags included, in the source text.
    pub span: Range<usize>,
}

impl DiagnosticsBlock {
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.len() - self.error_count()
    }
}

/// Find and parse the first diagnostics block in `text`.
///
/// Returns `None` when there is no block, when its closing tag is missing,
/// or when it holds no recognizable entries.
pub fn parse_diagnostics(text: &str) -> Option<DiagnosticsBlock> {
    let open_tag = OPEN_TAG.as_ref()?;
    let entry = ENTRY.as_ref()?;

    let captures = open_tag.captures(text)?;
    let whole = captures.get(0)?;
    let tag = captures.get(1)?.as_str();
    let file = captures.get(2)?.as_str().to_string();

    let close = format!("</{tag}>");
    let Some(close_offset) = text[whole.end()..].find(&close) else {
        tracing::warn!(tag, file = %file, "Diagnostics block without closing tag");
        return None;
    };
    let body_end = whole.end() + close_offset;
    let body = &text[whole.end()..body_end];

    let diagnostics: Vec<Diagnostic> = body
        .lines()
        .filter_map(|line| {
            let caps = entry.captures(line)?;
            let severity = match &caps[1] {
                "ERROR" => Severity::Error,
                _ => Severity::Warning,
            };
            Some(Diagnostic {
                severity,
                line: caps[2].parse().ok()?,
                column: caps[3].parse().ok()?,
                message: caps[4].trim().to_string(),
            })
        })
        .collect();

    if diagnostics.is_empty() {
        return None;
    }

    Some(DiagnosticsBlock {
        file,
        diagnostics,
        span: whole.start()..body_end + close.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Edit applied.\n<file_diagnostics file=\"src/lib.rs\">\nERROR [12:5] cannot find value `x`\nWARNING [3:1] unused import\n</file_diagnostics>\n";

    #[test]
    fn test_parse_block() {
        let block = parse_diagnostics(SAMPLE).unwrap();
        assert_eq!(block.file, "src/lib.rs");
        assert_eq!(block.diagnostics.len(), 2);
        assert_eq!(
            block.diagnostics[0],
            Diagnostic {
                severity: Severity::Error,
                line: 12,
                column: 5,
                message: "cannot find value `x`".to_string(),
            }
        );
        assert_eq!(block.diagnostics[1].severity, Severity::Warning);
        assert_eq!(block.error_count(), 1);
        assert_eq!(block.warning_count(), 1);
    }

    #[test]
    fn test_span_covers_tags() {
        let block = parse_diagnostics(SAMPLE).unwrap();
        let covered = &SAMPLE[block.span.clone()];
        assert!(covered.starts_with("<file_diagnostics"));
        assert!(covered.ends_with("</file_diagnostics>"));
        assert_eq!(&SAMPLE[..block.span.start], "Edit applied.\n");
    }

    #[test]
    fn test_missing_close_tag() {
        let text = "<diagnostics file=\"a.rs\">\nERROR [1:1] broken\n";
        assert!(parse_diagnostics(text).is_none());
    }

    #[test]
    fn test_empty_body() {
        let text = "<diagnostics file=\"a.rs\">\n\n</diagnostics>";
        assert!(parse_diagnostics(text).is_none());
    }

    #[test]
    fn test_no_block() {
        assert!(parse_diagnostics("plain output").is_none());
    }

    #[test]
    fn test_ignores_unrecognized_lines() {
        let text = "<d file=\"x.py\">\nnote: something\nWARNING [2:4] shadowed\n</d>";
        let block = parse_diagnostics(text).unwrap();
        assert_eq!(block.diagnostics.len(), 1);
        assert_eq!(block.diagnostics[0].line, 2);
    }
}
