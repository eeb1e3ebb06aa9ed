//! Line-numbered file content, as produced by file-reading tools:
//!
//! ```text
//! 00001| fn main() {
//! 00002|     println!("hi");
//! ```

/// Longest numeric field accepted before the `|` separator.
const MAX_NUMBER_FIELD: usize = 7;

/// Split a `NNNNN| content` line into its number and content.
pub fn parse_numbered_line(line: &str) -> Option<(usize, &str)> {
    let sep = line.find('|')?;
    let field = &line[..sep];
    if field.len() > MAX_NUMBER_FIELD {
        return None;
    }
    let digits = field.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse().ok()?;

    let rest = &line[sep + 1..];
    let content = rest
        .strip_prefix(' ')
        .or_else(|| rest.strip_prefix('\t'))
        .unwrap_or(rest);
    Some((number, content))
}

/// True if the first non-blank line is numbered.
pub fn is_numbered_output(text: &str) -> bool {
    text.lines()
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| parse_numbered_line(line).is_some())
}
