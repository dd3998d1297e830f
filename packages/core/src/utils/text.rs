//! Plain-text helpers shared by export and naming.

use regex::Regex;
use std::sync::LazyLock;

/// Compiled regex for whitespace normalization
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapse every whitespace run to a single space and trim the ends
///
/// # Examples
///
/// ```
/// use unfold_core::utils::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// First `max` characters of `text` (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("   "), "");
        assert_eq!(normalize_whitespace("one\u{a0} two"), "one two");
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
