//! Small text utilities shared by the indexing, selection and rendering stages.
//! All lengths are counted in `char`s, never bytes.

use std::collections::HashSet;

/// Lowercased whitespace-separated word set.
pub fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Returns the prefix of `text` holding at most `max_chars` characters.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// A second-level markdown heading: `## X` but not `### X`.
pub fn is_section_heading(line: &str) -> bool {
    line.starts_with("##") && !line.starts_with("###")
}

/// Heading text with every `#` removed, as headings are indexed.
pub fn heading_text(line: &str) -> String {
    line.replace('#', "").trim().to_string()
}

/// Strips leading/trailing bullet markers and spaces (`- `, `* `).
pub fn strip_bullet(line: &str) -> &str {
    line.trim_matches(|c| c == '-' || c == '*' || c == ' ')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_chars_respects_char_boundaries() {
        assert_eq!(take_chars("héllo", 2), "hé");
        assert_eq!(take_chars("abc", 10), "abc");
        assert_eq!(take_chars("abc", 0), "");
    }

    #[test]
    fn test_section_heading_is_exactly_two_markers() {
        assert!(is_section_heading("## Shop"));
        assert!(!is_section_heading("### Detail"));
        assert!(!is_section_heading("# Title"));
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("- Point one"), "Point one");
        assert_eq!(strip_bullet("* **bold**"), "bold");
    }
}
