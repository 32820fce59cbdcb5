// ABOUTME: Utility functions for snippets and word tokenization
// ABOUTME: Provides UTF-8 safe truncation shared by search and ranking

/// Truncates text to roughly `max_chars` bytes at a valid UTF-8 boundary,
/// appending an ellipsis marker when anything was cut off.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.len() <= max_chars {
        return text.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !text.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &text[..boundary])
}

/// Lowercased words of a title that carry meaning for overlap comparison.
/// Short words (length <= 3) are articles/prepositions and are ignored.
pub fn significant_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_short() {
        assert_eq!(snippet("hello", 100), "hello");
    }

    #[test]
    fn test_snippet_exact() {
        assert_eq!(snippet("hello", 5), "hello");
    }

    #[test]
    fn test_snippet_long() {
        let result = snippet("hello world", 7);
        assert!(result.starts_with("hello"));
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_snippet_utf8() {
        // Multi-byte UTF-8 characters - should not panic
        let text = "Hello 世界 World";
        let result = snippet(text, 10);
        assert!(!result.is_empty());
        assert!(result.len() <= 13); // 10 bytes + "..."
    }

    #[test]
    fn test_snippet_trims_whitespace() {
        assert_eq!(snippet("  hello  ", 100), "hello");
    }

    #[test]
    fn test_significant_words_filters_short() {
        let words = significant_words("Trip to the lake");
        assert_eq!(words, vec!["trip", "lake"]);
    }

    #[test]
    fn test_significant_words_lowercases() {
        let words = significant_words("Morning Run");
        assert_eq!(words, vec!["morning"]);
    }

    #[test]
    fn test_significant_words_empty() {
        assert!(significant_words("a to of").is_empty());
    }
}
