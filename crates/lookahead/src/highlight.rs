//! Locating query matches inside candidate text, for emphasis when rendering.

use std::ops::Range;

/// Byte ranges of every case-insensitive occurrence of `query` in `text`.
///
/// Ranges are non-overlapping, ordered left to right and always fall on char
/// boundaries of `text`, so they can be used to slice it directly. A blank
/// query matches nothing.
pub fn match_ranges(text: &str, query: &str) -> Vec<Range<usize>> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    let mut ranges = Vec::new();
    let mut pos = 0;

    while let Some(ch) = text[pos..].chars().next() {
        match match_len(&text[pos..], &needle) {
            Some(len) => {
                ranges.push(pos..pos + len);
                pos += len;
            }
            None => pos += ch.len_utf8(),
        }
    }

    ranges
}

/// Length in bytes of the prefix of `haystack` that lowercases to `needle`.
fn match_len(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut matched = 0;

    for (offset, ch) in haystack.char_indices() {
        for lower in ch.to_lowercase() {
            // needle ran out in the middle of a multi-char lowercase mapping
            if matched == needle.len() || lower != needle[matched] {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(offset + ch.len_utf8());
        }
    }

    None
}

/// Split `text` into `(segment, is_match)` pieces covering the whole string.
pub fn segments<'a>(text: &'a str, query: &str) -> Vec<(&'a str, bool)> {
    let mut pieces = Vec::new();
    let mut cursor = 0;

    for range in match_ranges(text, query) {
        if range.start > cursor {
            pieces.push((&text[cursor..range.start], false));
        }
        pieces.push((&text[range.clone()], true));
        cursor = range.end;
    }
    if cursor < text.len() {
        pieces.push((&text[cursor..], false));
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_case_insensitive_matches() {
        assert_eq!(match_ranges("JavaScript", "java"), vec![0..4]);
        assert_eq!(match_ranges("Java and JAVA", "Java"), vec![0..4, 9..13]);
    }

    #[test]
    fn matches_do_not_overlap() {
        assert_eq!(match_ranges("aaaa", "aa"), vec![0..2, 2..4]);
        assert_eq!(match_ranges("banana", "ana"), vec![1..4]);
    }

    #[test]
    fn respects_char_boundaries() {
        assert_eq!(match_ranges("Ünïcode", "ünï"), vec![0..5]);
        assert_eq!(match_ranges("café au lait", "É"), vec![3..5]);
    }

    #[test]
    fn blank_query_highlights_nothing() {
        assert!(match_ranges("Rust", "").is_empty());
        assert!(match_ranges("Rust", "  ").is_empty());
        assert!(match_ranges("", "rust").is_empty());
    }

    #[test]
    fn segments_cover_the_text() {
        assert_eq!(
            segments("Node.js runtime", "js"),
            vec![("Node.", false), ("js", true), (" runtime", false)]
        );
        assert_eq!(segments("Vite", "x"), vec![("Vite", false)]);
    }
}
