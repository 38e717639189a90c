// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - String Scanning Helpers
 * Boundary-safe substring checks shared by the lexical analyzers
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

/// ECMAScript line terminators. `\n` and `\r` plus the two Unicode
/// separators U+2028 (LINE SEPARATOR) and U+2029 (PARAGRAPH SEPARATOR);
/// all four close a single-line comment.
#[inline]
pub fn is_js_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whether `haystack` contains `needle` starting exactly at byte `pos`.
/// Out-of-range or non-boundary positions simply answer `false`.
#[inline]
pub fn starts_at(haystack: &str, pos: usize, needle: &str) -> bool {
    pos <= haystack.len()
        && haystack.is_char_boundary(pos)
        && haystack[pos..].starts_with(needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_line_terminators() {
        assert!(is_js_line_terminator('\n'));
        assert!(is_js_line_terminator('\r'));
        assert!(is_js_line_terminator('\u{2028}'));
        assert!(is_js_line_terminator('\u{2029}'));
        assert!(!is_js_line_terminator(' '));
        assert!(!is_js_line_terminator('\t'));
    }

    #[test]
    fn test_starts_at() {
        assert!(starts_at("abcdef", 2, "cde"));
        assert!(!starts_at("abcdef", 2, "xyz"));
        assert!(!starts_at("abc", 10, "a"));
        // mid-char position on multibyte input must not panic
        assert!(!starts_at("äbc", 1, "b"));
    }
}
