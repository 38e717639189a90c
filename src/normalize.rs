// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Document Normalizer
 * Pre-scan normalization for the context detection engine
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use std::borrow::Cow;

use tracing::debug;

use crate::boundary::Boundary;

/// Case-fold a document and its boundary for scanning.
///
/// Payload matching is case-insensitive by design: server-side filters
/// like upper-casing or title-casing a reflected value must not defeat
/// detection. Returns `None` when either marker is absent from the folded
/// document — the cheap short-circuit for the no-reflection case.
pub fn fold_document(html: &str, boundary: &Boundary) -> Option<(String, Boundary)> {
    let doc = html.to_lowercase();
    let folded = boundary.to_lowercase();

    if !doc.contains(folded.left()) || !doc.contains(folded.right()) {
        debug!("[Normalize] boundary markers absent, skipping analysis");
        return None;
    }

    Some((doc, folded))
}

/// Decode HTML entities (`&quot;`, `&#39;`, `&apos;`, ...) in a text
/// window. Used wherever parsed values are compared against raw source
/// bytes, e.g. locating an attribute value inside its tag text.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Double every backslash that precedes a quote character so a windowed
/// quote scan cannot be fooled into treating `\"` as a delimiter.
pub fn escape_quote_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '"' || next == '\'' || next == '`' {
                    out.push('\\');
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_document_present() {
        let b = Boundary::new("LEFT1", "RIGHT1");
        let (doc, folded) = fold_document("<p>left1xright1</p>", &b).unwrap();
        assert_eq!(doc, "<p>left1xright1</p>");
        assert_eq!(folded.left(), "left1");
        assert_eq!(folded.right(), "right1");
    }

    #[test]
    fn test_fold_document_absent() {
        let b = Boundary::new("aa1", "bb1");
        assert!(fold_document("<p>aa1 only</p>", &b).is_none());
        assert!(fold_document("<p>nothing</p>", &b).is_none());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("a=&quot;b&quot;"), "a=\"b\"");
        assert_eq!(decode_entities("&#39;x&#39;"), "'x'");
        assert_eq!(decode_entities("plain"), "plain");
    }

    #[test]
    fn test_escape_quote_breaks() {
        assert_eq!(escape_quote_breaks(r#"a\"b"#), r#"a\\"b"#);
        assert_eq!(escape_quote_breaks(r"a\'b"), r"a\\'b");
        assert_eq!(escape_quote_breaks(r"a\nb"), r"a\nb");
    }
}
