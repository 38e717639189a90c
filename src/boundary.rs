// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Boundary Codec
 * Reversible encoding of payload occurrences for context detection
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::{debug, trace};

use crate::errors::{ContextError, Result};

/// Opaque single-token placeholder wrapped around each hex-encoded payload
/// occurrence before the document is tokenized, so marker bytes that happen
/// to look like markup cannot confuse the HTML pass.
///
/// Known limitation: if attacker-supplied text already contains this literal
/// token, decoding is best-effort (stray segments that are not valid hex are
/// re-emitted unchanged).
pub const DETECTOR_TOKEN: &str = "zz7detectorzz7";

/// A (left, right) marker pair used to locate one injected payload inside a
/// response body. Markers are short random alphanumeric strings generated by
/// the fuzzer at injection time; the engine only splits on exact substring
/// match and never validates uniqueness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    left: String,
    right: String,
}

impl Boundary {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &str {
        &self.right
    }

    /// Case-folded copy, matching the case-folded document it is scanned
    /// against.
    pub fn to_lowercase(&self) -> Boundary {
        Boundary {
            left: self.left.to_lowercase(),
            right: self.right.to_lowercase(),
        }
    }

    /// Replace every `left ... right` span in `text` (non-greedy: the first
    /// right marker after a left marker terminates the span) with
    /// `DETECTOR_TOKEN + hex(span) + DETECTOR_TOKEN`.
    ///
    /// A left marker with no following right marker is left as literal text:
    /// this models a server-side filter stripping half of the boundary, and
    /// such fragments must not produce contexts.
    pub fn encode(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(l) = rest.find(&self.left) {
            let after_left = l + self.left.len();
            match rest[after_left..].find(&self.right) {
                Some(r) => {
                    let end = after_left + r + self.right.len();
                    out.push_str(&rest[..l]);
                    out.push_str(DETECTOR_TOKEN);
                    out.push_str(&hex::encode(rest[l..end].as_bytes()));
                    out.push_str(DETECTOR_TOKEN);
                    rest = &rest[end..];
                }
                None => {
                    out.push_str(&rest[..after_left]);
                    rest = &rest[after_left..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Result of [`decode`]: the unique payload spans recovered (in document
/// order) and the reconstructed text with the original bytes restored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub spans: Vec<String>,
    pub text: String,
}

impl DecodedText {
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Inverse of [`Boundary::encode`]. Splits on the detector token and
/// hex-decodes the interior segments. A segment that fails hex or UTF-8
/// decoding (CodecDesync) is skipped: it is re-emitted literally, logged,
/// and the rest of the text still decodes.
pub fn decode(text: &str) -> DecodedText {
    if !text.contains(DETECTOR_TOKEN) {
        return DecodedText {
            spans: Vec::new(),
            text: text.to_string(),
        };
    }

    let mut spans: Vec<String> = Vec::new();
    let mut out = String::with_capacity(text.len());

    for (i, segment) in text.split(DETECTOR_TOKEN).enumerate() {
        if i % 2 == 0 {
            out.push_str(segment);
            continue;
        }
        match decode_span(segment) {
            Ok(span) => {
                trace!("[Codec] recovered span {:?}", span);
                if !spans.contains(&span) {
                    spans.push(span.clone());
                }
                out.push_str(&span);
            }
            Err(e) => {
                debug!("[Codec] skipping span: {}", e);
                out.push_str(segment);
            }
        }
    }

    DecodedText { spans, text: out }
}

/// Whether a token's text carries at least one encoded payload occurrence.
#[inline]
pub fn contains_detector(text: &str) -> bool {
    text.contains(DETECTOR_TOKEN)
}

fn decode_span(segment: &str) -> Result<String> {
    let bytes = hex::decode(segment).map_err(|e| ContextError::CodecDesync {
        segment: segment.to_string(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| ContextError::CodecDesync {
        segment: segment.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound() -> Boundary {
        Boundary::new("lmark", "rmark")
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let text = "<body>lmarkPAYLOADrmark</body>";
        let encoded = bound().encode(text);
        assert!(encoded.contains(DETECTOR_TOKEN));
        assert!(!encoded.contains("lmark"));

        let decoded = decode(&encoded);
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.spans, vec!["lmarkPAYLOADrmark".to_string()]);
    }

    #[test]
    fn test_round_trip_without_spans() {
        let text = "no markers here";
        let encoded = bound().encode(text);
        assert_eq!(encoded, text);
        assert_eq!(decode(&encoded).text, text);
    }

    #[test]
    fn test_half_stripped_boundary_left_literal() {
        // trailing left marker with no right marker stays as-is
        let text = "prefix lmark tail";
        let encoded = bound().encode(text);
        assert_eq!(encoded, text);
    }

    #[test]
    fn test_multiple_and_duplicate_spans() {
        let text = "lmarkArmark lmarkBrmark lmarkArmark";
        let decoded = decode(&bound().encode(text));
        assert_eq!(decoded.text, text);
        // unique spans, document order
        assert_eq!(
            decoded.spans,
            vec!["lmarkArmark".to_string(), "lmarkBrmark".to_string()]
        );
    }

    #[test]
    fn test_non_greedy_span_match() {
        // first right marker terminates the span
        let text = "lmarkXrmarkYrmark";
        let decoded = decode(&bound().encode(text));
        assert_eq!(decoded.spans, vec!["lmarkXrmark".to_string()]);
        assert_eq!(decoded.text, text);
    }

    #[test]
    fn test_desync_segment_skipped() {
        // stray detector tokens around a non-hex segment
        let text = format!("a{}nothex{}b", DETECTOR_TOKEN, DETECTOR_TOKEN);
        let decoded = decode(&text);
        assert!(decoded.spans.is_empty());
        assert_eq!(decoded.text, "anothexb");
    }

    #[test]
    fn test_unicode_payload_survives() {
        let text = "lmarkpäyload✓rmark";
        let decoded = decode(&bound().encode(text));
        assert_eq!(decoded.text, text);
        assert_eq!(decoded.spans, vec!["lmarkpäyload✓rmark".to_string()]);
    }
}
