// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - HTML Structural Analysis
 * Tokenizer-driven context detection over a reflected document
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::debug;

use crate::boundary::{contains_detector, decode, Boundary};
use crate::context::{css, js, Context, ContextKind};
use crate::normalize;
use crate::tokenizer::{Token, Tokenizer, PLAINTEXT_ELEMENT, RAW_TEXT_ELEMENTS};

/// Quoting style actually used around an attribute value in the source
/// bytes. The parsed value does not retain this, so it is re-resolved from
/// the raw tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterKind {
    Double,
    Single,
    Backtick,
    None,
}

impl DelimiterKind {
    fn into_kind(self) -> ContextKind {
        match self {
            DelimiterKind::Double => ContextKind::HtmlAttrDoubleQuote,
            DelimiterKind::Single => ContextKind::HtmlAttrSingleQuote,
            DelimiterKind::Backtick => ContextKind::HtmlAttrBacktick,
            DelimiterKind::None => ContextKind::HtmlAttrNoQuote,
        }
    }
}

/// Find every syntactic position where the boundary-marked payload
/// reappears in `html` and classify it.
///
/// Pure function: no I/O, no shared state, deterministic, safe to call
/// concurrently from independent threads. Malformed markup never raises;
/// analysis degrades to whatever contexts were found before the tokenizer
/// stopped. Contexts come back in document order.
pub fn get_context(html: &str, boundary: &Boundary) -> Vec<Context> {
    let Some((doc, boundary)) = normalize::fold_document(html, boundary) else {
        return Vec::new();
    };
    let encoded = boundary.encode(&doc);

    let mut contexts: Vec<Context> = Vec::new();
    let mut noscript_depth: usize = 0;
    // name of the raw-text element whose body the next text token carries
    let mut raw_element: Option<String> = None;

    let mut tokenizer = Tokenizer::new(&encoded);
    for token in tokenizer.by_ref() {
        match token {
            Token::StartTag {
                name,
                attrs,
                raw,
                self_closing,
            } => {
                raw_element = (!self_closing
                    && (RAW_TEXT_ELEMENTS.contains(&name.as_str()) || name == PLAINTEXT_ELEMENT))
                .then(|| name.clone());

                // browsers with scripting enabled never render a noscript
                // subtree, so nothing inside it is reportable; the subtree
                // is still tokenized to keep tag balance
                if name == "noscript" && !self_closing {
                    noscript_depth += 1;
                }
                if noscript_depth > 0 {
                    continue;
                }

                let raw_decoded = decode(raw).text;

                if contains_detector(&name) {
                    for span in decode(&name).spans {
                        contexts.push(Context::new(
                            ContextKind::HtmlTag,
                            span,
                            raw_decoded.clone(),
                            &boundary,
                        ));
                    }
                }

                for attr in &attrs {
                    if contains_detector(&attr.name) {
                        let d = decode(&attr.name);
                        for span in &d.spans {
                            contexts.push(Context::with_attr(
                                ContextKind::HtmlAttrName,
                                span.clone(),
                                raw_decoded.clone(),
                                &boundary,
                                d.text.clone(),
                                None,
                            ));
                        }
                    }

                    if let Some(value) = &attr.value {
                        if !contains_detector(value) {
                            continue;
                        }
                        let dv = decode(value);
                        let attr_name = decode(&attr.name).text;
                        let kind =
                            resolve_quote(&raw_decoded, &attr_name, &dv.text).into_kind();
                        for span in &dv.spans {
                            contexts.push(Context::with_attr(
                                kind,
                                span.clone(),
                                dv.text.clone(),
                                &boundary,
                                attr_name.clone(),
                                Some(dv.text.clone()),
                            ));
                        }
                    }
                }
            }

            Token::EndTag { name, raw } => {
                raw_element = None;
                if name == "noscript" {
                    noscript_depth = noscript_depth.saturating_sub(1);
                }
                if noscript_depth > 0 {
                    continue;
                }
                if contains_detector(&name) {
                    let content = decode(raw).text;
                    for span in decode(&name).spans {
                        contexts.push(Context::new(
                            ContextKind::HtmlTagClose,
                            span,
                            content.clone(),
                            &boundary,
                        ));
                    }
                }
            }

            Token::Text { text } => {
                if !contains_detector(text) || noscript_depth > 0 {
                    continue;
                }
                let d = decode(text);
                match raw_element.as_deref() {
                    Some("script") => {
                        let subs = js::get_js_context(&d.text, &boundary);
                        if subs.is_empty() {
                            // sub-analysis could not relocate the marker
                            // (codec desync inside the body); fall back to
                            // a delegating wrapper
                            for span in d.spans {
                                contexts.push(Context::new(
                                    ContextKind::ScriptText,
                                    span,
                                    d.text.clone(),
                                    &boundary,
                                ));
                            }
                        } else {
                            contexts.extend(subs);
                        }
                    }
                    Some("style") => {
                        let subs = css::get_css_context(&d.text, &boundary);
                        if subs.is_empty() {
                            for span in d.spans {
                                contexts.push(Context::new(
                                    ContextKind::CssText,
                                    span,
                                    d.text.clone(),
                                    &boundary,
                                ));
                            }
                        } else {
                            contexts.extend(subs);
                        }
                    }
                    Some(_) => {
                        for span in d.spans {
                            contexts.push(Context::new(
                                ContextKind::HtmlRawText,
                                span,
                                d.text.clone(),
                                &boundary,
                            ));
                        }
                    }
                    None => {
                        for span in d.spans {
                            contexts.push(Context::new(
                                ContextKind::HtmlText,
                                span,
                                d.text.clone(),
                                &boundary,
                            ));
                        }
                    }
                }
            }

            Token::Comment { text } => {
                if !contains_detector(text) || noscript_depth > 0 {
                    continue;
                }
                let d = decode(text);
                for span in d.spans {
                    contexts.push(Context::new(
                        ContextKind::HtmlComment,
                        span,
                        d.text.clone(),
                        &boundary,
                    ));
                }
            }

            Token::Declaration { text } => {
                if !contains_detector(text) || noscript_depth > 0 {
                    continue;
                }
                let d = decode(text);
                for span in d.spans {
                    contexts.push(Context::new(
                        ContextKind::HtmlDeclaration,
                        span,
                        d.text.clone(),
                        &boundary,
                    ));
                }
            }

            Token::ProcessingInstruction { text } => {
                if !contains_detector(text) || noscript_depth > 0 {
                    continue;
                }
                let d = decode(text);
                for span in d.spans {
                    contexts.push(Context::new(
                        ContextKind::HtmlProcessingInstruction,
                        span,
                        d.text.clone(),
                        &boundary,
                    ));
                }
            }
        }
    }

    if let Some(e) = tokenizer.error() {
        debug!("[Context] tokenizer stopped early: {} ({} contexts kept)", e, contexts.len());
    }

    contexts
}

/// Determine which quoting style was used around `attr_value` inside
/// `raw_tag` source text.
///
/// The raw tag is entity-unescaped first so `&quot;`/`&#39;` inside the
/// value cannot break the boundary match, and backslash-quote sequences
/// are neutralized on both sides of the comparison. When none of the three
/// quote styles matches, the value is classified unquoted — the silent,
/// conservative fallback, not an error. Double is checked before Single
/// before Backtick; the order decides ambiguous flanking.
pub fn resolve_quote(raw_tag: &str, attr_name: &str, attr_value: &str) -> DelimiterKind {
    let raw = normalize::escape_quote_breaks(&normalize::decode_entities(raw_tag));
    let value = normalize::escape_quote_breaks(attr_value);

    let candidates = [
        ('"', DelimiterKind::Double, value.as_str()),
        ('\'', DelimiterKind::Single, value.as_str()),
        // backtick values tokenize as unquoted with delimiters kept
        ('`', DelimiterKind::Backtick, value.trim_matches('`')),
    ];
    for (delim, kind, v) in candidates {
        let needle = format!("{}={}{}", attr_name, delim, v);
        if raw.contains(&needle) {
            return kind;
        }
    }
    DelimiterKind::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_double_quote() {
        let kind = resolve_quote(r#"<tag attr="val" />"#, "attr", "val");
        assert_eq!(kind, DelimiterKind::Double);
    }

    #[test]
    fn test_resolve_single_quote() {
        let kind = resolve_quote("<tag attr='val'>", "attr", "val");
        assert_eq!(kind, DelimiterKind::Single);
    }

    #[test]
    fn test_resolve_backtick() {
        let kind = resolve_quote("<tag attr=`val`>", "attr", "`val`");
        assert_eq!(kind, DelimiterKind::Backtick);
    }

    #[test]
    fn test_resolve_unquoted() {
        let kind = resolve_quote("<tag attr=val>", "attr", "val");
        assert_eq!(kind, DelimiterKind::None);
    }

    #[test]
    fn test_resolve_entity_escaped_quotes_in_value() {
        // raw still carries entities; parsed value is decoded
        let kind = resolve_quote(r#"<tag attr="a&quot;b">"#, "attr", "a\"b");
        assert_eq!(kind, DelimiterKind::Double);
    }

    #[test]
    fn test_resolve_unlocatable_value_falls_back_to_no_quote() {
        let kind = resolve_quote("<tag other=\"x\">", "attr", "val");
        assert_eq!(kind, DelimiterKind::None);
    }

    #[test]
    fn test_resolve_empty_value_prefers_double() {
        let kind = resolve_quote(r#"<tag attr="">"#, "attr", "");
        assert_eq!(kind, DelimiterKind::Double);
    }

    #[test]
    fn test_get_context_is_case_insensitive() {
        let b = Boundary::new("BoundL", "BoundR");
        let contexts = get_context("<p>BOUNDLxBOUNDR</p>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_TEXT");
        assert_eq!(contexts[0].payload(), "boundlxboundr");
    }

    #[test]
    fn test_get_context_empty_on_missing_marker() {
        let b = Boundary::new("boundl", "boundr");
        assert!(get_context("<p>boundl only</p>", &b).is_empty());
    }

    #[test]
    fn test_tag_name_context() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<boundlxboundr attr=1>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_TAG");
    }

    #[test]
    fn test_close_tag_name_context() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<div></boundlxboundr>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_TAG_CLOSE");
    }

    #[test]
    fn test_attr_name_context() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<div boundlxboundr=1>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_ATTR_NAME");
    }

    #[test]
    fn test_declaration_and_pi_contexts() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<!doctype boundlxboundr><?pi boundlyboundr ?>", &b);
        let names: Vec<_> = contexts.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["HTML_DECLARATION", "HTML_PROCESSING_INSTRUCTION"]);
    }

    #[test]
    fn test_raw_text_context() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<title>boundlxboundr</title>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_RAW_TEXT");
        assert!(!contexts[0].can_break());
    }

    #[test]
    fn test_two_spans_in_one_attribute() {
        let b = Boundary::new("boundl", "boundr");
        let html = r#"<a title="boundlXboundr and boundlYboundr">t</a>"#;
        let contexts = get_context(html, &b);
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts[0].payload(), "boundlxboundr");
        assert_eq!(contexts[1].payload(), "boundlyboundr");
        // shared enclosing unit
        assert_eq!(contexts[0].content(), contexts[1].content());
    }

    #[test]
    fn test_style_body_yields_css_contexts() {
        let b = Boundary::new("boundl", "boundr");
        let contexts = get_context("<style>p { c: boundlxboundr }</style>", &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "CSS_STYLE_TEXT");
    }

    #[test]
    fn test_malformed_tail_keeps_earlier_contexts() {
        let b = Boundary::new("boundl", "boundr");
        let html = "<p>boundlxboundr</p><a href=\"never closes";
        let contexts = get_context(html, &b);
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].name(), "HTML_TEXT");
    }
}
