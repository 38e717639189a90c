// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Injection Context Model
 * Context variants, break-out and executability rules
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::boundary::Boundary;
use crate::str_utils::is_js_line_terminator;

pub mod css;
pub mod html;
pub mod js;

pub use html::{get_context, resolve_quote, DelimiterKind};

/// Event-handler attributes whose value executes as script. Superset of
/// the classic on* handlers seen in the wild.
pub const JS_EVENT_ATTRIBUTES: &[&str] = &[
    "onclick",
    "onmouseover",
    "onmouseout",
    "onmouseenter",
    "onmouseleave",
    "onfocus",
    "onblur",
    "onload",
    "onerror",
    "onsubmit",
    "onchange",
    "oninput",
    "onkeydown",
    "onkeyup",
    "onkeypress",
    "ondblclick",
    "oncontextmenu",
    "onscroll",
    "onresize",
    "oncopy",
    "onpaste",
    "ondrag",
    "ondrop",
    "onanimationend",
    "ontouchstart",
    "ontouchmove",
    "ontouchend",
];

/// URL-valued attributes that execute a `javascript:`/`vbscript:` scheme.
pub const URI_SINK_ATTRIBUTES: &[&str] = &["href", "src", "background", "dynsrc", "lowsrc"];

/// Script scheme prefix, optionally preceded by whitespace. Values are
/// matched case-folded, but keep the pattern case-insensitive so direct
/// callers of the rule table get the same answer.
static SCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:javascript|vbscript)\s*:").expect("static pattern"));

/// Syntactic position classification for one payload occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContextKind {
    HtmlTag,
    HtmlTagClose,
    HtmlText,
    HtmlRawText,
    HtmlComment,
    HtmlAttrName,
    HtmlAttrSingleQuote,
    HtmlAttrDoubleQuote,
    HtmlAttrBacktick,
    HtmlAttrNoQuote,
    HtmlDeclaration,
    HtmlProcessingInstruction,
    /// Script body whose sub-analysis could not relocate the marker;
    /// verdicts delegate to the JS sub-analysis of the whole body.
    ScriptText,
    /// Style body counterpart of [`ContextKind::ScriptText`].
    CssText,
    ScriptExecutable,
    ScriptSingleQuote,
    ScriptDoubleQuote,
    ScriptLineComment,
    ScriptMultiComment,
    CssStyleText,
    CssComment,
    CssSingleQuote,
    CssDoubleQuote,
}

impl ContextKind {
    /// Stable, human-readable tag used for logging and regression tests.
    pub fn name(&self) -> &'static str {
        match self {
            ContextKind::HtmlTag => "HTML_TAG",
            ContextKind::HtmlTagClose => "HTML_TAG_CLOSE",
            ContextKind::HtmlText => "HTML_TEXT",
            ContextKind::HtmlRawText => "HTML_RAW_TEXT",
            ContextKind::HtmlComment => "HTML_COMMENT",
            ContextKind::HtmlAttrName => "HTML_ATTR_NAME",
            ContextKind::HtmlAttrSingleQuote => "HTML_ATTR_SINGLE_QUOTE",
            ContextKind::HtmlAttrDoubleQuote => "HTML_ATTR_DOUBLE_QUOTE",
            ContextKind::HtmlAttrBacktick => "HTML_ATTR_BACKTICK",
            ContextKind::HtmlAttrNoQuote => "HTML_ATTR_NO_QUOTE",
            ContextKind::HtmlDeclaration => "HTML_DECLARATION",
            ContextKind::HtmlProcessingInstruction => "HTML_PROCESSING_INSTRUCTION",
            ContextKind::ScriptText => "SCRIPT_TEXT",
            ContextKind::CssText => "CSS_TEXT",
            ContextKind::ScriptExecutable => "SCRIPT_EXECUTABLE",
            ContextKind::ScriptSingleQuote => "SCRIPT_SINGLE_QUOTE",
            ContextKind::ScriptDoubleQuote => "SCRIPT_DOUBLE_QUOTE",
            ContextKind::ScriptLineComment => "SCRIPT_LINE_COMMENT",
            ContextKind::ScriptMultiComment => "SCRIPT_MULTI_COMMENT",
            ContextKind::CssStyleText => "CSS_STYLE_TEXT",
            ContextKind::CssComment => "CSS_COMMENT",
            ContextKind::CssSingleQuote => "CSS_SINGLE_QUOTE",
            ContextKind::CssDoubleQuote => "CSS_DOUBLE_QUOTE",
        }
    }
}

/// One classified location in a document where a payload occurrence was
/// found, with enough surrounding text to evaluate break-out and
/// executability.
///
/// Contexts are immutable value objects: input text in, contexts out, no
/// shared state, so independent `get_context` calls are safe to run from
/// any number of threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    kind: ContextKind,
    /// The decoded injected span (left marker + injected text + right
    /// marker), case-folded. Folding is an intentional lossy step so
    /// server-side case mangling cannot defeat matching.
    payload: String,
    /// Raw text of the smallest enclosing structural unit with the
    /// occurrence still embedded, markers restored.
    content: String,
    boundary: Boundary,
    attr_name: Option<String>,
    attr_value: Option<String>,
}

/// Flat reporting record, serialized into scan output by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSummary {
    pub name: &'static str,
    pub can_break: bool,
    pub is_executable: bool,
}

impl Context {
    pub(crate) fn new(
        kind: ContextKind,
        payload: impl Into<String>,
        content: impl Into<String>,
        boundary: &Boundary,
    ) -> Self {
        Self {
            kind,
            payload: payload.into(),
            content: content.into(),
            boundary: boundary.clone(),
            attr_name: None,
            attr_value: None,
        }
    }

    pub(crate) fn with_attr(
        kind: ContextKind,
        payload: impl Into<String>,
        content: impl Into<String>,
        boundary: &Boundary,
        attr_name: impl Into<String>,
        attr_value: Option<String>,
    ) -> Self {
        Self {
            kind,
            payload: payload.into(),
            content: content.into(),
            boundary: boundary.clone(),
            attr_name: Some(attr_name.into()),
            attr_value,
        }
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn attr_name(&self) -> Option<&str> {
        self.attr_name.as_deref()
    }

    pub fn attr_value(&self) -> Option<&str> {
        self.attr_value.as_deref()
    }

    pub fn summary(&self) -> ContextSummary {
        ContextSummary {
            name: self.name(),
            can_break: self.can_break(),
            is_executable: self.is_executable(),
        }
    }

    /// Whether this payload can terminate the current syntactic context
    /// and open an attacker-controlled one.
    pub fn can_break(&self) -> bool {
        match self.kind {
            ContextKind::HtmlTag | ContextKind::HtmlTagClose => {
                self.payload.contains(' ') || self.payload.contains('>')
            }
            ContextKind::HtmlText => self.payload.contains('<'),
            // raw-text elements show literal text; reopening markup would
            // need the raw-text close tag, treated as unbreakable
            ContextKind::HtmlRawText => false,
            ContextKind::HtmlComment => self.payload.contains("-->"),
            ContextKind::HtmlAttrName => {
                self.payload.contains(' ') || self.payload.contains('=')
            }
            ContextKind::HtmlAttrNoQuote => self.payload.contains(' ') || self.sink_breaks(),
            ContextKind::HtmlAttrSingleQuote => {
                self.payload.contains('\'') || self.sink_breaks()
            }
            ContextKind::HtmlAttrDoubleQuote => {
                self.payload.contains('"') || self.sink_breaks()
            }
            ContextKind::HtmlAttrBacktick => self.payload.contains('`') || self.sink_breaks(),
            ContextKind::HtmlDeclaration | ContextKind::HtmlProcessingInstruction => {
                self.payload.contains('>')
            }
            ContextKind::ScriptText => {
                let subs = js::get_js_context(&self.content, &self.boundary);
                subs.iter().any(|c| c.is_executable() || c.can_break())
            }
            ContextKind::CssText => {
                let subs = css::get_css_context(&self.content, &self.boundary);
                subs.iter().any(|c| c.can_break())
            }
            ContextKind::ScriptExecutable => true,
            ContextKind::ScriptSingleQuote => self.payload.contains('\''),
            ContextKind::ScriptDoubleQuote => self.payload.contains('"'),
            ContextKind::ScriptLineComment => {
                self.payload.chars().any(is_js_line_terminator)
            }
            // the two characters anywhere, not necessarily adjacent: a
            // deliberate over-approximation, kept as-is
            ContextKind::ScriptMultiComment | ContextKind::CssComment => {
                self.payload.contains('/') && self.payload.contains('*')
            }
            ContextKind::CssStyleText => {
                self.payload.contains('<') && self.payload.contains('/')
            }
            ContextKind::CssSingleQuote => self.payload.contains('\''),
            ContextKind::CssDoubleQuote => self.payload.contains('"'),
        }
    }

    /// Whether the position already runs content as script without any
    /// break-out.
    pub fn is_executable(&self) -> bool {
        match self.kind {
            ContextKind::ScriptExecutable => true,
            ContextKind::ScriptText => {
                let subs = js::get_js_context(&self.content, &self.boundary);
                subs.iter().any(|c| c.is_executable())
            }
            ContextKind::HtmlAttrNoQuote
            | ContextKind::HtmlAttrSingleQuote
            | ContextKind::HtmlAttrDoubleQuote
            | ContextKind::HtmlAttrBacktick => self.sink_executable(),
            _ => false,
        }
    }

    /// JS sub-contexts for attribute values that reach a live script sink:
    /// event-handler attributes, and URL attributes carrying a
    /// `javascript:`/`vbscript:` scheme. `None` for plain attributes —
    /// a `javascript:` string inside e.g. `value=` is not a sink and must
    /// not be reported executable.
    fn sink_sub_contexts(&self) -> Option<Vec<Context>> {
        let name = self.attr_name.as_deref()?;
        let value = self.attr_value.as_deref()?;

        if JS_EVENT_ATTRIBUTES.contains(&name) {
            return Some(js::get_js_context(value, &self.boundary));
        }
        if URI_SINK_ATTRIBUTES.contains(&name) {
            let m = SCRIPT_SCHEME.find(value)?;
            return Some(js::get_js_context(&value[m.end()..], &self.boundary));
        }
        None
    }

    fn sink_executable(&self) -> bool {
        self.sink_sub_contexts()
            .is_some_and(|subs| subs.iter().any(|c| c.is_executable()))
    }

    /// Sink paths that escape the attribute without touching its quote:
    /// executable/breakable script sinks, or a `style` attribute whose CSS
    /// sub-analysis is breakable (style values never execute on their own).
    fn sink_breaks(&self) -> bool {
        if self.attr_name.as_deref() == Some("style") {
            if let Some(value) = self.attr_value.as_deref() {
                return css::get_css_context(value, &self.boundary)
                    .iter()
                    .any(|c| c.can_break());
            }
        }
        self.sink_sub_contexts()
            .is_some_and(|subs| subs.iter().any(|c| c.is_executable() || c.can_break()))
    }
}
