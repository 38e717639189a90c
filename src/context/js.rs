// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - JavaScript Sub-Context Analyzer
 * Lexical state machine over script source for payload classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::trace;

use crate::boundary::Boundary;
use crate::context::{Context, ContextKind};
use crate::str_utils::{is_js_line_terminator, starts_at};

/// Mutually exclusive lexical states of the script scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JsState {
    Code,
    SingleQuoteString,
    DoubleQuoteString,
    SingleLineComment,
    MultiLineComment,
}

fn kind_for(state: JsState) -> ContextKind {
    match state {
        JsState::Code => ContextKind::ScriptExecutable,
        JsState::SingleQuoteString => ContextKind::ScriptSingleQuote,
        JsState::DoubleQuoteString => ContextKind::ScriptDoubleQuote,
        JsState::SingleLineComment => ContextKind::ScriptLineComment,
        JsState::MultiLineComment => ContextKind::ScriptMultiComment,
    }
}

/// Classify every payload occurrence inside a blob of script source.
///
/// `js_text` is a post-extraction slice (a `<script>` body, an inline
/// event-handler value, or the remainder of a `javascript:` URL), already
/// separated from surrounding HTML and with markers restored. Single
/// left-to-right pass; the enclosing state at the moment a marker span is
/// consumed decides its context variant. The span itself is skipped so the
/// injected bytes cannot perturb the machine.
pub fn get_js_context(js_text: &str, boundary: &Boundary) -> Vec<Context> {
    let mut contexts = Vec::new();
    let left = boundary.left();
    let right = boundary.right();
    if left.is_empty() || right.is_empty() || !js_text.contains(left) {
        return contexts;
    }

    let mut state = JsState::Code;
    let mut escaped = false;
    let mut i = 0;

    while i < js_text.len() {
        if starts_at(js_text, i, left) {
            if let Some(rel) = js_text[i + left.len()..].find(right) {
                let end = i + left.len() + rel + right.len();
                let span = &js_text[i..end];
                trace!("[JS] span {:?} in state {:?}", span, state);
                contexts.push(Context::new(kind_for(state), span, js_text, boundary));
                i = end;
                escaped = false;
                continue;
            }
            // half-stripped marker: plain code/text, scan on
        }

        let c = match js_text[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        let step = c.len_utf8();

        match state {
            JsState::Code => match c {
                '\'' => state = JsState::SingleQuoteString,
                '"' => state = JsState::DoubleQuoteString,
                '/' if starts_at(js_text, i, "//") => {
                    state = JsState::SingleLineComment;
                    i += 2;
                    continue;
                }
                '/' if starts_at(js_text, i, "/*") => {
                    state = JsState::MultiLineComment;
                    i += 2;
                    continue;
                }
                // JS tolerates the HTML comment opener as a line comment
                // for legacy inline-script embedding
                '<' if starts_at(js_text, i, "<!--") => {
                    state = JsState::SingleLineComment;
                    i += 4;
                    continue;
                }
                _ => {}
            },
            JsState::SingleQuoteString | JsState::DoubleQuoteString => {
                if escaped {
                    // covers \', \" and backslash-escaped line terminators
                    // (line continuation): the string state survives
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if (state == JsState::SingleQuoteString && c == '\'')
                    || (state == JsState::DoubleQuoteString && c == '"')
                {
                    state = JsState::Code;
                }
                // an unescaped line terminator does not exit the string:
                // unterminated strings stay "inside string" to end of input
            }
            JsState::SingleLineComment => {
                if is_js_line_terminator(c) {
                    state = JsState::Code;
                }
            }
            JsState::MultiLineComment => {
                if c == '*' && starts_at(js_text, i, "*/") {
                    state = JsState::Code;
                    i += 2;
                    continue;
                }
            }
        }

        i += step;
    }

    contexts
}
