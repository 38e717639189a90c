// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - CSS Sub-Context Analyzer
 * Lexical state machine over stylesheet text for payload classification
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::trace;

use crate::boundary::Boundary;
use crate::context::{Context, ContextKind};
use crate::str_utils::starts_at;

/// CSS has no single-line comment syntax, so the machine is smaller than
/// its JavaScript counterpart: text, one comment kind, quoted strings with
/// a remembered delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CssState {
    Text,
    Comment,
    SingleQuoteString,
    DoubleQuoteString,
}

fn kind_for(state: CssState) -> ContextKind {
    match state {
        CssState::Text => ContextKind::CssStyleText,
        CssState::Comment => ContextKind::CssComment,
        CssState::SingleQuoteString => ContextKind::CssSingleQuote,
        CssState::DoubleQuoteString => ContextKind::CssDoubleQuote,
    }
}

/// Classify every payload occurrence inside a blob of CSS (a `<style>`
/// body or a `style` attribute value, markers restored). Same single-pass
/// shape as the JS analyzer.
pub fn get_css_context(css_text: &str, boundary: &Boundary) -> Vec<Context> {
    let mut contexts = Vec::new();
    let left = boundary.left();
    let right = boundary.right();
    if left.is_empty() || right.is_empty() || !css_text.contains(left) {
        return contexts;
    }

    let mut state = CssState::Text;
    let mut escaped = false;
    let mut i = 0;

    while i < css_text.len() {
        if starts_at(css_text, i, left) {
            if let Some(rel) = css_text[i + left.len()..].find(right) {
                let end = i + left.len() + rel + right.len();
                let span = &css_text[i..end];
                trace!("[CSS] span {:?} in state {:?}", span, state);
                contexts.push(Context::new(kind_for(state), span, css_text, boundary));
                i = end;
                escaped = false;
                continue;
            }
        }

        let c = match css_text[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        let step = c.len_utf8();

        match state {
            CssState::Text => match c {
                '/' if starts_at(css_text, i, "/*") => {
                    state = CssState::Comment;
                    i += 2;
                    continue;
                }
                '\'' => state = CssState::SingleQuoteString,
                '"' => state = CssState::DoubleQuoteString,
                _ => {}
            },
            CssState::Comment => {
                if c == '*' && starts_at(css_text, i, "*/") {
                    state = CssState::Text;
                    i += 2;
                    continue;
                }
            }
            CssState::SingleQuoteString | CssState::DoubleQuoteString => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if (state == CssState::SingleQuoteString && c == '\'')
                    || (state == CssState::DoubleQuoteString && c == '"')
                {
                    state = CssState::Text;
                }
            }
        }

        i += step;
    }

    contexts
}
