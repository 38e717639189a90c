// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Lenient HTML Tokenizer
 * Single-pass, standards-lenient tokenizer for context detection
 *
 * Pages in the wild are frequently malformed: unclosed tags, bad nesting,
 * quotes that never terminate. The tokenizer never panics on any input;
 * it degrades to partial tokens and lets the driver decide what to do
 * with whatever was produced before the stream stopped.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use tracing::trace;

use crate::errors::ContextError;
use crate::normalize;

/// Elements whose content is not parsed as nested markup. Their body runs
/// to the matching close tag (HTML5 rawtext/RCDATA rules, collapsed: the
/// engine never needs the RCDATA/rawtext distinction).
pub const RAW_TEXT_ELEMENTS: &[&str] = &["title", "textarea", "style", "script", "xmp", "listing"];

/// `<plaintext>` swallows everything to end of input.
pub const PLAINTEXT_ELEMENT: &str = "plaintext";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    /// Entity-decoded value; `None` for bare attributes (`<input disabled>`).
    pub value: Option<String>,
}

/// One structural unit of the document. Raw slices point into the input so
/// delimiter resolution can inspect the original source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        raw: &'a str,
        self_closing: bool,
    },
    EndTag {
        name: String,
        raw: &'a str,
    },
    Text {
        text: &'a str,
    },
    Comment {
        text: &'a str,
    },
    Declaration {
        text: &'a str,
    },
    ProcessingInstruction {
        text: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RawMode {
    None,
    /// Inside a raw-text element; holds the element name we wait for.
    Element(String),
    Plaintext,
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    raw: RawMode,
    error: Option<ContextError>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw: RawMode::None,
            error: None,
        }
    }

    /// The recoverable error that stopped the stream, if any. Tokens
    /// produced before it are valid.
    pub fn error(&self) -> Option<&ContextError> {
        self.error.as_ref()
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn emit_raw_text(&mut self, close_name: &str) -> Option<Token<'a>> {
        let rest = self.rest();
        let close = format!("</{}", close_name);
        match rest.find(&close) {
            Some(0) => {
                self.raw = RawMode::None;
                self.next_structural()
            }
            Some(idx) => {
                let text = &rest[..idx];
                self.pos += idx;
                self.raw = RawMode::None;
                Some(Token::Text { text })
            }
            None => {
                self.pos = self.input.len();
                self.raw = RawMode::None;
                Some(Token::Text { text: rest })
            }
        }
    }

    fn next_structural(&mut self) -> Option<Token<'a>> {
        let rest = self.rest();
        if rest.is_empty() {
            return None;
        }

        if !rest.starts_with('<') {
            return Some(self.emit_text());
        }

        if rest.starts_with("<!--") {
            return Some(self.emit_comment());
        }
        if rest.starts_with("<!") {
            return Some(self.emit_until_gt(2, TokenKind::Declaration));
        }
        if rest.starts_with("<?") {
            return Some(self.emit_until_gt(2, TokenKind::ProcessingInstruction));
        }
        if rest.starts_with("</") {
            return Some(self.emit_end_tag());
        }

        let mut chars = rest.chars();
        chars.next(); // '<'
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() => Some(self.emit_start_tag()),
            // lone or junk '<' is character data
            _ => Some(self.emit_text()),
        }
    }

    /// Text runs to the next `<` that could open markup (or to EOF).
    fn emit_text(&mut self) -> Token<'a> {
        let rest = self.rest();
        // skip a leading '<' that failed to open a construct
        let search_from = usize::from(rest.starts_with('<'));
        let end = rest[search_from..]
            .find('<')
            .map(|i| i + search_from)
            .unwrap_or(rest.len());
        self.pos += end;
        Token::Text { text: &rest[..end] }
    }

    fn emit_comment(&mut self) -> Token<'a> {
        let rest = self.rest();
        match rest[4..].find("-->") {
            Some(i) => {
                let text = &rest[4..4 + i];
                self.pos += 4 + i + 3;
                Token::Comment { text }
            }
            None => {
                // unterminated comment swallows the rest of the document,
                // exactly as a browser would
                self.pos = self.input.len();
                Token::Comment { text: &rest[4..] }
            }
        }
    }

    fn emit_until_gt(&mut self, skip: usize, kind: TokenKind) -> Token<'a> {
        let rest = self.rest();
        let (text, consumed) = match rest[skip..].find('>') {
            Some(i) => (&rest[skip..skip + i], skip + i + 1),
            None => (&rest[skip..], rest.len()),
        };
        self.pos += consumed;
        match kind {
            TokenKind::Declaration => Token::Declaration { text },
            TokenKind::ProcessingInstruction => Token::ProcessingInstruction { text },
        }
    }

    fn emit_end_tag(&mut self) -> Token<'a> {
        let rest = self.rest();
        let (raw, consumed) = match rest.find('>') {
            Some(i) => (&rest[..i + 1], i + 1),
            None => (rest, rest.len()),
        };
        self.pos += consumed;

        let inner = raw
            .trim_start_matches("</")
            .trim_end_matches('>')
            .trim();
        let name: String = inner
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/')
            .collect();
        Token::EndTag { name, raw }
    }

    fn emit_start_tag(&mut self) -> Token<'a> {
        let rest = self.rest();

        // find the closing '>', ignoring '>' inside quoted attribute values
        let mut in_quote: Option<char> = None;
        let mut end: Option<usize> = None;
        for (i, c) in rest.char_indices().skip(1) {
            match in_quote {
                Some(q) => {
                    if c == q {
                        in_quote = None;
                    }
                }
                None => match c {
                    '"' | '\'' => in_quote = Some(c),
                    '>' => {
                        end = Some(i);
                        break;
                    }
                    _ => {}
                },
            }
        }

        let (raw, consumed) = match end {
            Some(i) => (&rest[..i + 1], i + 1),
            None => {
                // tag open never closes: emit what we have and stop the
                // stream there with a recoverable error for the driver
                self.error = Some(ContextError::MalformedMarkup { offset: self.pos });
                (rest, rest.len())
            }
        };
        self.pos += consumed;

        let inner = raw.trim_start_matches('<').trim_end_matches('>');
        let self_closing = inner.trim_end().ends_with('/');

        let name: String = inner
            .chars()
            .take_while(|c| !c.is_whitespace() && *c != '/' && *c != '>')
            .collect();
        let attrs_src = &inner[name.len()..];
        let attrs = parse_attributes(attrs_src);

        trace!("[Tokenizer] start tag <{}> ({} attrs)", name, attrs.len());

        if !self_closing {
            if name == PLAINTEXT_ELEMENT {
                self.raw = RawMode::Plaintext;
            } else if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                self.raw = RawMode::Element(name.clone());
            }
        }

        Token::StartTag {
            name,
            attrs,
            raw,
            self_closing,
        }
    }
}

enum TokenKind {
    Declaration,
    ProcessingInstruction,
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.pos >= self.input.len() {
            return None;
        }
        match self.raw.clone() {
            RawMode::Plaintext => {
                let text = self.rest();
                self.pos = self.input.len();
                Some(Token::Text { text })
            }
            RawMode::Element(name) => self.emit_raw_text(&name),
            RawMode::None => self.next_structural(),
        }
    }
}

/// Parse the attribute region of a start tag. Lenient: spaces around `=`,
/// missing quotes, duplicate attributes and stray slashes are all accepted.
/// Values are entity-decoded; backtick-delimited values (a legacy IE quoting
/// style) parse as unquoted values with the backticks kept, which the
/// delimiter resolver later classifies from the raw tag text.
fn parse_attributes(src: &str) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    let mut iter = src.char_indices().peekable();

    loop {
        // skip whitespace and stray '/'
        while let Some(&(_, c)) = iter.peek() {
            if c.is_whitespace() || c == '/' {
                iter.next();
            } else {
                break;
            }
        }

        let name_start = match iter.peek() {
            Some(&(i, _)) => i,
            None => break,
        };
        let mut name_end = src.len();
        while let Some(&(i, c)) = iter.peek() {
            if c.is_whitespace() || c == '=' || c == '/' {
                name_end = i;
                break;
            }
            iter.next();
        }
        if iter.peek().is_none() {
            name_end = src.len();
        }
        let name = &src[name_start..name_end];
        if name.is_empty() {
            break;
        }

        // spaces are allowed around '='
        while let Some(&(_, c)) = iter.peek() {
            if c.is_whitespace() {
                iter.next();
            } else {
                break;
            }
        }

        let mut value: Option<String> = None;
        if let Some(&(_, '=')) = iter.peek() {
            iter.next();
            while let Some(&(_, c)) = iter.peek() {
                if c.is_whitespace() {
                    iter.next();
                } else {
                    break;
                }
            }
            match iter.peek() {
                Some(&(vstart, q)) if q == '"' || q == '\'' => {
                    iter.next();
                    let content_start = vstart + q.len_utf8();
                    let mut content_end = src.len();
                    for (i, c) in iter.by_ref() {
                        if c == q {
                            content_end = i;
                            break;
                        }
                    }
                    value = Some(
                        normalize::decode_entities(&src[content_start..content_end]).into_owned(),
                    );
                }
                Some(&(vstart, _)) => {
                    let mut content_end = src.len();
                    while let Some(&(i, c)) = iter.peek() {
                        if c.is_whitespace() {
                            content_end = i;
                            break;
                        }
                        iter.next();
                    }
                    if iter.peek().is_none() {
                        content_end = src.len();
                    }
                    value =
                        Some(normalize::decode_entities(&src[vstart..content_end]).into_owned());
                }
                None => value = Some(String::new()),
            }
        }

        attrs.push(Attribute {
            name: name.to_string(),
            value,
        });
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(html: &str) -> Vec<Token<'_>> {
        Tokenizer::new(html).collect()
    }

    #[test]
    fn test_basic_document() {
        let toks = tokens("<html><body>hi</body></html>");
        assert_eq!(toks.len(), 5);
        assert!(matches!(&toks[2], Token::Text { text } if *text == "hi"));
        assert!(matches!(&toks[3], Token::EndTag { name, .. } if name == "body"));
    }

    #[test]
    fn test_attributes_quoted_and_bare() {
        let toks = tokens(r#"<input type="text" disabled value='a b'>"#);
        match &toks[0] {
            Token::StartTag { name, attrs, .. } => {
                assert_eq!(name, "input");
                assert_eq!(attrs.len(), 3);
                assert_eq!(attrs[0].value.as_deref(), Some("text"));
                assert_eq!(attrs[1].name, "disabled");
                assert_eq!(attrs[1].value, None);
                assert_eq!(attrs[2].value.as_deref(), Some("a b"));
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_entity_decoded_attribute_value() {
        let toks = tokens(r#"<a title="&quot;x&quot;">"#);
        match &toks[0] {
            Token::StartTag { attrs, .. } => {
                assert_eq!(attrs[0].value.as_deref(), Some("\"x\""));
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_gt_inside_quoted_value_does_not_close_tag() {
        let toks = tokens(r##"<a title="x > y" href="#">t</a>"##);
        match &toks[0] {
            Token::StartTag { attrs, .. } => {
                assert_eq!(attrs[0].value.as_deref(), Some("x > y"));
                assert_eq!(attrs[1].name, "href");
            }
            other => panic!("expected start tag, got {:?}", other),
        }
    }

    #[test]
    fn test_comment_declaration_pi() {
        let toks = tokens("<!doctype html><!-- c --><?php x ?>");
        assert!(matches!(&toks[0], Token::Declaration { text } if *text == "doctype html"));
        assert!(matches!(&toks[1], Token::Comment { text } if *text == " c "));
        assert!(
            matches!(&toks[2], Token::ProcessingInstruction { text } if *text == "php x ?")
        );
    }

    #[test]
    fn test_unterminated_comment_swallows_rest() {
        let toks = tokens("<p>a</p><!-- never closed <b>x</b>");
        assert!(matches!(
            toks.last().unwrap(),
            Token::Comment { text } if text.contains("<b>x</b>")
        ));
    }

    #[test]
    fn test_script_body_is_raw_text() {
        let toks = tokens("<script>if (a < b) { x(); }</script>");
        assert!(matches!(&toks[1], Token::Text { text } if *text == "if (a < b) { x(); }"));
        assert!(matches!(&toks[2], Token::EndTag { name, .. } if name == "script"));
    }

    #[test]
    fn test_textarea_keeps_markup_literal() {
        let toks = tokens("<textarea><b>bold</b></textarea>");
        assert!(matches!(&toks[1], Token::Text { text } if *text == "<b>bold</b>"));
    }

    #[test]
    fn test_unclosed_raw_text_runs_to_eof() {
        let toks = tokens("<style>p { color: red }");
        assert!(matches!(&toks[1], Token::Text { text } if text.contains("color: red")));
    }

    #[test]
    fn test_plaintext_to_eof() {
        let toks = tokens("<plaintext></p><span>still text");
        assert!(matches!(&toks[1], Token::Text { text } if text.contains("<span>")));
        assert_eq!(toks.len(), 2);
    }

    #[test]
    fn test_self_closing_raw_element_does_not_capture() {
        let toks = tokens("<script/><p>x</p>");
        assert!(matches!(&toks[1], Token::StartTag { name, .. } if name == "p"));
    }

    #[test]
    fn test_lone_lt_is_text() {
        let toks = tokens("a < b <i>c</i>");
        assert!(matches!(&toks[0], Token::Text { text } if *text == "a "));
        assert!(matches!(&toks[1], Token::Text { text } if *text == "< b "));
        assert!(matches!(&toks[2], Token::StartTag { name, .. } if name == "i"));
    }

    #[test]
    fn test_unterminated_start_tag_reports_recoverable_error() {
        let mut t = Tokenizer::new("<p>ok</p><a href=\"x");
        let toks: Vec<_> = t.by_ref().collect();
        assert!(matches!(
            toks.last().unwrap(),
            Token::StartTag { name, .. } if name == "a"
        ));
        assert!(matches!(
            t.error(),
            Some(ContextError::MalformedMarkup { .. })
        ));
    }

    #[test]
    fn test_never_panics_on_garbage() {
        for input in [
            "<", "<!", "<!-", "</", "<a", "<a href", "<a href=", "<a href='",
            "<><><", "<<<<>>>>", "<!---->", "<?", "<a b=c d", "\u{2028}<p>",
        ] {
            let _ = tokens(input);
        }
    }
}
