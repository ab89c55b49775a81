//! CSS-like lexer
//!
//! # Design
//! - **Seven modes**: selector, comment, property, value, at-rule,
//!   at-value, function; every (mode, character) pair maps to a defined
//!   next mode or a self-loop.
//! - **Pending buffer**: accumulated text is emitted at mode boundaries.
//!   Lookahead for `/*` and `*/` is expressed as "pending ends with"
//!   checks, so feeding the input one character at a time produces the
//!   same token stream as feeding it whole.
//! - **Untrusted input**: unbalanced parens and braces are normalized
//!   (depth forced to zero, mode forced back to selector), never errors.

use super::{LinkRules, Token, TokenKind, TokenSink};
use crate::error::LexError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Splits a selector into sigil-led segments: `.class`, `#id`, `:pseudo`,
/// `[attr…]`, or a whitespace-led word (kept plain).
static SELECTOR_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[.#:\[]\w[\w\-"'=\]]*|\s\w[\w\-"'=\]]*"#).expect("selector pattern is valid")
});

const IMPORTANT: &str = "!important";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Selector,
    Comment,
    Property,
    Value,
    AtRule,
    AtValue,
    Function,
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Selector => "selector",
            Mode::Comment => "comment",
            Mode::Property => "property",
            Mode::Value => "value",
            Mode::AtRule => "atrule",
            Mode::AtValue => "atvalue",
            Mode::Function => "function",
        }
    }
}

/// Single-pass lexer for CSS-like text.
///
/// State persists across [`parse`](Self::parse) calls; a renderer feeding
/// one line at a time calls [`flush`](Self::flush) at each line boundary
/// to emit whatever text is still buffered, tagged with the active mode.
#[derive(Debug)]
pub struct CssLexer {
    mode: Mode,
    /// Mode to restore when the current comment closes. Comments don't
    /// nest: the first `*/` always closes.
    previous_mode: Mode,
    pending: String,
    function_depth: u32,
    link_rules: Option<LinkRules>,
}

impl Default for CssLexer {
    fn default() -> Self {
        Self::new()
    }
}

impl CssLexer {
    pub fn new() -> Self {
        CssLexer {
            mode: Mode::Selector,
            previous_mode: Mode::Selector,
            pending: String::new(),
            function_depth: 0,
            link_rules: None,
        }
    }

    /// Attach link rules applied to comment text.
    pub fn with_link_rules(mut self, rules: LinkRules) -> Self {
        self.link_rules = Some(rules);
        self
    }

    pub fn set_link_rules(&mut self, rules: Option<LinkRules>) {
        self.link_rules = rules;
    }

    /// Clear the automaton back to its initial state. Configured link
    /// rules are kept.
    pub fn reset(&mut self) {
        self.mode = Mode::Selector;
        self.previous_mode = Mode::Selector;
        self.pending.clear();
        self.function_depth = 0;
    }

    /// Current nesting depth of parens inside a value function.
    pub fn function_depth(&self) -> u32 {
        self.function_depth
    }

    /// True while the automaton is inside a `/* … */` comment.
    pub fn in_comment(&self) -> bool {
        self.mode == Mode::Comment
    }

    /// Consume one chunk of input. Trailing text stays buffered until the
    /// next chunk or an explicit [`flush`](Self::flush), so tokenization
    /// does not depend on chunk boundaries.
    pub fn parse(&mut self, chunk: &str, sink: &mut impl TokenSink) {
        for c in chunk.chars() {
            self.step(c, sink);
        }
    }

    /// Emit any buffered text as a token tagged with the active mode.
    /// Mode-specific splitting (selector sigils, `!important`, comment
    /// links) still applies. Fails only if the buffer survives emission,
    /// which would be a lexer bug.
    pub fn flush(&mut self, sink: &mut impl TokenSink) -> Result<(), LexError> {
        self.emit_for_mode(self.mode, sink);
        if !self.pending.is_empty() {
            return Err(LexError::BufferNotDrained {
                mode: self.mode.name(),
                leftover: std::mem::take(&mut self.pending),
            });
        }
        Ok(())
    }

    fn step(&mut self, c: char, sink: &mut impl TokenSink) {
        if self.mode == Mode::Comment {
            self.pending.push(c);
            // The first `*/` closes; the `*` may even be the opener's own,
            // so `/*/` is a complete comment.
            if c == '/' && self.pending.ends_with("*/") {
                self.emit_comment(sink);
                self.mode = self.previous_mode;
                self.previous_mode = Mode::Comment;
            }
            return;
        }

        // `/` followed by `*` opens a comment from any mode. The text
        // before the slash belongs to the pre-comment mode and is flushed
        // first so the slash is not misattributed.
        if c == '*' && self.pending.ends_with('/') {
            self.pending.pop();
            self.emit_for_mode(self.mode, sink);
            self.previous_mode = self.mode;
            self.mode = Mode::Comment;
            self.pending.push_str("/*");
            return;
        }

        let curly = c == '{' || c == '}';
        if !curly {
            self.pending.push(c);
        }

        match self.mode {
            Mode::Selector => match c {
                '{' => {
                    self.emit_selector(sink);
                    self.mode = Mode::Property;
                }
                // Ruleset close with no declarations: plain text.
                '}' => self.emit_plain(TokenKind::Text, sink),
                '@' => self.mode = Mode::AtRule,
                _ => {}
            },
            Mode::Property => match c {
                ':' => {
                    self.emit_plain(TokenKind::Property, sink);
                    self.mode = Mode::Value;
                }
                '}' => {
                    self.emit_plain(TokenKind::Text, sink);
                    self.mode = Mode::Selector;
                }
                _ => {}
            },
            Mode::Value => match c {
                ';' => {
                    self.emit_value(sink);
                    self.mode = Mode::Property;
                }
                '}' => {
                    self.emit_value(sink);
                    self.mode = Mode::Selector;
                }
                '(' => {
                    self.emit_value(sink);
                    self.function_depth = 1;
                    self.mode = Mode::Function;
                }
                _ => {}
            },
            Mode::AtRule => {
                if c == ' ' {
                    self.emit_plain(TokenKind::AtRule, sink);
                    self.mode = Mode::AtValue;
                }
            }
            Mode::AtValue => {
                if c == ';' || c == '{' {
                    self.emit_plain(TokenKind::AtValue, sink);
                    self.mode = Mode::Selector;
                }
            }
            Mode::Function => match c {
                '(' => self.function_depth += 1,
                ')' => {
                    self.function_depth = self.function_depth.saturating_sub(1);
                    if self.function_depth == 0 {
                        // The closing paren is part of the token's span
                        // but excluded from its displayed text.
                        self.pending.pop();
                        self.emit_plain(TokenKind::Function, sink);
                        self.mode = Mode::Value;
                    }
                }
                '}' => {
                    // Malformed-input recovery.
                    self.function_depth = 0;
                    self.emit_plain(TokenKind::Function, sink);
                    self.mode = Mode::Selector;
                }
                _ => {}
            },
            Mode::Comment => unreachable!("comment mode handled above"),
        }

        // Curly braces are additionally their own token, layered on top
        // of whatever the mode handler emitted. Modes with no brace rule
        // leave text buffered; it precedes the brace in the source, so it
        // must be emitted before the brace token.
        if curly {
            self.emit_for_mode(self.mode, sink);
            sink.push(Token::plain(TokenKind::Punctuation, c.to_string()));
        }
    }

    /// Emit the pending buffer the way the given mode's boundary would.
    fn emit_for_mode(&mut self, mode: Mode, sink: &mut impl TokenSink) {
        match mode {
            Mode::Selector => self.emit_selector(sink),
            Mode::Comment => self.emit_comment(sink),
            Mode::Property => self.emit_plain(TokenKind::Property, sink),
            Mode::Value => self.emit_value(sink),
            Mode::AtRule => self.emit_plain(TokenKind::AtRule, sink),
            Mode::AtValue => self.emit_plain(TokenKind::AtValue, sink),
            Mode::Function => self.emit_plain(TokenKind::Function, sink),
        }
    }

    fn emit_plain(&mut self, kind: TokenKind, sink: &mut impl TokenSink) {
        if self.pending.is_empty() {
            return;
        }
        sink.push(Token::plain(kind, std::mem::take(&mut self.pending)));
    }

    /// Selector text splits into sigil-led sub-tokens; segments between
    /// matches stay plain selector text.
    fn emit_selector(&mut self, sink: &mut impl TokenSink) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        let mut cursor = 0;
        for m in SELECTOR_PART.find_iter(&text) {
            if m.start() > cursor {
                sink.push(Token::plain(TokenKind::Selector, &text[cursor..m.start()]));
            }
            let kind = match m.as_str().chars().next() {
                Some(':') => TokenKind::SelectorPseudo,
                Some('#') => TokenKind::SelectorId,
                Some('.') => TokenKind::SelectorClass,
                Some('[') => TokenKind::SelectorAttribute,
                _ => TokenKind::Selector,
            };
            sink.push(Token::plain(kind, m.as_str()));
            cursor = m.end();
        }
        if cursor < text.len() {
            sink.push(Token::plain(TokenKind::Selector, &text[cursor..]));
        }
    }

    /// Value text splits around a literal `!important` marker; anything
    /// after the marker is emitted literally so no input is lost.
    fn emit_value(&mut self, sink: &mut impl TokenSink) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        match text.find(IMPORTANT) {
            None => sink.push(Token::plain(TokenKind::Value, text)),
            Some(at) => {
                if at > 0 {
                    sink.push(Token::plain(TokenKind::Value, &text[..at]));
                }
                sink.push(Token::plain(TokenKind::Important, IMPORTANT));
                let rest = &text[at + IMPORTANT.len()..];
                if !rest.is_empty() {
                    sink.push(Token::plain(TokenKind::Value, rest));
                }
            }
        }
    }

    fn emit_comment(&mut self, sink: &mut impl TokenSink) {
        if self.pending.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.pending);
        if let Some(rules) = &self.link_rules {
            if let Some(links) = rules.split(&text) {
                sink.push(Token {
                    kind: TokenKind::Comment,
                    text,
                    links,
                });
                return;
            }
        }
        sink.push(Token::plain(TokenKind::Comment, text));
    }
}
