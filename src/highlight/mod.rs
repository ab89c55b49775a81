//! Lexical highlighting
//!
//! # Design
//! - **Single pass**: every lexer here is a hand-written automaton that
//!   classifies text in one left-to-right character scan.
//! - **Chunked input**: `parse` may be called with arbitrary slices of the
//!   source; the automaton state and pending buffer persist across calls,
//!   so tokenization is independent of how the input is chunked.
//! - **Explicit flush**: emitting trailing text is the caller's decision
//!   (typically once per rendered line), via `flush`.
//!
//! Tokens are pushed to a caller-supplied [`TokenSink`] in source order;
//! concatenating their text reproduces the input (see the module tests for
//! the one documented exception around function-closing parens).

mod css;
mod links;
mod simple;

pub use css::CssLexer;
pub use links::LinkRules;
pub use simple::SimpleLexer;

/// Semantic classification of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Unclassified source text.
    Text,
    /// A quote-delimited string, including its quotes.
    Quoted,
    /// Plain segment of a selector.
    Selector,
    /// `.class` segment of a selector.
    SelectorClass,
    /// `#id` segment of a selector.
    SelectorId,
    /// `:pseudo` segment of a selector.
    SelectorPseudo,
    /// `[attribute]` segment of a selector.
    SelectorAttribute,
    Comment,
    Property,
    Value,
    /// The `!important` marker inside a value.
    Important,
    AtRule,
    AtValue,
    Function,
    /// A single `{` or `}`.
    Punctuation,
}

impl TokenKind {
    /// Stable lowercase name, usable as a style class.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::Quoted => "quote",
            TokenKind::Selector => "selector",
            TokenKind::SelectorClass => "class",
            TokenKind::SelectorId => "id",
            TokenKind::SelectorPseudo => "pseudo",
            TokenKind::SelectorAttribute => "attribute",
            TokenKind::Comment => "comment",
            TokenKind::Property => "property",
            TokenKind::Value => "value",
            TokenKind::Important => "important",
            TokenKind::AtRule => "atrule",
            TokenKind::AtValue => "atvalue",
            TokenKind::Function => "function",
            TokenKind::Punctuation => "curly",
        }
    }
}

/// One piece of a comment token's text: either a literal run or a matched
/// substring with a generated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSegment {
    pub text: String,
    /// `Some` when the segment matched the link pattern and the generator
    /// produced a target for it.
    pub href: Option<String>,
}

/// A classified, contiguous span of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Ordered, non-overlapping segments covering `text`. Populated only
    /// for comment tokens whose text matched a configured link pattern;
    /// empty otherwise.
    pub links: Vec<LinkSegment>,
}

impl Token {
    pub fn plain(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            links: Vec::new(),
        }
    }
}

/// Receives tokens in left-to-right source order.
pub trait TokenSink {
    fn push(&mut self, token: Token);
}

impl TokenSink for Vec<Token> {
    fn push(&mut self, token: Token) {
        Vec::push(self, token);
    }
}

/// Adapter turning a closure into a [`TokenSink`].
pub struct FnSink<F: FnMut(Token)>(pub F);

impl<F: FnMut(Token)> TokenSink for FnSink<F> {
    fn push(&mut self, token: Token) {
        (self.0)(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_sink_receives_tokens() {
        let mut classes = Vec::new();
        let mut sink = FnSink(|token: Token| classes.push(token.kind.as_str()));
        let mut lexer = CssLexer::new();
        lexer.parse("a{color:red;}", &mut sink);
        assert_eq!(
            classes,
            ["selector", "curly", "property", "value", "curly"]
        );
    }
}
