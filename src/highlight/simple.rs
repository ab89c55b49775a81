//! Quote-splitting lexer: separates single- and double-quoted runs from
//! surrounding plain text.

use super::{Token, TokenKind, TokenSink};
use crate::error::LexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    InSingleQuote,
    InDoubleQuote,
}

impl Mode {
    fn name(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::InSingleQuote => "single-quote",
            Mode::InDoubleQuote => "double-quote",
        }
    }
}

/// Tokenizer with three states: plain text, inside `'…'`, inside `"…"`.
///
/// A quote may span chunk boundaries: flushing inside a quote emits the
/// buffered text as an (unterminated) quoted token but keeps the quote
/// state, so the continuation in the next chunk is still classified as
/// quoted.
#[derive(Debug)]
pub struct SimpleLexer {
    mode: Mode,
    pending: String,
}

impl Default for SimpleLexer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleLexer {
    pub fn new() -> Self {
        SimpleLexer {
            mode: Mode::Normal,
            pending: String::new(),
        }
    }

    /// Clear the automaton back to its initial state.
    pub fn reset(&mut self) {
        self.mode = Mode::Normal;
        self.pending.clear();
    }

    /// Consume one chunk of input. Trailing text stays buffered until the
    /// next chunk or an explicit [`flush`](Self::flush).
    pub fn parse(&mut self, chunk: &str, sink: &mut impl TokenSink) {
        for c in chunk.chars() {
            match self.mode {
                Mode::Normal => match c {
                    '"' => {
                        self.emit_pending(TokenKind::Text, sink);
                        self.pending.push('"');
                        self.mode = Mode::InDoubleQuote;
                    }
                    '\'' => {
                        self.emit_pending(TokenKind::Text, sink);
                        self.pending.push('\'');
                        self.mode = Mode::InSingleQuote;
                    }
                    _ => self.pending.push(c),
                },
                Mode::InDoubleQuote => {
                    self.pending.push(c);
                    if c == '"' {
                        self.emit_pending(TokenKind::Quoted, sink);
                        self.mode = Mode::Normal;
                    }
                }
                Mode::InSingleQuote => {
                    self.pending.push(c);
                    if c == '\'' {
                        self.emit_pending(TokenKind::Quoted, sink);
                        self.mode = Mode::Normal;
                    }
                }
            }
        }
    }

    /// Emit any buffered trailing text: plain text in the normal state, an
    /// unterminated quoted token inside a quote. The quote state survives
    /// the flush so quotes can continue across chunks.
    pub fn flush(&mut self, sink: &mut impl TokenSink) -> Result<(), LexError> {
        match self.mode {
            Mode::Normal => self.emit_pending(TokenKind::Text, sink),
            Mode::InSingleQuote | Mode::InDoubleQuote => {
                self.emit_pending(TokenKind::Quoted, sink)
            }
        }
        if !self.pending.is_empty() {
            return Err(LexError::BufferNotDrained {
                mode: self.mode.name(),
                leftover: std::mem::take(&mut self.pending),
            });
        }
        Ok(())
    }

    fn emit_pending(&mut self, kind: TokenKind, sink: &mut impl TokenSink) {
        if self.pending.is_empty() {
            return;
        }
        sink.push(Token::plain(kind, std::mem::take(&mut self.pending)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_line(input: &str) -> Vec<Token> {
        let mut lexer = SimpleLexer::new();
        let mut tokens = Vec::new();
        lexer.parse(input, &mut tokens);
        lexer.flush(&mut tokens).unwrap();
        tokens
    }

    #[test]
    fn splits_double_quoted_runs() {
        let tokens = lex_line(r#"key = "some value" # rest"#);
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Text, TokenKind::Quoted, TokenKind::Text]
        );
        assert_eq!(tokens[1].text, "\"some value\"");
    }

    #[test]
    fn single_quotes_are_symmetric() {
        let tokens = lex_line("a 'b' c");
        assert_eq!(tokens[1].kind, TokenKind::Quoted);
        assert_eq!(tokens[1].text, "'b'");
    }

    #[test]
    fn round_trip_reassembles_input() {
        let input = "plain 'single' mixed \"double\" trailing";
        let joined: String = lex_line(input).iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, input);
    }

    #[test]
    fn unterminated_quote_flushes_as_quoted_and_spans_chunks() {
        let mut lexer = SimpleLexer::new();
        let mut tokens = Vec::new();
        lexer.parse("say \"half", &mut tokens);
        lexer.flush(&mut tokens).unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Quoted);
        assert_eq!(tokens.last().unwrap().text, "\"half");

        // Continuation is still inside the quote.
        tokens.clear();
        lexer.parse("way\" done", &mut tokens);
        lexer.flush(&mut tokens).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Quoted);
        assert_eq!(tokens[0].text, "way\"");
        assert_eq!(tokens[1].kind, TokenKind::Text);
    }

    #[test]
    fn chunking_does_not_change_tokens() {
        let input = "a 'quoted' and \"more\" text";
        let whole = lex_line(input);

        let mut lexer = SimpleLexer::new();
        let mut tokens = Vec::new();
        for c in input.chars() {
            lexer.parse(&c.to_string(), &mut tokens);
        }
        lexer.flush(&mut tokens).unwrap();
        assert_eq!(whole, tokens);
    }

    #[test]
    fn reset_returns_to_normal() {
        let mut lexer = SimpleLexer::new();
        let mut tokens = Vec::new();
        lexer.parse("'open", &mut tokens);
        lexer.reset();
        lexer.parse("plain", &mut tokens);
        lexer.flush(&mut tokens).unwrap();
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Text);
    }
}
