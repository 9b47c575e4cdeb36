//! Lexer for the Artic frontend
//!
//! Converts source text into a stream of tokens using the `logos`-derived
//! [`TokenKind`]. Invalid characters are skipped and recorded as errors.

use crate::span::Span;
use crate::token::{Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// Lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("unexpected character")]
    UnexpectedChar { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span } => *span,
        }
    }
}

/// The lexer for Artic source text
pub struct Lexer<'src> {
    source: &'src str,
    inner: logos::Lexer<'src, TokenKind>,
    peeked: Option<Token>,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            inner: TokenKind::lexer(source),
            peeked: None,
            errors: Vec::new(),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Take the errors accumulated so far
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.advance());
        }
        self.peeked.as_ref().unwrap()
    }

    /// Get the next token; yields an infinite tail of Eof tokens at the end
    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            return token;
        }
        self.advance()
    }

    fn advance(&mut self) -> Token {
        loop {
            match self.inner.next() {
                Some(Ok(kind)) => {
                    let span = self.inner.span();
                    return Token::new(kind, Span::new(span.start, span.end));
                }
                Some(Err(())) => {
                    // Skip the invalid character and remember it
                    let span = self.inner.span();
                    self.errors
                        .push(LexError::UnexpectedChar { span: Span::new(span.start, span.end) });
                    continue;
                }
                None => {
                    let pos = self.source.len();
                    return Token::new(TokenKind::Eof, Span::new(pos, pos));
                }
            }
        }
    }
}

/// Helper to lex a full source string
pub fn lex(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, lexer.take_errors())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = lex(source);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(token_kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_keywords() {
        let kinds = token_kinds("fn let mut struct enum mod static type use");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Let,
                TokenKind::Mut,
                TokenKind::Struct,
                TokenKind::Enum,
                TokenKind::Mod,
                TokenKind::Static,
                TokenKind::Type,
                TokenKind::Use,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_function_definition() {
        let kinds = token_kinds("fn add(a: i32, b: i32) -> i32 { a + b }");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::I32,
                TokenKind::Comma,
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::I32,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::I32,
                TokenKind::LBrace,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::RBrace,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let kinds = token_kinds("// line\nlet x = 1 /* block */ ;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Let,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::IntLiteral,
                TokenKind::Semi,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_invalid_char_recorded() {
        let (tokens, errors) = lex("let $ x");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.len(), 3); // let, x, eof
    }

    #[test]
    fn test_span_tracking() {
        let source = "let x = 42";
        let (tokens, _) = lex(source);
        assert_eq!(tokens[0].span.text(source), "let");
        assert_eq!(tokens[1].span.text(source), "x");
        assert_eq!(tokens[3].span.text(source), "42");
    }
}
