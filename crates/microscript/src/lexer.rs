//! Lexer: source text to a flat token sequence
//!
//! Token patterns are tried by `logos` with longest-match semantics, so
//! multi-character operators (`**`, `//`, `==`, `!=`, `>=`, `<=`) always win
//! over their single-character prefixes. Whitespace, newlines and `#`
//! comments are discarded; block structure is recovered by the parser from
//! token positions.

mod token;

pub use token::{Token, TokenKind, KEYWORDS};

use logos::Logos;

use crate::error::LexError;
use crate::position::LineIndex;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum RawToken {
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    #[regex(r"[0-9]+")]
    Int,

    #[regex(r"[0-9]+\.[0-9]+")]
    Float,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#)]
    Str,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Word,

    #[token("**")]
    #[token("//")]
    #[token("==")]
    #[token("!=")]
    #[token(">=")]
    #[token("<=")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("=")]
    #[token("<")]
    #[token(">")]
    Operator,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
}

/// Convert source text into tokens, ending with a single `Eof` token.
///
/// # Errors
///
/// Returns a [`LexError`] carrying the position of the first character that
/// starts no token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let index = LineIndex::new(source);
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let start = lexer.span().start;
        let pos = index.position(start);

        let raw = match result {
            Ok(raw) => raw,
            Err(()) => {
                let ch = source[start..].chars().next().unwrap_or('\0');
                return Err(if ch == '"' || ch == '\'' {
                    LexError::UnterminatedString { pos }
                } else {
                    LexError::UnexpectedChar { ch, pos }
                });
            }
        };

        let text = lexer.slice();
        let kind = match raw {
            RawToken::Comment => continue,
            RawToken::Int | RawToken::Float => TokenKind::Number,
            RawToken::Str => TokenKind::String,
            RawToken::Word if KEYWORDS.contains(&text) => TokenKind::Keyword,
            RawToken::Word => TokenKind::Identifier,
            RawToken::Operator => TokenKind::Operator,
            RawToken::LParen => TokenKind::LParen,
            RawToken::RParen => TokenKind::RParen,
            RawToken::LBracket => TokenKind::LBracket,
            RawToken::RBracket => TokenKind::RBracket,
            RawToken::LBrace => TokenKind::LBrace,
            RawToken::RBrace => TokenKind::RBrace,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Comma => TokenKind::Comma,
        };

        tokens.push(Token::new(kind, text, pos));
    }

    tokens.push(Token::new(TokenKind::Eof, "", index.position(source.len())));
    tracing::debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}
