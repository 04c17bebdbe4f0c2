//! Token types produced by the lexer

use std::fmt;

use serde::Serialize;

use crate::position::Position;

/// Reserved words. Identifiers matching one of these lex as `Keyword`.
pub const KEYWORDS: &[&str] = &[
    "if", "elif", "else", "while", "for", "in", "def", "return", "print", "true", "false", "nil",
];

/// The closed set of token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Integer or decimal literal
    Number,
    /// Quoted string literal (quotes retained)
    String,
    /// Variable or function name
    Identifier,
    /// Reserved word
    Keyword,
    /// Arithmetic, comparison or assignment operator
    Operator,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Keyword => "keyword",
            TokenKind::Operator => "operator",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

/// A single lexed token: kind, literal text and source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Token category
    pub kind: TokenKind,

    /// The literal source text (empty for `Eof`)
    pub text: String,

    /// Where the token starts
    pub pos: Position,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, text: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }

    /// Check for a specific keyword.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == word
    }

    /// Check for a specific operator.
    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    /// Describe the token for error messages, e.g. `identifier 'x'`.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => self.kind.to_string(),
            TokenKind::Number
            | TokenKind::String
            | TokenKind::Identifier
            | TokenKind::Keyword
            | TokenKind::Operator => format!("{} '{}'", self.kind, self.text),
            _ => self.kind.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({}) @ {}", self.kind, self.text, self.pos)
    }
}
