//! Token types shared by the lexer, the parser and tooling.
//!
//!     Tokens are plain values: created once by the lexer, pulled once by the parser and then
//!     dropped. Nothing retains a token buffer.
//!
//!     Equality between tokens compares the kind only. The parser checks "is this the token I
//!     expected" far more often than it cares about contents, and tests build expected streams
//!     without caring about positions.

use serde::Serialize;
use std::fmt;

/// The closed set of token categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    Record,
    Field,
    Info,
    Alias,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    QuotedString,
    Literal,
    Comment,
    Macro,
    Whitespace,
    EndOfFile,
}

impl TokenKind {
    /// Tokens the lexer matches but never hands to the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Macro
        )
    }

    /// Tokens that can stand for a value in a key/value pair.
    pub fn is_value(&self) -> bool {
        matches!(self, TokenKind::QuotedString | TokenKind::Literal)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Record => "record",
            TokenKind::Field => "field",
            TokenKind::Info => "info",
            TokenKind::Alias => "alias",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::QuotedString => "quoted string",
            TokenKind::Literal => "literal",
            TokenKind::Comment => "comment",
            TokenKind::Macro => "macro",
            TokenKind::Whitespace => "whitespace",
            TokenKind::EndOfFile => "end of file",
        };
        f.write_str(name)
    }
}

/// A lexical unit with its source position.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw matched text. `None` for synthetic tokens such as end of file.
    pub text: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: Option<String>, line: usize, column: usize) -> Self {
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    pub fn end_of_file(line: usize, column: usize) -> Self {
        Token::new(TokenKind::EndOfFile, None, line, column)
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for Token {}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} (contents={})", self.kind, text),
            None => write!(f, "{}", self.kind),
        }
    }
}
