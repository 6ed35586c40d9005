//! Testing utilities
//!
//!     The parser only needs something that hands out tokens, so parser tests script the
//!     token stream directly with [MockTokenSource] instead of going through the lexer. This
//!     keeps parser tests independent of lexer details such as positions or the pattern table.
//!
//!     ```rust,ignore
//!     use dbdiff_parser::db::parsing::Parser;
//!     use dbdiff_parser::db::testing::MockTokenSource;
//!     use dbdiff_parser::db::token::TokenKind;
//!
//!     // record(ai, "$(P)TEST") { field(PINI, "YES") }
//!     let source = MockTokenSource::new()
//!         .add_record_header("ai", "$(P)TEST")
//!         .add_kind(TokenKind::LBrace)
//!         .add_field("PINI", "YES")
//!         .add_kind(TokenKind::RBrace);
//!     let doc = Parser::new(source).db().unwrap();
//!     ```
//!
//!     Key/value helpers write the key as a literal and the value as a quoted string, the way
//!     db files usually look.

use crate::db::error::SyntaxError;
use crate::db::parsing::TokenSource;
use crate::db::token::{Token, TokenKind};
use std::collections::VecDeque;

/// Scripted token stream. Positions are all zero.
#[derive(Debug, Clone)]
pub struct MockTokenSource {
    tokens: VecDeque<Token>,
    end_of_file: bool,
}

impl MockTokenSource {
    /// An empty script that still ends with an end of file token.
    pub fn new() -> Self {
        MockTokenSource {
            tokens: VecDeque::new(),
            end_of_file: true,
        }
    }

    /// Drop the trailing end of file token, leaving the stream to simply run dry.
    pub fn without_end_of_file(mut self) -> Self {
        self.end_of_file = false;
        self
    }

    pub fn add_token(mut self, kind: TokenKind, contents: &str) -> Self {
        self.tokens
            .push_back(Token::new(kind, Some(contents.to_string()), 0, 0));
        self
    }

    pub fn add_kind(mut self, kind: TokenKind) -> Self {
        self.tokens.push_back(Token::new(kind, None, 0, 0));
        self
    }

    /// `(key, "value")`
    pub fn add_key_value_pair(self, key: &str, value: &str) -> Self {
        self.add_kind(TokenKind::LParen)
            .add_token(TokenKind::Literal, key)
            .add_kind(TokenKind::Comma)
            .add_token(TokenKind::QuotedString, &format!("\"{}\"", value))
            .add_kind(TokenKind::RParen)
    }

    pub fn add_field(self, name: &str, value: &str) -> Self {
        self.add_kind(TokenKind::Field).add_key_value_pair(name, value)
    }

    pub fn add_info_field(self, name: &str, value: &str) -> Self {
        self.add_kind(TokenKind::Info).add_key_value_pair(name, value)
    }

    /// `alias("name")` inside a record body
    pub fn add_alias_field(self, alias: &str) -> Self {
        self.add_kind(TokenKind::Alias)
            .add_kind(TokenKind::LParen)
            .add_token(TokenKind::QuotedString, &format!("\"{}\"", alias))
            .add_kind(TokenKind::RParen)
    }

    /// `alias(record_name, "alias_name")` at the top level
    pub fn add_alias(self, record_name: &str, alias: &str) -> Self {
        self.add_kind(TokenKind::Alias)
            .add_key_value_pair(record_name, alias)
    }

    /// `record(type, "name")`, without the braces
    pub fn add_record_header(self, record_type: &str, name: &str) -> Self {
        self.add_kind(TokenKind::Record)
            .add_key_value_pair(record_type, name)
    }

    /// `record(type, "name") { field(..) ... }` with the given fields
    pub fn add_record(mut self, record_type: &str, name: &str, fields: &[(&str, &str)]) -> Self {
        self = self
            .add_record_header(record_type, name)
            .add_kind(TokenKind::LBrace);
        for (field, value) in fields {
            self = self.add_field(field, value);
        }
        self.add_kind(TokenKind::RBrace)
    }
}

impl Default for MockTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenSource for MockTokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        match self.tokens.pop_front() {
            Some(token) => Ok(Some(token)),
            None if self.end_of_file => {
                self.end_of_file = false;
                Ok(Some(Token::end_of_file(0, 0)))
            }
            None => Ok(None),
        }
    }
}
