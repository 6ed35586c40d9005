//! Parser
//!
//!     Recursive-descent parser for db files, driven by one token of lookahead. Tokens are
//!     pulled from a [TokenSource] one at a time, so the parser works just as well over the
//!     real [Lexer] as over a scripted stream in tests.
//!
//! Grammar
//!
//!     document         := (record | standalone_alias)* EOF
//!     record           := RECORD key_value_pair LBRACE record_body* RBRACE
//!     record_body      := field | info_field | alias_field
//!     field            := FIELD key_value_pair
//!     info_field       := INFO key_value_pair
//!     alias_field      := ALIAS LPAREN value RPAREN
//!     standalone_alias := ALIAS key_value_pair
//!     key_value_pair   := LPAREN value COMMA? value RPAREN
//!     value            := QUOTED_STRING | LITERAL
//!
//!     A standalone alias names its record, `alias(record_name, alias_name)`, and attaches to
//!     the record of that name parsed so far. It must match exactly one record.
//!
//! Errors
//!
//!     Any token that is not the one the grammar needs aborts the parse with a
//!     [SyntaxError]. Nothing is recovered and no partial document is returned.

use crate::db::ast::{Document, Entry, Record};
use crate::db::error::SyntaxError;
use crate::db::lexing::{tokenize, Lexer};
use crate::db::token::{Token, TokenKind};

/// Anything that hands out tokens one per call.
///
/// A well-behaved source ends with a single [TokenKind::EndOfFile] token. Running dry
/// before that (`Ok(None)`) is reported by the parser as a syntax error.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError>;
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        self.next().transpose()
    }
}

impl<S: TokenSource + ?Sized> TokenSource for &mut S {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        (**self).next_token()
    }
}

impl<S: TokenSource + ?Sized> TokenSource for Box<S> {
    fn next_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        (**self).next_token()
    }
}

/// One-token lookahead over a [TokenSource]. Consumed tokens are gone for good.
struct TokenCursor<S> {
    source: S,
    lookahead: Option<Token>,
    /// Position of the last token pulled, for errors at end of stream
    last_position: (usize, usize),
}

impl<S: TokenSource> TokenCursor<S> {
    fn new(source: S) -> Self {
        TokenCursor {
            source,
            lookahead: None,
            last_position: (0, 0),
        }
    }

    fn pull(&mut self) -> Result<Token, SyntaxError> {
        match self.source.next_token()? {
            Some(token) => {
                self.last_position = (token.line, token.column);
                Ok(token)
            }
            None => {
                let (line, column) = self.last_position;
                Err(SyntaxError::new(
                    line,
                    column,
                    "Unexpected end of token stream",
                ))
            }
        }
    }

    fn peek(&mut self) -> Result<&Token, SyntaxError> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.pull()?,
        };
        Ok(self.lookahead.insert(token))
    }

    fn peek_kind(&mut self) -> Result<TokenKind, SyntaxError> {
        self.peek().map(|token| token.kind)
    }

    fn advance(&mut self) -> Result<Token, SyntaxError> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.pull(),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        let token = self.advance()?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(unexpected(&token, &kind.to_string()))
        }
    }
}

fn unexpected(token: &Token, expected: &str) -> SyntaxError {
    SyntaxError::at(token, format!("Expected {} but found {}", expected, token))
}

/// Recursive-descent parser producing a [Document].
pub struct Parser<S> {
    cursor: TokenCursor<S>,
}

impl<S: TokenSource> Parser<S> {
    pub fn new(source: S) -> Self {
        Parser {
            cursor: TokenCursor::new(source),
        }
    }

    /// A quoted string with its quotes stripped, or a literal as written.
    pub fn value(&mut self) -> Result<String, SyntaxError> {
        let token = self.cursor.advance()?;
        if !token.kind.is_value() {
            return Err(unexpected(&token, "a value"));
        }
        let text = token.text();
        if token.is(TokenKind::QuotedString) {
            let inner = text
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(text);
            return Ok(inner.to_string());
        }
        Ok(text.to_string())
    }

    /// `(key, value)`; the comma may be left out.
    pub fn key_value_pair(&mut self) -> Result<(String, String), SyntaxError> {
        self.cursor.expect(TokenKind::LParen)?;
        let key = self.value()?;
        if self.cursor.peek_kind()? == TokenKind::Comma {
            self.cursor.advance()?;
        }
        let value = self.value()?;
        self.cursor.expect(TokenKind::RParen)?;
        Ok((key, value))
    }

    /// `field(NAME, value)`
    pub fn field(&mut self) -> Result<Entry, SyntaxError> {
        self.cursor.expect(TokenKind::Field)?;
        Ok(self.key_value_pair()?.into())
    }

    /// `info(name, value)`
    pub fn info_field(&mut self) -> Result<Entry, SyntaxError> {
        self.cursor.expect(TokenKind::Info)?;
        Ok(self.key_value_pair()?.into())
    }

    /// `alias(name)` inside a record body
    pub fn alias_field(&mut self) -> Result<String, SyntaxError> {
        self.cursor.expect(TokenKind::Alias)?;
        self.cursor.expect(TokenKind::LParen)?;
        let alias = self.value()?;
        self.cursor.expect(TokenKind::RParen)?;
        Ok(alias)
    }

    /// `alias(record_name, alias_name)` at the top level.
    ///
    /// Returns the `alias` keyword token alongside the pair so that resolution errors can
    /// point at it.
    pub fn standalone_alias(&mut self) -> Result<(Token, String, String), SyntaxError> {
        let keyword = self.cursor.expect(TokenKind::Alias)?;
        let (record_name, alias) = self.key_value_pair()?;
        Ok((keyword, record_name, alias))
    }

    /// `record(type, name) { ... }`
    pub fn record(&mut self) -> Result<Record, SyntaxError> {
        self.cursor.expect(TokenKind::Record)?;
        let (record_type, name) = self.key_value_pair()?;
        self.cursor.expect(TokenKind::LBrace)?;

        let mut record = Record::new(record_type, name);
        loop {
            match self.cursor.peek_kind()? {
                TokenKind::Field => record.fields.push(self.field()?),
                TokenKind::Info => record.infos.push(self.info_field()?),
                TokenKind::Alias => record.aliases.push(self.alias_field()?),
                TokenKind::RBrace => break,
                _ => {
                    let token = self.cursor.advance()?;
                    return Err(unexpected(
                        &token,
                        &format!("field, info, alias or '}}' in record '{}'", record.name),
                    ));
                }
            }
        }
        self.cursor.expect(TokenKind::RBrace)?;

        Ok(record)
    }

    /// The whole file: records and standalone aliases up to the end of file.
    pub fn db(&mut self) -> Result<Document, SyntaxError> {
        let mut records = Vec::new();
        loop {
            match self.cursor.peek_kind()? {
                TokenKind::Record => records.push(self.record()?),
                TokenKind::Alias => {
                    let (keyword, record_name, alias) = self.standalone_alias()?;
                    attach_alias(&mut records, &keyword, &record_name, alias)?;
                }
                TokenKind::EndOfFile => break,
                _ => {
                    let token = self.cursor.advance()?;
                    return Err(unexpected(&token, "record, alias or end of file"));
                }
            }
        }
        Ok(Document::new(records))
    }
}

/// Attaches a standalone alias to the single record called `record_name`.
fn attach_alias(
    records: &mut [Record],
    keyword: &Token,
    record_name: &str,
    alias: String,
) -> Result<(), SyntaxError> {
    let mut matches = records
        .iter_mut()
        .filter(|record| record.name == record_name);

    match (matches.next(), matches.count()) {
        (Some(record), 0) => {
            record.aliases.push(alias);
            Ok(())
        }
        (Some(_), others) => Err(SyntaxError::at(
            keyword,
            format!(
                "Alias '{}' is ambiguous: {} records are named '{}'",
                alias,
                others + 1,
                record_name
            ),
        )),
        (None, _) => Err(SyntaxError::at(
            keyword,
            format!(
                "Alias '{}' refers to unknown record '{}'",
                alias, record_name
            ),
        )),
    }
}

/// Parse a whole document from any token source.
pub fn parse<S: TokenSource>(source: S) -> Result<Document, SyntaxError> {
    Parser::new(source).db()
}

/// Tokenize and parse the text of a db file.
pub fn parse_str(source: &str) -> Result<Document, SyntaxError> {
    parse(tokenize(source))
}
