//! Error types for lexing and parsing

use crate::db::token::Token;
use std::fmt;

/// A syntax problem found while tokenizing or parsing a db file.
///
/// Raised by the lexer when no token pattern matches and by the parser when the token it
/// needs is absent. There is no recovery: any syntax error aborts that file's parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-indexed line of the offending input
    pub line: usize,
    /// 0-indexed column of the offending input
    pub column: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Error positioned at `token`.
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        SyntaxError::new(token.line, token.column, message)
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for SyntaxError {}

impl From<SyntaxError> for String {
    fn from(err: SyntaxError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::token::TokenKind;

    #[test]
    fn test_display_includes_position() {
        let err = SyntaxError::new(3, 14, "No matching rules found");
        assert_eq!(err.to_string(), "3:14: No matching rules found");
    }

    #[test]
    fn test_at_token_uses_token_position() {
        let token = Token::new(TokenKind::Comma, Some(",".to_string()), 7, 2);
        let err = SyntaxError::at(&token, "unexpected comma");
        assert_eq!((err.line, err.column), (7, 2));
    }
}
