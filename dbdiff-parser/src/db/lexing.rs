//! Lexer
//!
//!     Tokenization of db files. The lexer works line by line and never carries state across
//!     a line boundary, so a token can never span two lines. Line numbers are 1-indexed and
//!     columns are 0-indexed character offsets that reset on every line.
//!
//! Pattern Priority
//!
//!     At each position the patterns of [TOKEN_RULES] are tried in declaration order and the
//!     first one that matches a non-empty prefix of the rest of the line wins. This is
//!     intentionally not longest-match: keywords are tried before literals, so `information`
//!     lexes as `info` followed by the literal `rmation`.
//!
//! Insignificant Tokens
//!
//!     Whitespace, comments and macro expansions are matched like any other token, but the
//!     default lexer drops them. [Lexer::with_trivia] keeps them, which is handy for tooling
//!     and for checking positions in tests.
//!
//! End Of File
//!
//!     Exactly one end of file token closes every successful stream. It is placed on the last
//!     line, with the column set to that line's length (not one past the end).

use crate::db::error::SyntaxError;
use crate::db::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::{Enumerate, FusedIterator};
use std::str::Lines;

/// Token rules as (kind, pattern) pairs.
///
/// Order matters: rules are tried in declaration order and the first match wins.
pub const TOKEN_RULES: &[(TokenKind, &str)] = &[
    (TokenKind::Record, r"record"),
    (TokenKind::Field, r"field"),
    (TokenKind::Info, r"info"),
    (TokenKind::Alias, r"alias"),
    (TokenKind::LParen, r"\("),
    (TokenKind::RParen, r"\)"),
    (TokenKind::LBrace, r"\{"),
    (TokenKind::RBrace, r"\}"),
    (TokenKind::Comma, r","),
    // Backslash escapes may hide a quote; `""` is the empty string
    (TokenKind::QuotedString, r#""(?:[^"\\]|\\.)*""#),
    (TokenKind::Literal, r"[a-zA-Z0-9]+"),
    (TokenKind::Comment, r"#.*"),
    (TokenKind::Macro, r"\$\(.*\).*"),
    (TokenKind::Whitespace, r"\s+"),
];

/// A compiled token rule.
pub struct TokenPattern {
    pub kind: TokenKind,
    regex: Regex,
}

impl TokenPattern {
    /// Length in bytes of the match at the start of `text`, if any.
    fn match_len(&self, text: &str) -> Option<usize> {
        self.regex
            .find(text)
            .map(|m| m.end())
            .filter(|len| *len > 0)
    }
}

/// Process-wide compiled pattern table, built once on first use and never mutated.
pub static TOKEN_PATTERNS: Lazy<Vec<TokenPattern>> = Lazy::new(|| {
    TOKEN_RULES
        .iter()
        .map(|(kind, pattern)| TokenPattern {
            kind: *kind,
            regex: Regex::new(&format!("^(?:{})", pattern)).unwrap(),
        })
        .collect()
});

/// Finds the first rule in priority order matching the start of `text`.
fn match_token(text: &str) -> Option<(TokenKind, usize)> {
    TOKEN_PATTERNS
        .iter()
        .find_map(|pattern| pattern.match_len(text).map(|len| (pattern.kind, len)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexerState {
    Running,
    Finished,
}

/// Pull-based lexer over the text of one db file.
///
/// Yields `Ok(token)` until the end of file token, or a single `Err` if some input matches
/// no rule. The iterator is fused after either.
pub struct Lexer<'a> {
    lines: Enumerate<Lines<'a>>,
    /// Line number and text of the line being lexed
    current: Option<(usize, &'a str)>,
    /// Byte offset into the current line
    offset: usize,
    /// Character column in the current line
    column: usize,
    /// Line number and character length of the last line started
    last_line: (usize, usize),
    include_trivia: bool,
    state: LexerState,
}

impl<'a> Lexer<'a> {
    /// Lexer producing only the tokens the parser cares about.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            lines: source.lines().enumerate(),
            current: None,
            offset: 0,
            column: 0,
            last_line: (0, 0),
            include_trivia: false,
            state: LexerState::Running,
        }
    }

    /// Lexer that also yields whitespace, comment and macro tokens.
    pub fn with_trivia(source: &'a str) -> Self {
        Lexer {
            include_trivia: true,
            ..Lexer::new(source)
        }
    }

    fn next_raw(&mut self) -> Option<Result<Token, SyntaxError>> {
        loop {
            if self.state == LexerState::Finished {
                return None;
            }

            let (line_number, text) = match self.current {
                Some(current) => current,
                None => match self.lines.next() {
                    Some((index, text)) => {
                        let line_number = index + 1;
                        self.current = Some((line_number, text));
                        self.offset = 0;
                        self.column = 0;
                        self.last_line = (line_number, text.chars().count());
                        continue;
                    }
                    None => {
                        self.state = LexerState::Finished;
                        let (line, column) = self.last_line;
                        return Some(Ok(Token::end_of_file(line, column)));
                    }
                },
            };

            let rest = &text[self.offset..];
            if rest.is_empty() {
                self.current = None;
                continue;
            }

            return match match_token(rest) {
                Some((kind, len)) => {
                    let matched = &rest[..len];
                    let token = Token::new(kind, Some(matched.to_string()), line_number, self.column);
                    self.offset += len;
                    self.column += matched.chars().count();
                    Some(Ok(token))
                }
                None => {
                    self.state = LexerState::Finished;
                    Some(Err(SyntaxError::new(
                        line_number,
                        self.column,
                        format!("No matching rules found. Line contents: '{}'", text),
                    )))
                }
            };
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_raw()? {
                Ok(token) if !self.include_trivia && token.kind.is_trivia() => continue,
                item => return Some(item),
            }
        }
    }
}

impl FusedIterator for Lexer<'_> {}

/// Lex `source` into a lazy stream of significant tokens.
pub fn tokenize(source: &str) -> Lexer<'_> {
    Lexer::new(source)
}

/// Lex all of `source` eagerly, stopping at the first error.
pub fn tokenize_all(source: &str) -> Result<Vec<Token>, SyntaxError> {
    tokenize(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize_all(source)
            .expect("lexing failed")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn texts(source: &str) -> Vec<String> {
        tokenize_all(source)
            .expect("lexing failed")
            .into_iter()
            .filter(|t| t.kind != TokenKind::EndOfFile)
            .map(|t| t.text().to_string())
            .collect()
    }

    #[test]
    fn test_record_header() {
        assert_eq!(
            kinds(r#"record(ai, "$(P)HELLO") {"#),
            vec![
                TokenKind::Record,
                TokenKind::LParen,
                TokenKind::Literal,
                TokenKind::Comma,
                TokenKind::QuotedString,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::EndOfFile,
            ]
        );
        assert_eq!(
            texts(r#"record(ai, "$(P)HELLO") {"#),
            vec!["record", "(", "ai", ",", "\"$(P)HELLO\"", ")", "{"]
        );
    }

    #[test]
    fn test_keywords_win_over_literals() {
        assert_eq!(
            kinds("information"),
            vec![TokenKind::Info, TokenKind::Literal, TokenKind::EndOfFile]
        );
        assert_eq!(texts("information"), vec!["info", "rmation"]);
    }

    #[test]
    fn test_empty_quoted_string() {
        assert_eq!(texts(r#"field(DESC, "")"#)[4], "\"\"");
    }

    #[test]
    fn test_empty_quoted_string_does_not_swallow_next_string() {
        assert_eq!(
            texts(r#"("" "B")"#),
            vec!["(", "\"\"", "\"B\"", ")"]
        );
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        assert_eq!(
            texts(r#"field(DESC, "say \"hi\"")"#)[4],
            r#""say \"hi\"""#
        );
    }

    #[test]
    fn test_comments_and_macros_are_skipped() {
        let source = "# a comment\n$(IFSIM) field(SIML, \"x\")\nrecord";
        assert_eq!(kinds(source), vec![TokenKind::Record, TokenKind::EndOfFile]);
    }

    #[test]
    fn test_trivia_kept_on_request() {
        let tokens: Vec<TokenKind> = Lexer::with_trivia("  # note")
            .map(|t| t.unwrap().kind)
            .collect();
        assert_eq!(
            tokens,
            vec![TokenKind::Whitespace, TokenKind::Comment, TokenKind::EndOfFile]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize_all("record\n  field(A B)").unwrap();
        let positions: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(
            positions,
            vec![(1, 0), (2, 2), (2, 7), (2, 8), (2, 10), (2, 11), (2, 12)]
        );
    }

    #[test]
    fn test_end_of_file_sits_on_last_line() {
        let tokens = tokenize_all("record\nfield\n").unwrap();
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::EndOfFile);
        assert_eq!((eof.line, eof.column), (2, 5));
    }

    #[test]
    fn test_empty_input_yields_only_end_of_file() {
        let tokens = tokenize_all("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!((tokens[0].line, tokens[0].column), (0, 0));
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(
            kinds("record\r\n{}\r\n"),
            vec![
                TokenKind::Record,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::EndOfFile
            ]
        );
    }

    #[test]
    fn test_unmatched_character_reports_position() {
        let err = tokenize_all("record(ai, \"X\") {\n  field(VAL, @)\n}").unwrap_err();
        assert_eq!((err.line, err.column), (2, 13));
        assert!(err.message.contains("field(VAL, @)"));
    }

    #[test]
    fn test_lexer_is_fused_after_error() {
        let mut lexer = tokenize("@ record");
        assert!(matches!(lexer.next(), Some(Err(_))));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_exactly_one_end_of_file() {
        let mut lexer = tokenize("record");
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::Record);
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::EndOfFile);
        assert!(lexer.next().is_none());
    }
}
