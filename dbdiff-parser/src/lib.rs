//! # dbdiff-parser
//!
//! Tokenizer, parser and API-level diff for EPICS database (`.db`) files.
//!
//! File Layout
//!
//! The pipeline is leaf-first and each stage lives in its own module:
//!
//! src/db
//!   ├── token      Token kinds and the token value type
//!   ├── lexing     Line-based, priority-ordered tokenizer
//!   ├── parsing    Recursive-descent parser over any token source
//!   ├── ast        Records and documents
//!   ├── diffing    Record and field level comparison of two documents
//!   └── loader     Reading sources from disk or strings
//!
//! The contract between stages is deliberately small: text in, tokens pulled one at a time,
//! a [Document](db::ast::Document) out, and a list of change messages from two documents.
//!
//! For test doubles of the token stream, see the [testing module](db::testing).

pub mod db;

pub use db::ast::{Document, Entry, Record};
pub use db::diffing::{diff, diff_documents, Change};
pub use db::error::SyntaxError;
pub use db::lexing::{tokenize, Lexer};
pub use db::parsing::{parse, parse_str, Parser, TokenSource};
pub use db::token::{Token, TokenKind};
