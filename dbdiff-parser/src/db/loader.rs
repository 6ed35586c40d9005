//! Document loading utilities
//!
//! This module provides `DocumentLoader` - a utility for loading db source text from files
//! or strings and running the lexer or parser on it. Used by the scanner, the CLI and tests.
//!
//! # Example
//!
//! ```rust
//! use dbdiff_parser::db::loader::DocumentLoader;
//!
//! // From file
//! let doc = DocumentLoader::from_path("motor.db").unwrap().parse().unwrap();
//!
//! // From string
//! let tokens = DocumentLoader::from_string("record(ai, \"A\") {}\n").tokenize().unwrap();
//! ```

use crate::db::ast::Document;
use crate::db::error::SyntaxError;
use crate::db::lexing::tokenize_all;
use crate::db::parsing::parse_str;
use crate::db::token::Token;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Error that can occur when loading documents
#[derive(Debug, Clone)]
pub enum LoaderError {
    /// IO error when reading file
    IoError(String),
    /// The source is not a valid db file
    SyntaxError(SyntaxError),
}

impl std::fmt::Display for LoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoaderError::IoError(msg) => write!(f, "IO error: {}", msg),
            LoaderError::SyntaxError(err) => write!(f, "SyntaxError {}", err),
        }
    }
}

impl std::error::Error for LoaderError {}

impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::IoError(err.to_string())
    }
}

impl From<SyntaxError> for LoaderError {
    fn from(err: SyntaxError) -> Self {
        LoaderError::SyntaxError(err)
    }
}

/// Holds the source of one db file.
pub struct DocumentLoader {
    source: String,
}

impl DocumentLoader {
    /// Load from a file path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LoaderError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading db file");
        let source = fs::read_to_string(path)?;
        Ok(DocumentLoader { source })
    }

    /// Load from a string
    pub fn from_string<S: Into<String>>(source: S) -> Self {
        DocumentLoader {
            source: source.into(),
        }
    }

    /// Parse the source into a Document
    pub fn parse(&self) -> Result<Document, LoaderError> {
        Ok(parse_str(&self.source)?)
    }

    /// Significant tokens of the source, ending with end of file
    pub fn tokenize(&self) -> Result<Vec<Token>, LoaderError> {
        Ok(tokenize_all(&self.source)?)
    }

    /// Get the raw source string
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Read and parse the db file at `path`.
pub fn parse_db_file<P: AsRef<Path>>(path: P) -> Result<Document, LoaderError> {
    DocumentLoader::from_path(path)?.parse()
}
