//! Comparison of two versions of one db file.

use dbdiff_parser::db::loader::{DocumentLoader, LoaderError};
use dbdiff_parser::diff;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of comparing an old and a new version of a db file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileComparison {
    /// Same lines; only line endings may differ
    Identical,
    /// The text differs but nothing that existed before changed or went away
    ApiUnchanged,
    /// Change messages, in the old file's order
    Changed(Vec<String>),
}

/// One of the two files could not be read or parsed.
#[derive(Debug, Clone)]
pub struct ComparisonError {
    pub path: PathBuf,
    pub error: LoaderError,
}

impl fmt::Display for ComparisonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to parse db at {} because: {}",
            self.path.display(),
            self.error
        )
    }
}

impl std::error::Error for ComparisonError {}

/// Whether two sources hold the same sequence of lines. `\n` and `\r\n` endings compare equal.
pub fn same_lines(old: &str, new: &str) -> bool {
    old.lines().eq(new.lines())
}

fn load(path: &Path) -> Result<DocumentLoader, ComparisonError> {
    DocumentLoader::from_path(path).map_err(|error| ComparisonError {
        path: path.to_path_buf(),
        error,
    })
}

/// Compare `old` against `new`, parsing both only when their text differs.
pub fn compare_files(old: &Path, new: &Path) -> Result<FileComparison, ComparisonError> {
    let old_loader = load(old)?;
    let new_loader = load(new)?;

    if same_lines(old_loader.source(), new_loader.source()) {
        return Ok(FileComparison::Identical);
    }

    let parse = |loader: &DocumentLoader, path: &Path| {
        loader.parse().map_err(|error| ComparisonError {
            path: path.to_path_buf(),
            error,
        })
    };
    let old_doc = parse(&old_loader, old)?;
    let new_doc = parse(&new_loader, new)?;

    let messages = diff(&old_doc, &new_doc);
    debug!(
        old = %old.display(),
        new = %new.display(),
        changes = messages.len(),
        "compared db files"
    );

    if messages.is_empty() {
        Ok(FileComparison::ApiUnchanged)
    } else {
        Ok(FileComparison::Changed(messages))
    }
}

/// Report line for a pair of files, or `None` when they are identical.
pub fn describe_file_change(old: &Path, new: &Path) -> Option<String> {
    match compare_files(old, new) {
        Ok(FileComparison::Identical) => None,
        Ok(FileComparison::ApiUnchanged) => Some(format!(
            "DBs at '{}' and '{}' are different, but previous API not changed",
            old.display(),
            new.display()
        )),
        Ok(FileComparison::Changed(messages)) => Some(format!(
            "DBs at '{}' and '{}' are different.\n  - {}",
            old.display(),
            new.display(),
            messages.join("\n  - ")
        )),
        Err(err) => Some(err.to_string()),
    }
}
