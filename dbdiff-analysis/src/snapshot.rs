//! Snapshot scanning
//!
//!     A snapshot is a directory tree holding one release of the db files. Files are always
//!     discovered in the OLD snapshot and looked up by relative path in the new one: a file
//!     only present in the new snapshot is an addition, and additions are never reported.
//!
//!     Walking is restricted to the configured interesting directories (the whole snapshot
//!     when there are none) and never enters a directory whose name is in the ignore list.
//!     `.gitignore` rules are deliberately not honored: checked-in files that happen to match
//!     an ignore pattern are still part of the release.

use crate::comparison::{describe_file_change, same_lines};
use dbdiff_config::ScanConfig;
use ignore::WalkBuilder;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which files of a snapshot count as db files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub extensions: Vec<String>,
    pub ignored_directories: Vec<String>,
    pub interesting_directories: Vec<PathBuf>,
}

impl ScanSettings {
    /// Every `.db` file anywhere in the snapshot.
    pub fn everywhere() -> Self {
        ScanSettings {
            extensions: vec![".db".to_string()],
            ignored_directories: Vec::new(),
            interesting_directories: Vec::new(),
        }
    }

    fn is_db_file(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

impl From<&ScanConfig> for ScanSettings {
    fn from(config: &ScanConfig) -> Self {
        ScanSettings {
            extensions: config.extensions.clone(),
            ignored_directories: config.ignored_directories.clone(),
            interesting_directories: config.interesting_directories.clone(),
        }
    }
}

/// Errors that can occur while walking a snapshot
#[derive(Debug, Clone)]
pub enum ScanError {
    /// A snapshot root does not exist or is not a directory
    MissingRoot(PathBuf),
    /// Error reported by the directory walker
    Walk(String),
    /// IO error comparing file contents
    Io(String),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::MissingRoot(path) => {
                write!(f, "Snapshot directory not found: {}", path.display())
            }
            ScanError::Walk(msg) => write!(f, "Walk error: {}", msg),
            ScanError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<ignore::Error> for ScanError {
    fn from(err: ignore::Error) -> Self {
        ScanError::Walk(err.to_string())
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}

/// An old and a new snapshot to compare.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    old_root: PathBuf,
    new_root: PathBuf,
    settings: ScanSettings,
}

impl SnapshotPair {
    pub fn new(
        old_root: impl Into<PathBuf>,
        new_root: impl Into<PathBuf>,
        settings: ScanSettings,
    ) -> Result<Self, ScanError> {
        let old_root = old_root.into();
        let new_root = new_root.into();
        for root in [&old_root, &new_root] {
            if !root.is_dir() {
                return Err(ScanError::MissingRoot(root.clone()));
            }
        }
        Ok(SnapshotPair {
            old_root,
            new_root,
            settings,
        })
    }

    pub fn old_root(&self) -> &Path {
        &self.old_root
    }

    pub fn new_root(&self) -> &Path {
        &self.new_root
    }

    /// Db files of the old snapshot, relative to its root, sorted.
    pub fn dbs_in_old(&self) -> Result<Vec<PathBuf>, ScanError> {
        let search_roots: Vec<PathBuf> = if self.settings.interesting_directories.is_empty() {
            vec![self.old_root.clone()]
        } else {
            self.settings
                .interesting_directories
                .iter()
                .map(|dir| self.old_root.join(dir))
                .collect()
        };

        let mut dbs = Vec::new();
        for search_root in search_roots {
            if !search_root.is_dir() {
                debug!(directory = %search_root.display(), "skipping missing directory");
                continue;
            }

            let ignored = self.settings.ignored_directories.clone();
            let walker = WalkBuilder::new(&search_root)
                .standard_filters(false)
                .filter_entry(move |entry| {
                    let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                    let name = entry.file_name().to_string_lossy();
                    !(entry.depth() > 0 && is_dir && ignored.iter().any(|i| *i == name))
                })
                .build();

            for entry in walker {
                let entry = entry?;
                let is_file = entry.file_type().is_some_and(|t| t.is_file());
                if !is_file || !self.settings.is_db_file(entry.path()) {
                    continue;
                }
                if let Ok(relative) = entry.path().strip_prefix(&self.old_root) {
                    debug!(path = %relative.display(), "found db file");
                    dbs.push(relative.to_path_buf());
                }
            }
        }

        dbs.sort();
        dbs.dedup();
        Ok(dbs)
    }

    /// Db files of the old snapshot missing from the new one.
    pub fn deleted_dbs(&self) -> Result<Vec<PathBuf>, ScanError> {
        Ok(self
            .dbs_in_old()?
            .into_iter()
            .filter(|db| !self.new_root.join(db).exists())
            .collect())
    }

    /// Db files present in both snapshots whose lines differ.
    pub fn modified_dbs(&self) -> Result<Vec<PathBuf>, ScanError> {
        let mut modified = Vec::new();
        for db in self.dbs_in_old()? {
            let new_path = self.new_root.join(&db);
            if !new_path.exists() {
                continue;
            }
            let old_text = fs::read(self.old_root.join(&db))?;
            let new_text = fs::read(&new_path)?;
            if !same_lines(
                &String::from_utf8_lossy(&old_text),
                &String::from_utf8_lossy(&new_text),
            ) {
                modified.push(db);
            }
        }
        Ok(modified)
    }

    /// One report per modified file, then one line per deleted file.
    pub fn change_descriptions(&self) -> Result<Vec<String>, ScanError> {
        let modified = self.modified_dbs()?;
        let deleted = self.deleted_dbs()?;
        info!(
            modified = modified.len(),
            deleted = deleted.len(),
            "scanned snapshots"
        );

        let mut descriptions: Vec<String> = modified
            .iter()
            .filter_map(|db| describe_file_change(&self.old_root.join(db), &self.new_root.join(db)))
            .collect();
        descriptions.extend(
            deleted
                .iter()
                .map(|db| format!("A DB file was deleted from {}", db.display())),
        );
        Ok(descriptions)
    }
}
