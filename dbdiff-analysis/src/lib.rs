//! Change analysis over whole snapshots of db files.
//!
//! [comparison] compares one file against its older version and phrases the result,
//! [snapshot] finds the db files of two snapshot trees and reports what was modified or
//! deleted between them.

pub mod comparison;
pub mod snapshot;

pub use comparison::{compare_files, describe_file_change, FileComparison};
pub use snapshot::{ScanError, ScanSettings, SnapshotPair};
