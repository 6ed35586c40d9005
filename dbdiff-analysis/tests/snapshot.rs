//! Integration tests for scanning two snapshot trees.

use dbdiff_analysis::{ScanError, ScanSettings, SnapshotPair};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Snapshots {
    _dir: TempDir,
    old: PathBuf,
    new: PathBuf,
}

impl Snapshots {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&new).unwrap();
        Snapshots {
            _dir: dir,
            old,
            new,
        }
    }

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn old_file(self, relative: &str, contents: &str) -> Self {
        Self::write(&self.old, relative, contents);
        self
    }

    fn new_file(self, relative: &str, contents: &str) -> Self {
        Self::write(&self.new, relative, contents);
        self
    }

    fn both(self, relative: &str, contents: &str) -> Self {
        self.old_file(relative, contents).new_file(relative, contents)
    }

    fn pair(&self, settings: ScanSettings) -> SnapshotPair {
        SnapshotPair::new(&self.old, &self.new, settings).unwrap()
    }
}

const MOTOR_OLD: &str = "record(motor, \"$(P)MTR\") {\n    field(VELO, \"1\")\n    field(EGU, \"mm\")\n}\n";
const MOTOR_NEW: &str = "record(motor, \"$(P)MTR\") {\n    field(VELO, \"2\")\n}\n";

fn settings(interesting: &[&str], ignored: &[&str]) -> ScanSettings {
    ScanSettings {
        extensions: vec![".db".to_string()],
        ignored_directories: ignored.iter().map(|s| s.to_string()).collect(),
        interesting_directories: interesting.iter().map(PathBuf::from).collect(),
    }
}

#[test]
fn finds_db_files_in_interesting_directories_only() {
    let snapshots = Snapshots::new()
        .both("EPICS/support/motor/Db/motor.db", MOTOR_OLD)
        .both("EPICS/ISIS/lakeshore/Db/temp.db", MOTOR_OLD)
        .both("EPICS/other/stray.db", MOTOR_OLD)
        .both("EPICS/support/motor/Db/README.md", "not a db");

    let pair = snapshots.pair(settings(&["EPICS/support", "EPICS/ISIS"], &[]));

    assert_eq!(
        pair.dbs_in_old().unwrap(),
        vec![
            PathBuf::from("EPICS/ISIS/lakeshore/Db/temp.db"),
            PathBuf::from("EPICS/support/motor/Db/motor.db"),
        ]
    );
}

#[test]
fn skips_ignored_directories() {
    let snapshots = Snapshots::new()
        .both("ioc/Db/keep.db", MOTOR_OLD)
        .both("ioc/O.Common/generated.db", MOTOR_OLD)
        .both("ioc/bin/linux/copy.db", MOTOR_OLD);

    let pair = snapshots.pair(settings(&[], &["O.Common", "bin"]));

    assert_eq!(pair.dbs_in_old().unwrap(), vec![PathBuf::from("ioc/Db/keep.db")]);
}

#[test]
fn missing_interesting_directory_is_skipped() {
    let snapshots = Snapshots::new().both("EPICS/ISIS/a.db", MOTOR_OLD);
    let pair = snapshots.pair(settings(&["EPICS/ioc/master", "EPICS/ISIS"], &[]));
    assert_eq!(pair.dbs_in_old().unwrap(), vec![PathBuf::from("EPICS/ISIS/a.db")]);
}

#[test]
fn reports_deleted_and_modified_files() {
    let snapshots = Snapshots::new()
        .old_file("Db/motor.db", MOTOR_OLD)
        .new_file("Db/motor.db", MOTOR_NEW)
        .old_file("Db/gone.db", MOTOR_OLD)
        .both("Db/same.db", MOTOR_OLD)
        .new_file("Db/added.db", MOTOR_OLD);

    let pair = snapshots.pair(ScanSettings::everywhere());

    assert_eq!(pair.deleted_dbs().unwrap(), vec![PathBuf::from("Db/gone.db")]);
    assert_eq!(pair.modified_dbs().unwrap(), vec![PathBuf::from("Db/motor.db")]);

    let descriptions = pair.change_descriptions().unwrap();
    assert_eq!(descriptions.len(), 2);

    let expected_header = format!(
        "DBs at '{}' and '{}' are different.",
        snapshots.old.join("Db/motor.db").display(),
        snapshots.new.join("Db/motor.db").display()
    );
    let report: Vec<&str> = descriptions[0].lines().collect();
    assert_eq!(
        report,
        vec![
            expected_header.as_str(),
            "  - Field 'VELO' in record '$(P)MTR' changed from '1' to '2'",
            "  - Field removed from record '$(P)MTR': EGU",
        ]
    );
    assert_eq!(
        descriptions[1],
        format!("A DB file was deleted from {}", Path::new("Db/gone.db").display())
    );
}

#[test]
fn whitespace_only_change_is_reported_as_api_unchanged() {
    let snapshots = Snapshots::new()
        .old_file("a.db", MOTOR_OLD)
        .new_file("a.db", &MOTOR_OLD.replace("    ", "\t"));

    let descriptions = snapshots
        .pair(ScanSettings::everywhere())
        .change_descriptions()
        .unwrap();

    assert_eq!(descriptions.len(), 1);
    assert!(descriptions[0].ends_with("are different, but previous API not changed"));
}

#[test]
fn unparsable_file_does_not_abort_the_scan() {
    let snapshots = Snapshots::new()
        .old_file("a.db", MOTOR_OLD)
        .new_file("a.db", "record(motor, \"$(P)MTR\") {\n    field(VELO, 2.5)\n}\n")
        .old_file("b.db", MOTOR_OLD);

    let descriptions = snapshots
        .pair(ScanSettings::everywhere())
        .change_descriptions()
        .unwrap();

    assert_eq!(descriptions.len(), 2);
    assert!(descriptions[0].starts_with("Unable to parse db at "));
    assert!(descriptions[0].contains("because: SyntaxError 2:17"));
    assert!(descriptions[1].starts_with("A DB file was deleted from "));
}

#[test]
fn identical_snapshots_have_no_changes() {
    let snapshots = Snapshots::new()
        .both("a.db", MOTOR_OLD)
        .both("nested/b.db", MOTOR_NEW);

    assert!(snapshots
        .pair(ScanSettings::everywhere())
        .change_descriptions()
        .unwrap()
        .is_empty());
}

#[test]
fn missing_snapshot_root() {
    let dir = TempDir::new().unwrap();
    let err = SnapshotPair::new(dir.path(), dir.path().join("absent"), ScanSettings::everywhere())
        .unwrap_err();
    assert!(matches!(err, ScanError::MissingRoot(_)));
}

#[test]
fn line_ending_change_is_not_a_modification() {
    let snapshots = Snapshots::new()
        .old_file("Db/motor.db", MOTOR_OLD)
        .new_file("Db/motor.db", &MOTOR_OLD.replace('\n', "\r\n"));

    let pair = snapshots.pair(ScanSettings::everywhere());

    assert_eq!(pair.old_root(), snapshots.old.as_path());
    assert_eq!(pair.new_root(), snapshots.new.as_path());
    assert!(pair.modified_dbs().unwrap().is_empty());
    assert!(pair.change_descriptions().unwrap().is_empty());
}
