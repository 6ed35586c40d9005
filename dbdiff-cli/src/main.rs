//! Command-line interface for dbdiff
//! Reports API-breaking changes between two versions of a set of EPICS database files.
//!
//! Usage:
//!   dbdiff branches --old `<branch>` --new `<branch>`   - Clone two release branches and compare them
//!   dbdiff trees `<old_dir>` `<new_dir>`                - Compare two checked-out trees
//!   dbdiff files `<old.db>` `<new.db>`                  - Compare two db files
//!   dbdiff parse `<file.db>` [--format `<format>`]      - Inspect a parsed db file

mod checkout;
mod logging;

use checkout::GitCheckout;
use clap::{Arg, ArgAction, ArgMatches, Command};
use dbdiff_analysis::{compare_files, FileComparison, ScanSettings, SnapshotPair};
use dbdiff_config::{DbDiffConfig, Loader};
use dbdiff_parser::db::loader::DocumentLoader;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn build_cli() -> Command {
    Command::new("dbdiff")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Detects API-breaking changes between two versions of EPICS db files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .global(true),
        )
        .subcommand(
            Command::new("branches")
                .about("Clone two release branches and report db changes between them")
                .arg(
                    Arg::new("old")
                        .long("old")
                        .help("Branch holding the previous release")
                        .required(true),
                )
                .arg(
                    Arg::new("new")
                        .long("new")
                        .help("Branch holding the new release")
                        .required(true),
                )
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .help("Repository URL (default: git.repository_url from the configuration)"),
                )
                .arg(
                    Arg::new("work-dir")
                        .long("work-dir")
                        .help("Directory the branches are cloned into"),
                )
                .arg(
                    Arg::new("clean")
                        .long("clean")
                        .help("Remove the work directory when done")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("trees")
                .about("Report db changes between two directory trees")
                .arg(Arg::new("old").help("Old tree").required(true).index(1))
                .arg(Arg::new("new").help("New tree").required(true).index(2))
                .arg(
                    Arg::new("everywhere")
                        .long("everywhere")
                        .help("Scan the whole tree instead of the configured interesting directories")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("files")
                .about("Report API changes between two db files")
                .arg(Arg::new("old").help("Old db file").required(true).index(1))
                .arg(Arg::new("new").help("New db file").required(true).index(2)),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a db file and print its contents")
                .arg(Arg::new("path").help("Path to the db file").required(true).index(1))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["summary", "json", "tokens"])
                        .default_value("summary"),
                ),
        )
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let config = load_config(matches.get_one::<String>("config")).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    logging::init(
        &config.logging,
        matches.get_count("verbose"),
        matches.get_flag("quiet"),
    );

    let result = match matches.subcommand() {
        Some(("branches", sub)) => handle_branches_command(sub, &config).await,
        Some(("trees", sub)) => handle_trees_command(sub, &config),
        Some(("files", sub)) => handle_files_command(sub),
        Some(("parse", sub)) => handle_parse_command(sub),
        _ => Err("Unknown command".to_string()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&String>) -> Result<DbDiffConfig, String> {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    loader
        .with_environment()
        .build()
        .map_err(|e| e.to_string())
}

/// Print every change description between two snapshot roots.
fn report_snapshots(old: &Path, new: &Path, settings: ScanSettings) -> Result<(), String> {
    let pair = SnapshotPair::new(old, new, settings).map_err(|e| e.to_string())?;
    let descriptions = pair.change_descriptions().map_err(|e| e.to_string())?;
    if descriptions.is_empty() {
        info!("no changed db files found");
    }
    for description in descriptions {
        println!("{}", description);
    }
    Ok(())
}

/// Handle the branches command
async fn handle_branches_command(matches: &ArgMatches, config: &DbDiffConfig) -> Result<(), String> {
    let old = string_arg(matches, "old")?;
    let new = string_arg(matches, "new")?;
    if old == new {
        return Err("Can't check for changes if old = new".to_string());
    }

    let mut git = GitCheckout::from(&config.git);
    if let Some(repo) = matches.get_one::<String>("repo") {
        git.repository_url = repo.clone();
    }
    if let Some(work_dir) = matches.get_one::<String>("work-dir") {
        git.work_dir = PathBuf::from(work_dir);
    }

    let result = match git.clone_pair(old, new).await {
        Ok((old_dir, new_dir)) => {
            report_snapshots(&old_dir, &new_dir, ScanSettings::from(&config.scan))
        }
        Err(e) => Err(e.to_string()),
    };

    // Clean up even when cloning or scanning failed
    if matches.get_flag("clean") {
        info!(directory = %git.work_dir.display(), "removing work directory");
        if let Err(e) = checkout::remove_work_dir(&git.work_dir) {
            if result.is_ok() {
                return Err(e.to_string());
            }
            warn!(directory = %git.work_dir.display(), error = %e, "could not remove work directory");
        }
    }
    result
}

/// Handle the trees command
fn handle_trees_command(matches: &ArgMatches, config: &DbDiffConfig) -> Result<(), String> {
    let old = string_arg(matches, "old")?;
    let new = string_arg(matches, "new")?;

    let mut settings = ScanSettings::from(&config.scan);
    if matches.get_flag("everywhere") {
        settings.interesting_directories.clear();
    }
    report_snapshots(Path::new(old), Path::new(new), settings)
}

/// Handle the files command
fn handle_files_command(matches: &ArgMatches) -> Result<(), String> {
    let old = string_arg(matches, "old")?;
    let new = string_arg(matches, "new")?;

    match compare_files(Path::new(old), Path::new(new)).map_err(|e| e.to_string())? {
        FileComparison::Identical => info!("files are identical"),
        FileComparison::ApiUnchanged => {
            println!("Files are structurally unchanged, but raw text differs")
        }
        FileComparison::Changed(messages) => {
            for message in messages {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches) -> Result<(), String> {
    let path = string_arg(matches, "path")?;
    let format = string_arg(matches, "format")?;

    let loader = DocumentLoader::from_path(path).map_err(|e| e.to_string())?;
    let formatted = match format {
        "json" => {
            let doc = loader.parse().map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&doc).map_err(|e| format!("Error formatting document: {}", e))?
        }
        "tokens" => {
            let tokens = loader.tokenize().map_err(|e| e.to_string())?;
            serde_json::to_string_pretty(&tokens).map_err(|e| format!("Error formatting tokens: {}", e))?
        }
        _ => {
            let doc = loader.parse().map_err(|e| e.to_string())?;
            doc.iter()
                .map(|record| {
                    format!(
                        "{} {}: {} fields, {} infos, {} aliases",
                        record.record_type,
                        record.name,
                        record.fields.len(),
                        record.infos.len(),
                        record.aliases.len()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    println!("{}", formatted);
    Ok(())
}

fn string_arg<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument: {}", name))
}
