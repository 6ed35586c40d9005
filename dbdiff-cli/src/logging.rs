//! Tracing subscriber setup for the binary.

use dbdiff_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Level used when `RUST_LOG` is unset. Each `-v` raises the configured level one step, up to
/// `trace`, and `-q` drops to errors only. A configured filter directive that is not a plain
/// level is replaced by `debug` for `-v` and `trace` for anything more.
pub fn default_level(config: &LoggingConfig, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }
    if verbose == 0 {
        return config.level.clone();
    }
    let configured = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(config.level.trim()));
    let index = match configured {
        Some(index) => index + usize::from(verbose),
        None if verbose == 1 => 3,
        None => 4,
    };
    LEVELS[index.min(LEVELS.len() - 1)].to_string()
}

/// Install the global subscriber. Logs go to stderr so stdout carries only the report.
pub fn init(config: &LoggingConfig, verbose: u8, quiet: bool) {
    let level = default_level(config, verbose, quiet);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when running under a test harness
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
