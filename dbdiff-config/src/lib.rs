//! Shared configuration loader for the dbdiff toolchain.
//!
//! `defaults/dbdiff.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files and
//! `DBDIFF_*` environment variables on top of those defaults via [`Loader`]
//! before deserializing into [`DbDiffConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/dbdiff.default.toml");

/// Top-level configuration consumed by dbdiff applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DbDiffConfig {
    pub scan: ScanConfig,
    pub git: GitConfig,
    pub logging: LoggingConfig,
}

/// Which files of a snapshot are considered db files.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub extensions: Vec<String>,
    pub ignored_directories: Vec<String>,
    pub interesting_directories: Vec<PathBuf>,
}

/// Where and how release branches are checked out.
#[derive(Debug, Clone, Deserialize)]
pub struct GitConfig {
    pub repository_url: String,
    pub work_dir: PathBuf,
    pub depth: u32,
    pub recurse_submodules: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer `DBDIFF_*` environment variables, e.g. `DBDIFF_GIT__DEPTH=5`.
    pub fn with_environment(mut self) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix("DBDIFF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<DbDiffConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DbDiffConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.scan.extensions, vec![".db".to_string()]);
        assert!(config
            .scan
            .ignored_directories
            .iter()
            .any(|dir| dir == "O.Common"));
        assert_eq!(
            config.scan.interesting_directories[0],
            PathBuf::from("EPICS/ioc/master")
        );
        assert_eq!(config.git.depth, 1);
        assert!(config.git.recurse_submodules);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("git.repository_url", "https://example.org/epics.git")
            .expect("override to apply")
            .set_override("git.depth", 3i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.git.repository_url, "https://example.org/epics.git");
        assert_eq!(config.git.depth, 3);
    }

    #[test]
    fn layers_user_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[scan]\nextensions = [\".db\", \".template\"]\n\n[git]\ndepth = 7"
        )
        .expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.scan.extensions, vec![".db", ".template"]);
        assert_eq!(config.git.depth, 7);
        // Untouched keys keep their defaults
        assert_eq!(config.git.work_dir, PathBuf::from("dbdiff-work"));
    }

    #[test]
    fn missing_required_file_is_an_error() {
        assert!(Loader::new()
            .with_file("/nonexistent/dbdiff.toml")
            .build()
            .is_err());
    }

    #[test]
    fn missing_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/dbdiff.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.git.depth, 1);
    }
}
