//! Shallow git checkouts of the two release branches being compared.
//!
//! Each branch is cloned into `<work_dir>/<branch>`. A directory that already exists is reused
//! as-is, so repeated runs against the same branches only pay for the clone once.

use dbdiff_config::GitConfig;
use ignore::WalkBuilder;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub enum CheckoutError {
    Io(String),
    /// `git clone` exited unsuccessfully
    Git {
        branch: String,
        status: String,
        stderr: String,
    },
}

impl fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckoutError::Io(msg) => write!(f, "IO error: {}", msg),
            CheckoutError::Git {
                branch,
                status,
                stderr,
            } => write!(
                f,
                "git clone of branch '{}' failed ({}): {}",
                branch,
                status,
                stderr.trim()
            ),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<io::Error> for CheckoutError {
    fn from(err: io::Error) -> Self {
        CheckoutError::Io(err.to_string())
    }
}

impl From<ignore::Error> for CheckoutError {
    fn from(err: ignore::Error) -> Self {
        CheckoutError::Io(err.to_string())
    }
}

/// Repository and clone options for one comparison run.
#[derive(Debug, Clone)]
pub struct GitCheckout {
    pub repository_url: String,
    pub work_dir: PathBuf,
    /// Zero means a full clone
    pub depth: u32,
    pub recurse_submodules: bool,
}

impl From<&GitConfig> for GitCheckout {
    fn from(config: &GitConfig) -> Self {
        GitCheckout {
            repository_url: config.repository_url.clone(),
            work_dir: config.work_dir.clone(),
            depth: config.depth,
            recurse_submodules: config.recurse_submodules,
        }
    }
}

impl GitCheckout {
    pub fn branch_dir(&self, branch: &str) -> PathBuf {
        self.work_dir.join(branch)
    }

    /// Arguments passed to `git`, cloning into the current directory.
    pub fn clone_args(&self, branch: &str, jobs: usize) -> Vec<String> {
        let mut args = vec!["clone".to_string()];
        if self.recurse_submodules {
            args.push("--recurse-submodules".to_string());
        }
        args.extend(["--jobs".to_string(), jobs.to_string()]);
        args.push("--single-branch".to_string());
        if self.depth > 0 {
            args.extend(["--depth".to_string(), self.depth.to_string()]);
        }
        args.extend([
            "--branch".to_string(),
            branch.to_string(),
            self.repository_url.clone(),
            ".".to_string(),
        ]);
        args
    }

    /// Clone `branch` unless its directory is already present.
    pub async fn clone_branch(&self, branch: &str) -> Result<PathBuf, CheckoutError> {
        let directory = self.branch_dir(branch);
        if directory.exists() {
            info!(
                directory = %directory.display(),
                "directory already exists, skipping clone"
            );
            return Ok(directory);
        }

        tokio::fs::create_dir_all(&directory).await?;
        info!(
            url = %self.repository_url,
            branch,
            directory = %directory.display(),
            "cloning"
        );

        let args = self.clone_args(branch, available_jobs());
        debug!(?args, "running git");
        let output = Command::new("git")
            .args(&args)
            .current_dir(&directory)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            // Leave nothing behind that a later run would mistake for a finished clone
            if let Err(err) = tokio::fs::remove_dir_all(&directory).await {
                warn!(directory = %directory.display(), %err, "could not remove failed clone");
            }
            return Err(CheckoutError::Git {
                branch: branch.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        info!(branch, "finished cloning");
        Ok(directory)
    }

    /// Clone both branches concurrently, returning their directories in order.
    pub async fn clone_pair(
        &self,
        old_branch: &str,
        new_branch: &str,
    ) -> Result<(PathBuf, PathBuf), CheckoutError> {
        tokio::try_join!(self.clone_branch(old_branch), self.clone_branch(new_branch))
    }
}

fn available_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Delete the work directory. Git marks some object files read-only, so on a permission
/// failure every entry is made writable and removal is retried once.
pub fn remove_work_dir(path: &Path) -> Result<(), CheckoutError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::PermissionDenied => {
            debug!(directory = %path.display(), "clearing read-only attributes");
            clear_readonly(path)?;
            fs::remove_dir_all(path)?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(root: &Path) -> Result<(), CheckoutError> {
    for entry in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = entry?;
        let metadata = entry.path().symlink_metadata()?;
        if metadata.file_type().is_symlink() {
            continue;
        }
        let mut permissions = metadata.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}
