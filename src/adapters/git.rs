//! Git adapter using subprocess mode.
//!
//! Every operation spawns the `git` CLI inside the dashboard repository and
//! collects its output. Non-zero exits surface as version-control errors
//! carrying git's stderr.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::VersionControl;
use crate::domain::{Revision, VersionTag};
use crate::error::{Error, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Git adapter using subprocess mode
pub struct GitCli {
    /// Path to the git binary (default: "git")
    binary_path: String,

    /// Working tree the commands run in
    repo_dir: PathBuf,

    /// Upper bound for a single git invocation
    command_timeout: Duration,
}

impl GitCli {
    /// Create an adapter for the repository at `repo_dir`
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary_path: "git".to_string(),
            repo_dir: repo_dir.into(),
            command_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a custom git binary
    pub fn with_binary_path(mut self, binary_path: impl Into<String>) -> Self {
        self.binary_path = binary_path.into();
        self
    }

    /// Bound every git invocation by `command_timeout`
    pub fn with_timeout(mut self, command_timeout: Duration) -> Self {
        self.command_timeout = command_timeout;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Run git with `args`, returning the raw output whatever the exit status
    async fn execute(&self, args: &[&str]) -> Result<Output> {
        let command = args.join(" ");
        debug!(%command, "running git");

        let child = Command::new(&self.binary_path)
            .args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::VersionControl {
                command: command.clone(),
                stderr: format!("failed to spawn {}: {}", self.binary_path, e),
            })?;

        timeout(self.command_timeout, child.wait_with_output())
            .await
            .map_err(|_| Error::VersionControl {
                command: command.clone(),
                stderr: format!("timed out after {:?}", self.command_timeout),
            })?
            .map_err(|e| Error::VersionControl {
                command,
                stderr: e.to_string(),
            })
    }

    /// Run git with `args` and fail on a non-zero exit
    async fn execute_checked(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.execute(args).await?;

        if !output.status.success() {
            return Err(Error::VersionControl {
                command: args.join(" "),
                stderr: stderr_of(&output),
            });
        }

        Ok(output.stdout)
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Whether git's stderr says the revision or the path at it does not exist
fn names_missing_object(stderr: &str) -> bool {
    const MARKERS: [&str; 6] = [
        "does not exist in",
        "exists on disk, but not in",
        "invalid object name",
        "not a valid object name",
        "unknown revision",
        "bad revision",
    ];

    let stderr = stderr.to_lowercase();
    MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Reject identifiers git would read as an option
fn check_revision(revision: &str) -> Result<()> {
    if revision.is_empty() || revision.starts_with('-') || revision.contains(char::is_whitespace) {
        return Err(Error::Input(format!("invalid revision: {:?}", revision)));
    }
    Ok(())
}

#[async_trait]
impl VersionControl for GitCli {
    fn name(&self) -> &str {
        "git"
    }

    async fn log(&self) -> Result<Vec<Revision>> {
        let args = ["log", "--pretty=format:%h %s"];
        let output = self.execute(&args).await?;

        if !output.status.success() {
            let stderr = stderr_of(&output);
            // A freshly initialised repository has no history yet
            if stderr.contains("does not have any commits yet") {
                return Ok(Vec::new());
            }
            return Err(Error::VersionControl {
                command: args.join(" "),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(Revision::from_log_line)
            .collect())
    }

    async fn show(&self, revision: &str, path: &str) -> Result<Vec<u8>> {
        check_revision(revision)?;

        let object = format!("{}:{}", revision, path);
        let output = self.execute(&["show", &object]).await?;

        if !output.status.success() {
            let stderr = stderr_of(&output);
            if !names_missing_object(&stderr) {
                return Err(Error::VersionControl {
                    command: format!("show {}", object),
                    stderr,
                });
            }
            return Err(Error::NotFound(format!(
                "{} at revision {}: {}",
                path, revision, stderr
            )));
        }

        Ok(output.stdout)
    }

    async fn commit_and_tag(&self, path: &str, message: &str, tag: &VersionTag) -> Result<()> {
        let tag = tag.to_string();

        self.execute_checked(&["add", "--", path]).await?;
        self.execute_checked(&["commit", "-m", message, "--", path])
            .await?;
        self.execute_checked(&["tag", &tag]).await?;

        Ok(())
    }
}
