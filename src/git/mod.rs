//! Git operations for the release pipeline.
//!
//! Repository inspection (discovery, dirty check) uses gix; the version bump
//! commit and the push go through the `git` CLI so credential helpers and
//! remote configuration behave exactly as they do for the user.

use crate::error::{CliError, GitError, Result};
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for git push operations (2 minutes)
pub const GIT_PUSH_TIMEOUT: Duration = Duration::from_secs(120);

/// Git operations bound to one repository
#[derive(Debug)]
pub struct GitOperations {
    repo_path: PathBuf,
}

/// Result of committing the version bump
#[derive(Debug, Clone)]
pub struct BumpCommit {
    /// Full commit SHA
    pub sha: String,
    /// Commit message
    pub message: String,
}

impl GitOperations {
    /// Create git operations for the repository at `repo_path`.
    ///
    /// Fails when the path is not inside a git repository or when the `git`
    /// binary is missing.
    pub fn open(repo_path: &Path) -> Result<Self> {
        gix::discover(repo_path).map_err(|_| GitError::NotRepository)?;

        which::which("git").map_err(|_| CliError::ToolNotFound {
            tool: "git".to_string(),
        })?;

        Ok(Self {
            repo_path: repo_path.to_path_buf(),
        })
    }

    /// Fail when the working directory has uncommitted changes.
    pub fn ensure_clean(&self) -> Result<()> {
        let repo = gix::discover(&self.repo_path).map_err(|_| GitError::NotRepository)?;

        let dirty = repo.is_dirty().map_err(|e| GitError::InspectionFailed {
            operation: "status".to_string(),
            reason: e.to_string(),
        })?;

        if dirty {
            return Err(GitError::DirtyWorkingDirectory.into());
        }

        Ok(())
    }

    /// Commit the bumped version file.
    ///
    /// The commit message carries the skip marker so the bump commit itself
    /// never re-triggers the pipeline.
    pub async fn commit_version_bump(
        &self,
        version_file: &Path,
        version: &Version,
        skip_marker: &str,
    ) -> Result<BumpCommit> {
        let message = format!("release: v{version} {skip_marker}");

        let file_arg = version_file.to_string_lossy();
        self.run_git(&["add", "--", file_arg.as_ref()], "git add")
            .await
            .map_err(|reason| GitError::CommitFailed { reason })?;

        self.run_git(&["commit", "-m", &message], "git commit")
            .await
            .map_err(|reason| GitError::CommitFailed { reason })?;

        let sha = self
            .run_git(&["rev-parse", "HEAD"], "git rev-parse")
            .await
            .map_err(|reason| GitError::CommitFailed { reason })?
            .trim()
            .to_string();

        Ok(BumpCommit { sha, message })
    }

    /// Push the release branch to origin.
    pub async fn push(&self, branch: &str) -> Result<()> {
        let args = ["push", "origin", branch];
        let push = self.run_git_with_timeout(&args, "git push", GIT_PUSH_TIMEOUT);

        push.await.map_err(|reason| GitError::PushFailed { reason })?;
        Ok(())
    }

    async fn run_git(
        &self,
        args: &[&str],
        label: &str,
    ) -> std::result::Result<String, String> {
        self.run_git_with_timeout(args, label, Duration::from_secs(30))
            .await
    }

    async fn run_git_with_timeout(
        &self,
        args: &[&str],
        label: &str,
        limit: Duration,
    ) -> std::result::Result<String, String> {
        let output = timeout(
            limit,
            Command::new("git")
                .args(args)
                .current_dir(&self.repo_path)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| format!("{label} timed out after {}s", limit.as_secs()))?
        .map_err(|e| format!("{label} failed to start: {e}"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "{label} exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Convenience check used by `validate`: does the path sit in a repository?
pub fn is_repository(path: &Path) -> bool {
    gix::discover(path).is_ok()
}
