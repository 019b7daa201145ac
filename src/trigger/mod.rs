//! Trigger evaluation for the release pipeline.
//!
//! Mirrors the push-to-main contract: the pipeline runs for the head commit
//! of the release branch unless its commit message carries the skip marker.
//! Anything else (wrong branch, detached HEAD, skip marker) suppresses the
//! run without treating it as a failure.

use crate::error::{Result, TriggerError};
use gix::bstr::ByteSlice;
use std::path::Path;

/// Context gathered from the repository HEAD
#[derive(Debug, Clone)]
pub struct TriggerContext {
    /// Full commit SHA of HEAD
    pub commit: String,
    /// Commit message of HEAD
    pub message: String,
    /// Branch HEAD points at, if not detached
    pub branch: Option<String>,
}

/// Outcome of trigger evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    /// Pipeline should run for this commit
    Proceed {
        /// Full commit SHA
        commit: String,
        /// Commit message
        message: String,
    },
    /// Commit message contains the skip marker
    SkipMarker {
        /// The marker that matched
        marker: String,
    },
    /// HEAD is not on the release branch
    WrongBranch {
        /// Branch HEAD is on
        current: String,
        /// Branch releases are allowed from
        expected: String,
    },
    /// HEAD is detached, no branch to compare against
    DetachedHead,
}

impl TriggerDecision {
    /// Whether the pipeline should run
    pub fn should_run(&self) -> bool {
        matches!(self, TriggerDecision::Proceed { .. })
    }

    /// Human-readable reason for a suppressed run
    pub fn skip_reason(&self) -> Option<String> {
        match self {
            TriggerDecision::Proceed { .. } => None,
            TriggerDecision::SkipMarker { marker } => {
                Some(format!("commit message contains '{marker}'"))
            }
            TriggerDecision::WrongBranch { current, expected } => {
                Some(format!("HEAD is on '{current}', releases run from '{expected}'"))
            }
            TriggerDecision::DetachedHead => Some("HEAD is detached".to_string()),
        }
    }
}

/// Read the HEAD commit and branch from the repository at `repo_path`.
pub fn read_head(repo_path: &Path) -> Result<TriggerContext> {
    let repo = gix::discover(repo_path).map_err(|e| TriggerError::RepoOpenFailed {
        path: repo_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let commit = repo
        .head_commit()
        .map_err(|e| TriggerError::HeadUnresolved {
            reason: e.to_string(),
        })?;

    let message = commit.message_raw_sloppy().to_str_lossy().into_owned();
    let sha = commit.id().to_string();

    let branch = repo
        .head_name()
        .map_err(|e| TriggerError::HeadUnresolved {
            reason: e.to_string(),
        })?
        .map(|name| name.shorten().to_str_lossy().into_owned());

    Ok(TriggerContext {
        commit: sha,
        message,
        branch,
    })
}

/// Evaluate the trigger contract against a HEAD context.
///
/// The skip marker match is a case-insensitive substring match, same as the
/// original workflow's commit message check.
pub fn evaluate_context(
    ctx: &TriggerContext,
    expected_branch: &str,
    skip_marker: &str,
) -> TriggerDecision {
    let current = match &ctx.branch {
        Some(branch) => branch.clone(),
        None => return TriggerDecision::DetachedHead,
    };

    if current != expected_branch {
        return TriggerDecision::WrongBranch {
            current,
            expected: expected_branch.to_string(),
        };
    }

    if ctx
        .message
        .to_lowercase()
        .contains(&skip_marker.to_lowercase())
    {
        return TriggerDecision::SkipMarker {
            marker: skip_marker.to_string(),
        };
    }

    TriggerDecision::Proceed {
        commit: ctx.commit.clone(),
        message: ctx.message.clone(),
    }
}

/// Evaluate the trigger contract for the repository at `repo_path`.
pub fn evaluate(repo_path: &Path, expected_branch: &str, skip_marker: &str) -> Result<TriggerDecision> {
    let ctx = read_head(repo_path)?;
    Ok(evaluate_context(&ctx, expected_branch, skip_marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(branch: Option<&str>, message: &str) -> TriggerContext {
        TriggerContext {
            commit: "a".repeat(40),
            message: message.to_string(),
            branch: branch.map(|b| b.to_string()),
        }
    }

    #[test]
    fn push_to_main_without_marker_proceeds() {
        let decision = evaluate_context(&ctx(Some("main"), "add doorbell sensor"), "main", "[skip ci]");
        assert!(decision.should_run());
        assert!(decision.skip_reason().is_none());
    }

    #[test]
    fn skip_marker_suppresses_run() {
        let decision = evaluate_context(
            &ctx(Some("main"), "docs tweak [skip ci]"),
            "main",
            "[skip ci]",
        );
        assert_eq!(
            decision,
            TriggerDecision::SkipMarker {
                marker: "[skip ci]".to_string()
            }
        );
        assert!(!decision.should_run());
    }

    #[test]
    fn skip_marker_match_is_case_insensitive() {
        let decision = evaluate_context(&ctx(Some("main"), "tweak [SKIP CI]"), "main", "[skip ci]");
        assert!(!decision.should_run());
    }

    #[test]
    fn marker_in_middle_of_message_matches() {
        let decision = evaluate_context(
            &ctx(Some("main"), "release: v1.0.1 [skip ci]\n\nautomated bump"),
            "main",
            "[skip ci]",
        );
        assert!(!decision.should_run());
    }

    #[test]
    fn wrong_branch_suppresses_run() {
        let decision = evaluate_context(&ctx(Some("develop"), "wip"), "main", "[skip ci]");
        assert_eq!(
            decision,
            TriggerDecision::WrongBranch {
                current: "develop".to_string(),
                expected: "main".to_string()
            }
        );
    }

    #[test]
    fn detached_head_suppresses_run() {
        let decision = evaluate_context(&ctx(None, "anything"), "main", "[skip ci]");
        assert_eq!(decision, TriggerDecision::DetachedHead);
    }
}
