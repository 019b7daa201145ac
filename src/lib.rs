//! # amcrest2mqtt-release
//!
//! Multi-architecture container release pipeline for the amcrest2mqtt bridge.
//!
//! This crate re-implements the project's publish workflow as a local,
//! fail-fast CLI: evaluate the push trigger, bump the version file, commit
//! and push the bump, authenticate to the container registry, then build and
//! push one multi-architecture image tagged both `latest` and the bumped
//! version, carrying a `version` label.
//!
//! ## Features
//!
//! - **Fail-fast pipeline**: any failed phase aborts the run; no retry, no
//!   partial publish
//! - **Skip marker**: a HEAD commit message containing the skip marker
//!   suppresses the whole pipeline
//! - **Git Integration**: read-side repository inspection using gix
//! - **Recipe contract**: the two-stage image recipe is validated before any
//!   mutation happens
//! - **State tracking**: every phase is checkpointed to a JSON state file for
//!   `status` and post-mortem inspection
//!
//! ## Usage
//!
//! ```bash
//! amcrest2mqtt-release release            # bump patch version, build, push
//! amcrest2mqtt-release release --dry-run  # show the plan without mutating
//! amcrest2mqtt-release preview            # trigger decision and next version
//! amcrest2mqtt-release status             # inspect the last pipeline run
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod docker;
pub mod error;
pub mod git;
pub mod recipe;
pub mod registry;
pub mod state;
pub mod trigger;
pub mod version;

// Re-export main types for public API
pub use cli::Args;
pub use docker::{BuildRequest, Platform};
pub use error::{CliError, ReleaseError, Result};
pub use recipe::ImageRecipe;
pub use state::{PipelinePhase, PipelineState, StateManager};
pub use trigger::{TriggerContext, TriggerDecision};
pub use version::{BumpResult, VersionBump};

use std::path::PathBuf;

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Repository root (build context)
    pub repo_path: PathBuf,
    /// Image repository to publish, e.g. `user/amcrest2mqtt`
    pub image: String,
    /// Branch that is allowed to trigger a release
    pub branch: String,
    /// Commit message marker that suppresses the pipeline
    pub skip_marker: String,
    /// Version bump to apply
    pub bump: VersionBump,
    /// Path to the version file, relative to the repository root
    pub version_file: PathBuf,
    /// Path to the Dockerfile, relative to the repository root
    pub dockerfile: PathBuf,
    /// Target platforms for the multi-architecture build
    pub platforms: Vec<Platform>,
    /// Build without pushing the image
    pub no_push: bool,
    /// Skip the post-push registry tag verification
    pub no_verify: bool,
    /// Skip pushing the version bump commit to the git remote
    pub no_git_push: bool,
    /// Allow a dirty working directory
    pub allow_dirty: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            image: String::new(),
            branch: "main".to_string(),
            skip_marker: "[skip ci]".to_string(),
            bump: VersionBump::Patch,
            version_file: PathBuf::from("VERSION"),
            dockerfile: PathBuf::from("Dockerfile"),
            platforms: Platform::all().to_vec(),
            no_push: false,
            no_verify: false,
            no_git_push: false,
            allow_dirty: false,
        }
    }
}

/// Result of a completed pipeline run
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Version that was published
    pub version: semver::Version,
    /// Image tags that were produced
    pub tags: Vec<String>,
    /// Git commit SHA of the version bump (if committed)
    pub git_commit: Option<String>,
    /// Whether the image was pushed to the registry
    pub pushed: bool,
    /// Number of target platforms built
    pub platforms_built: usize,
}
