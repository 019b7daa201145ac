//! Command line argument parsing and validation.
//!
//! Defaults encode the original publish workflow: release branch `main`,
//! skip marker `[skip ci]`, patch bump, the seven-architecture platform
//! matrix, credentials from the environment.

use crate::docker::Platform;
use crate::state::StateManager;
use crate::version::VersionBump;
use crate::PipelineConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fail-fast multi-architecture container release pipeline
#[derive(Parser, Debug)]
#[command(
    name = "amcrest2mqtt-release",
    version,
    about = "Fail-fast multi-architecture container release pipeline",
    long_about = "Bump the version file, then build and push the amcrest2mqtt \
container image tagged both `latest` and the bumped version.

Usage:
  amcrest2mqtt-release release
  amcrest2mqtt-release release --bump minor --image user/amcrest2mqtt
  amcrest2mqtt-release preview"
)]
pub struct Args {
    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Repository root (also the build context)
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub repo: PathBuf,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Pipeline options shared by `release`, `preview` and `validate`
#[derive(clap::Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Image repository to publish (default: <username>/amcrest2mqtt)
    #[arg(long, value_name = "REPO")]
    pub image: Option<String>,

    /// Branch releases are allowed from
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Commit message marker that suppresses the pipeline
    #[arg(long, default_value = "[skip ci]", value_name = "MARKER")]
    pub skip_marker: String,

    /// Version bump to apply
    #[arg(long, value_enum, default_value_t = VersionBump::Patch)]
    pub bump: VersionBump,

    /// Version file, relative to the repository root
    #[arg(long, default_value = "VERSION", value_name = "FILE")]
    pub version_file: PathBuf,

    /// Dockerfile, relative to the repository root
    #[arg(long, default_value = "Dockerfile", value_name = "FILE")]
    pub dockerfile: PathBuf,

    /// Target platform (repeatable; default: the full seven-arch matrix)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,

    /// Build the image without pushing it
    #[arg(long)]
    pub no_push: bool,

    /// Skip the post-push registry tag verification
    #[arg(long)]
    pub no_verify: bool,

    /// Skip pushing the version bump commit to the git remote
    #[arg(long)]
    pub no_git_push: bool,

    /// Allow releasing from a dirty working directory
    #[arg(long)]
    pub allow_dirty: bool,

    /// Registry username
    #[arg(long, env = "DOCKER_USERNAME", hide_env_values = true)]
    pub username: Option<String>,

    /// Registry password or access token
    #[arg(long, env = "DOCKER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Registry host (default: Docker Hub)
    #[arg(long, env = "DOCKER_REGISTRY")]
    pub registry: Option<String>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the release pipeline
    Release {
        /// Shared pipeline options
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Show the plan and exit without mutating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the trigger decision, next version, tags and recipe
    Preview {
        /// Shared pipeline options
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Check the trigger, recipe and environment without releasing
    Validate {
        /// Shared pipeline options
        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Inspect the state of the last pipeline run
    Status {
        /// Show checkpoints and errors
        #[arg(long)]
        detailed: bool,

        /// Emit the raw state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove persisted pipeline state
    Cleanup,
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Release { .. } => "release",
            Command::Preview { .. } => "preview",
            Command::Validate { .. } => "validate",
            Command::Status { .. } => "status",
            Command::Cleanup => "cleanup",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Release { pipeline, .. }
        | Command::Preview { pipeline }
        | Command::Validate { pipeline } = &self.command
        {
            if pipeline.skip_marker.trim().is_empty() {
                return Err("Skip marker must not be empty".to_string());
            }
            if pipeline.image.is_none() && pipeline.username.is_none() {
                return Err(
                    "No image repository: pass --image or set DOCKER_USERNAME".to_string()
                );
            }
        }

        Ok(())
    }
}

impl PipelineArgs {
    /// Image repository, derived from the username when not given explicitly.
    pub fn resolved_image(&self) -> Option<String> {
        self.image.clone().or_else(|| {
            self.username
                .as_ref()
                .map(|user| format!("{user}/amcrest2mqtt"))
        })
    }

    /// Convert to a pipeline configuration.
    pub fn to_config(&self, repo: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            repo_path: repo.to_path_buf(),
            image: self.resolved_image().unwrap_or_default(),
            branch: self.branch.clone(),
            skip_marker: self.skip_marker.clone(),
            bump: self.bump,
            version_file: self.version_file.clone(),
            dockerfile: self.dockerfile.clone(),
            platforms: if self.platforms.is_empty() {
                Platform::all().to_vec()
            } else {
                self.platforms.clone()
            },
            no_push: self.no_push,
            no_verify: self.no_verify,
            no_git_push: self.no_git_push,
            allow_dirty: self.allow_dirty,
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
    /// Path of the pipeline state file
    pub state_file_path: PathBuf,
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print verbose message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print progress message
    pub fn progress(&self, message: &str) {
        let _ = self.output.progress(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.output.is_quiet()
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self {
            output: super::OutputManager::new(args.verbose, args.quiet),
            state_file_path: StateManager::default_path(&args.repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn release_defaults_match_the_workflow() {
        let args = Args::parse_from(["amcrest2mqtt-release", "release", "--image", "u/a"]);
        if let Command::Release { pipeline, dry_run } = &args.command {
            assert_eq!(pipeline.branch, "main");
            assert_eq!(pipeline.skip_marker, "[skip ci]");
            assert_eq!(pipeline.bump, VersionBump::Patch);
            assert!(pipeline.platforms.is_empty());
            assert!(!dry_run);

            let config = pipeline.to_config(&args.repo);
            assert_eq!(config.platforms, Platform::all().to_vec());
        } else {
            panic!("expected release command");
        }
    }

    #[test]
    fn image_falls_back_to_username() {
        let args = Args::parse_from([
            "amcrest2mqtt-release",
            "release",
            "--username",
            "graham",
            "--password",
            "secret",
        ]);
        if let Command::Release { pipeline, .. } = &args.command {
            assert_eq!(
                pipeline.resolved_image().as_deref(),
                Some("graham/amcrest2mqtt")
            );
        } else {
            panic!("expected release command");
        }
    }

    #[test]
    fn missing_image_and_username_fails_validation() {
        let args = Args::parse_from(["amcrest2mqtt-release", "preview"]);
        if let Command::Preview { pipeline } = &args.command {
            // Environment may provide DOCKER_USERNAME; only assert when it doesn't
            if pipeline.username.is_none() {
                assert!(args.validate().is_err());
            }
        }
    }

    #[test]
    fn explicit_platforms_override_the_matrix() {
        let args = Args::parse_from([
            "amcrest2mqtt-release",
            "release",
            "--image",
            "u/a",
            "--platform",
            "amd64",
            "--platform",
            "linux/arm64/v8",
        ]);
        if let Command::Release { pipeline, .. } = &args.command {
            let config = pipeline.to_config(&args.repo);
            assert_eq!(config.platforms, vec![Platform::Amd64, Platform::Arm64V8]);
        } else {
            panic!("expected release command");
        }
    }
}
