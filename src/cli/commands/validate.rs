//! Validate command implementation.
//!
//! Checks the trigger, version file, recipe and environment without
//! performing any release step. Fails when a release could not run.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::docker;
use crate::error::{CliError, Result};
use crate::git;
use crate::recipe::ImageRecipe;
use crate::trigger;
use crate::version;

/// Execute the validate command
pub(super) async fn execute_validate(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Validate { pipeline } = &args.command else {
        unreachable!("execute_validate called with non-Validate command");
    };

    let pipeline_config = pipeline.to_config(&args.repo);

    // Repository and trigger
    if !git::is_repository(&pipeline_config.repo_path) {
        return Err(crate::error::GitError::NotRepository.into());
    }
    config.success_println("Git repository found");

    let decision = trigger::evaluate(
        &pipeline_config.repo_path,
        &pipeline_config.branch,
        &pipeline_config.skip_marker,
    )?;
    match decision.skip_reason() {
        None => config.success_println("Trigger contract satisfied"),
        Some(reason) => config.warning_println(&format!("Trigger would skip: {reason}")),
    }

    // Version file
    let current = version::read_version_file(
        &pipeline_config.repo_path.join(&pipeline_config.version_file),
    )?;
    config.success_println(&format!("Version file parses: {current}"));

    // Recipe contract
    ImageRecipe::default()
        .verify(&pipeline_config.repo_path.join(&pipeline_config.dockerfile))?;
    config.success_println("Recipe honors the image contract");

    // Tooling
    which::which("git").map_err(|_| CliError::ToolNotFound {
        tool: "git".to_string(),
    })?;
    docker::check_docker_available().await?;
    config.success_println("git and docker are available");

    // Credentials (required unless the image will not be pushed)
    if pipeline_config.no_push {
        config.verbose_println("Skipping credential check (--no-push)");
    } else if pipeline.username.is_none() || pipeline.password.is_none() {
        config.warning_println(
            "Registry credentials missing: set DOCKER_USERNAME and DOCKER_PASSWORD",
        );
    } else {
        config.success_println("Registry credentials present");
    }

    config.success_println("Validation complete");
    Ok(())
}
