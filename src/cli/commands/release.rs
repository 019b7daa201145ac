//! Release command implementation.
//!
//! Runs the full fail-fast pipeline: trigger evaluation, version bump,
//! git commit and push, registry login, builder setup, multi-architecture
//! build and push, and post-push tag verification. Any failed phase aborts
//! the run; no retry, no partial publish.

use crate::cli::{Args, Command, PipelineArgs, RuntimeConfig};
use crate::docker::{self, BuildRequest};
use crate::error::Result;
use crate::git::GitOperations;
use crate::recipe::ImageRecipe;
use crate::registry::{self, Credentials};
use crate::state::{PipelinePhase, PipelineState, StateManager};
use crate::trigger::{self, TriggerDecision};
use crate::version::{self, BumpResult};
use crate::{PipelineConfig, PipelineResult};

/// Execute the release command
pub(super) async fn execute_release(args: &Args, config: &RuntimeConfig) -> Result<i32> {
    let Command::Release { pipeline, dry_run } = &args.command else {
        unreachable!("execute_release called with non-Release command");
    };

    let pipeline_config = pipeline.to_config(&args.repo);

    // Trigger evaluation happens before anything is created or mutated: a
    // suppressed run performs zero pipeline phases and exits 0.
    let decision = trigger::evaluate(
        &pipeline_config.repo_path,
        &pipeline_config.branch,
        &pipeline_config.skip_marker,
    )?;

    let TriggerDecision::Proceed { commit, message } = decision else {
        config.println(&format!(
            "Release skipped: {}",
            decision.skip_reason().unwrap_or_default()
        ));
        return Ok(0);
    };

    config.verbose_println(&format!(
        "Triggered by {}: {}",
        &commit[..12.min(commit.len())],
        message.lines().next().unwrap_or("")
    ));

    if *dry_run {
        print_plan(&pipeline_config, config)?;
        return Ok(0);
    }

    // State is first persisted at the validation checkpoint, after the
    // clean-tree check, so the state file itself never counts as dirt.
    let mut state = PipelineState::new(pipeline_config.image.clone(), commit.clone());
    let mut state_manager = StateManager::new(&config.state_file_path);

    let outcome = run_pipeline(
        &pipeline_config,
        pipeline,
        &mut state,
        &mut state_manager,
        config,
    )
    .await;

    match outcome {
        Ok(result) => {
            state.set_phase(PipelinePhase::Completed);
            state_manager.save_state(&state)?;

            config.success_println(&format!(
                "Released v{} ({} platforms, tags: {})",
                result.version,
                result.platforms_built,
                result.tags.join(", ")
            ));
            Ok(0)
        }
        Err(e) => {
            let phase = state.current_phase;
            state.add_error(e.to_string(), phase);
            state.set_phase(PipelinePhase::Failed);
            // Keep the original error even if the post-mortem save fails
            if let Err(save_err) = state_manager.save_state(&state) {
                log::warn!("Failed to save failure state: {save_err}");
            }
            Err(e)
        }
    }
}

/// Execute the pipeline phases in order, checkpointing after each one.
async fn run_pipeline(
    pipeline_config: &PipelineConfig,
    pipeline_args: &PipelineArgs,
    state: &mut PipelineState,
    state_manager: &mut StateManager,
    config: &RuntimeConfig,
) -> Result<PipelineResult> {
    let repo = &pipeline_config.repo_path;

    // ===== PHASE 1: VALIDATION =====
    config.progress("Validating environment...");

    let git = GitOperations::open(repo)?;
    if !pipeline_config.allow_dirty {
        git.ensure_clean()?;
    }

    ImageRecipe::default().verify(&repo.join(&pipeline_config.dockerfile))?;
    docker::check_docker_available().await?;

    state.add_checkpoint("validation_complete", PipelinePhase::Validation, None);
    state_manager.save_state(state)?;
    config.success_println("Environment validated");

    // ===== PHASE 2: VERSION BUMP =====
    state.set_phase(PipelinePhase::VersionBump);
    config.progress(&format!(
        "Bumping {} version...",
        pipeline_config.bump
    ));

    let bump: BumpResult = version::bump_version_file(
        &repo.join(&pipeline_config.version_file),
        pipeline_config.bump,
    )?;
    let new_version = bump.new.clone();

    state.release_version = Some(new_version.clone());
    state.add_checkpoint(
        "version_bumped",
        PipelinePhase::VersionBump,
        Some(serde_json::json!({
            "previous": bump.previous.to_string(),
            "new": new_version.to_string(),
        })),
    );
    state_manager.save_state(state)?;
    config.success_println(&format!("Version: {} → {}", bump.previous, new_version));

    // ===== PHASE 3: GIT OPERATIONS =====
    state.set_phase(PipelinePhase::GitOperations);
    config.progress("Committing version bump...");

    let bump_commit = git
        .commit_version_bump(
            &pipeline_config.version_file,
            &new_version,
            &pipeline_config.skip_marker,
        )
        .await?;
    config.verbose_println(&format!("Committed: \"{}\"", bump_commit.message));

    if pipeline_config.no_git_push {
        config.warning_println("Skipping git push (--no-git-push)");
    } else {
        git.push(&pipeline_config.branch).await?;
        config.success_println(&format!("Pushed {} to origin", pipeline_config.branch));
    }

    state.add_checkpoint(
        "bump_committed",
        PipelinePhase::GitOperations,
        Some(serde_json::json!({ "commit": bump_commit.sha })),
    );
    state_manager.save_state(state)?;

    // ===== PHASE 4: REGISTRY LOGIN =====
    state.set_phase(PipelinePhase::RegistryLogin);

    let credentials = if pipeline_config.no_push {
        config.verbose_println("Skipping registry login (--no-push)");
        None
    } else {
        let credentials = Credentials::new(
            pipeline_args.username.clone(),
            pipeline_args.password.clone(),
            pipeline_args.registry.clone(),
        )?;
        registry::login(&credentials, config).await?;

        state.add_checkpoint("registry_login", PipelinePhase::RegistryLogin, None);
        state_manager.save_state(state)?;
        Some(credentials)
    };

    // ===== PHASE 5: BUILDER SETUP =====
    state.set_phase(PipelinePhase::BuilderSetup);

    docker::setup_emulation(config).await?;
    docker::ensure_builder(config).await?;

    state.add_checkpoint("builder_ready", PipelinePhase::BuilderSetup, None);
    state_manager.save_state(state)?;

    // ===== PHASE 6: BUILD AND PUSH =====
    state.set_phase(PipelinePhase::BuildAndPush);

    let request = BuildRequest {
        image: pipeline_config.image.clone(),
        version: new_version.clone(),
        platforms: pipeline_config.platforms.clone(),
        context: repo.clone(),
        dockerfile: repo.join(&pipeline_config.dockerfile),
        push: !pipeline_config.no_push,
    };

    docker::run_build(&request, config).await?;

    state.add_checkpoint(
        "build_complete",
        PipelinePhase::BuildAndPush,
        Some(serde_json::json!({
            "tags": request.tags(),
            "platforms": request.platforms.len(),
            "pushed": request.push,
        })),
    );
    state_manager.save_state(state)?;

    // ===== PHASE 7: VERIFICATION =====
    state.set_phase(PipelinePhase::Verification);

    if pipeline_config.no_push || pipeline_config.no_verify {
        config.verbose_println("Skipping registry tag verification");
    } else {
        let registry_host = credentials.as_ref().and_then(|c| c.registry.as_deref());
        registry::verify_tags(
            &pipeline_config.image,
            &request.tags(),
            registry_host,
            config,
        )
        .await?;

        state.add_checkpoint("tags_verified", PipelinePhase::Verification, None);
        state_manager.save_state(state)?;
    }

    if let Some(credentials) = &credentials {
        registry::logout(credentials).await;
    }

    Ok(PipelineResult {
        version: new_version,
        tags: request.tags().to_vec(),
        git_commit: Some(bump_commit.sha),
        pushed: request.push,
        platforms_built: request.platforms.len(),
    })
}

/// Print what a release would do, without mutating anything.
fn print_plan(pipeline_config: &PipelineConfig, config: &RuntimeConfig) -> Result<()> {
    let current = version::read_version_file(
        &pipeline_config.repo_path.join(&pipeline_config.version_file),
    )?;
    let next = pipeline_config.bump.apply(&current);

    config.println("Dry run - no changes will be made\n");
    config.println(&format!("  Image:     {}", pipeline_config.image));
    config.println(&format!("  Version:   {current} → {next}"));
    config.println(&format!(
        "  Tags:      {image}:latest, {image}:{next}",
        image = pipeline_config.image
    ));
    config.println(&format!(
        "  Platforms: {}",
        crate::docker::Platform::join(&pipeline_config.platforms)
    ));
    config.println(&format!(
        "  Push:      {}",
        if pipeline_config.no_push { "no" } else { "yes" }
    ));
    Ok(())
}
