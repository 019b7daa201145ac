//! Preview command implementation.
//!
//! Shows the trigger decision, the next version, the tags that would be
//! produced and the rendered image recipe, without mutating anything.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::docker::Platform;
use crate::error::Result;
use crate::recipe::ImageRecipe;
use crate::trigger;
use crate::version;

/// Execute the preview command
pub(super) async fn execute_preview(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Preview { pipeline } = &args.command else {
        unreachable!("execute_preview called with non-Preview command");
    };

    let pipeline_config = pipeline.to_config(&args.repo);

    let decision = trigger::evaluate(
        &pipeline_config.repo_path,
        &pipeline_config.branch,
        &pipeline_config.skip_marker,
    )?;

    match decision.skip_reason() {
        None => config.success_println("Trigger: would run"),
        Some(reason) => config.warning_println(&format!("Trigger: would skip ({reason})")),
    }

    let version_path = pipeline_config
        .repo_path
        .join(&pipeline_config.version_file);
    match version::read_version_file(&version_path) {
        Ok(current) => {
            let next = pipeline_config.bump.apply(&current);
            config.println(&format!("Version: {current} → {next} ({} bump)", pipeline_config.bump));
            config.println(&format!(
                "Tags:    {image}:latest, {image}:{next}",
                image = pipeline_config.image
            ));
        }
        Err(e) => config.warning_println(&format!("Version file: {e}")),
    }

    config.println(&format!(
        "Platforms ({}): {}",
        pipeline_config.platforms.len(),
        Platform::join(&pipeline_config.platforms)
    ));

    let recipe = ImageRecipe::default();
    let dockerfile = pipeline_config.repo_path.join(&pipeline_config.dockerfile);
    match recipe.verify(&dockerfile) {
        Ok(()) => config.success_println(&format!(
            "Recipe: {} honors the image contract",
            pipeline_config.dockerfile.display()
        )),
        Err(e) => config.warning_println(&format!("Recipe: {e}")),
    }

    if config.is_verbose() {
        config.println("\nReference recipe:");
        for line in recipe.render().lines() {
            config.indent(line);
        }
    }

    Ok(())
}
