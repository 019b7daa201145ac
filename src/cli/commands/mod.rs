//! Command execution functions coordinating all pipeline operations.

// Submodules
mod cleanup;
mod preview;
mod release;
mod status;
mod validate;

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::Result;

// Import command executors
use cleanup::execute_cleanup;
use preview::execute_preview;
use release::execute_release;
use status::execute_status;
use validate::execute_validate;

/// Execute the main command based on parsed arguments
pub async fn execute_command(args: Args) -> Result<i32> {
    // Validate arguments
    if let Err(validation_error) = args.validate() {
        // Create output for validation errors (never quiet)
        let output = super::OutputManager::new(false, false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(1);
    }

    let config = RuntimeConfig::from(&args);

    match &args.command {
        Command::Release { .. } => {
            // The release command returns its own exit code: 0 covers both a
            // completed publish and an intentionally skipped run
            match execute_release(&args, &config).await {
                Ok(exit_code) => Ok(exit_code),
                Err(e) => {
                    config.error_println(&format!("Command 'release' failed: {}", e));
                    show_suggestions(&e, &config);
                    Ok(1)
                }
            }
        }
        _ => {
            let result = match &args.command {
                Command::Preview { .. } => execute_preview(&args, &config).await,
                Command::Validate { .. } => execute_validate(&args, &config).await,
                Command::Status { .. } => execute_status(&args, &config).await,
                Command::Cleanup => execute_cleanup(&args, &config).await,
                Command::Release { .. } => unreachable!(),
            };

            match result {
                Ok(()) => Ok(0),
                Err(e) => {
                    config.error_println(&format!(
                        "Command '{}' failed: {}",
                        args.command.name(),
                        e
                    ));
                    show_suggestions(&e, &config);
                    Ok(1)
                }
            }
        }
    }
}

fn show_suggestions(error: &crate::error::ReleaseError, config: &RuntimeConfig) {
    let suggestions = error.recovery_suggestions();
    if !suggestions.is_empty() {
        config.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            config.println(&format!("  • {}", suggestion));
        }
    }
}
