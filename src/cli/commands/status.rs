//! Status command implementation.
//!
//! Displays the persisted state of the last pipeline run.

use crate::cli::{Args, Command, RuntimeConfig};
use crate::error::{ReleaseError, Result};
use crate::state::StateManager;

/// Execute the status command
pub(super) async fn execute_status(args: &Args, config: &RuntimeConfig) -> Result<()> {
    let Command::Status { detailed, json } = &args.command else {
        unreachable!("execute_status called with non-Status command");
    };

    let mut state_manager = StateManager::new(&config.state_file_path);

    if !state_manager.state_exists() {
        if *json {
            println!("{{\"status\": \"no_pipeline_state\"}}");
        } else {
            config.println("No pipeline state found");
        }
        return Ok(());
    }

    let state = state_manager.load_state()?;

    if *json {
        let json_output = serde_json::to_string_pretty(&state).map_err(ReleaseError::Json)?;
        println!("{}", json_output);
        return Ok(());
    }

    config.println(&format!("📊 {}", state.summary()));

    if *detailed {
        config.println(&format!("Pipeline ID: {}", state.pipeline_id));
        config.println(&format!("Trigger commit: {}", state.trigger_commit));
        config.println(&format!("Started: {}", state.started_at));
        config.println(&format!("Updated: {}", state.updated_at));

        if !state.checkpoints.is_empty() {
            config.println("\nCheckpoints:");
            for checkpoint in &state.checkpoints {
                config.println(&format!("  ✓ {} ({})", checkpoint.name, checkpoint.phase));
            }
        }

        if !state.errors.is_empty() {
            config.println("\nErrors:");
            for error in &state.errors {
                config.println(&format!("  ✗ {} (during {})", error.message, error.phase));
            }
        }
    }

    Ok(())
}
