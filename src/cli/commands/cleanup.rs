//! Cleanup command implementation.
//!
//! Removes persisted pipeline state and its lock file.

use crate::cli::{Args, RuntimeConfig};
use crate::error::Result;
use crate::state::StateManager;

/// Execute the cleanup command
pub(super) async fn execute_cleanup(_args: &Args, config: &RuntimeConfig) -> Result<()> {
    let mut state_manager = StateManager::new(&config.state_file_path);

    if !state_manager.state_exists() {
        config.println("No pipeline state to clean up");
        return Ok(());
    }

    // Surface what is being thrown away before deleting it
    if let Ok(state) = state_manager.load_state() {
        config.verbose_println(&format!("Removing state: {}", state.summary()));
        if !state.is_finished() {
            config.warning_println(
                "State belongs to an unfinished run; cleaning up anyway",
            );
        }
    }

    state_manager.cleanup_state()?;
    config.success_println("Pipeline state removed");
    Ok(())
}
