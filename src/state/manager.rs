//! State persistence for pipeline runs.
//!
//! State is written atomically (temp file + rename) and guarded by an
//! advisory file lock so two concurrent releases of the same repository
//! cannot interleave.

use crate::error::{Result, StateError};
use crate::state::PipelineState;
use fs2::FileExt;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the pipeline state, relative to the repository root
pub const STATE_FILE_NAME: &str = ".amcrest2mqtt-release.json";

/// State manager for persistent pipeline state
#[derive(Debug)]
pub struct StateManager {
    /// Path to the state file
    state_file_path: PathBuf,
    /// Path to the lock file
    lock_file_path: PathBuf,
    /// Held lock, released on drop
    lock_handle: Option<fs::File>,
}

impl StateManager {
    /// Create a state manager for a state file path
    pub fn new<P: AsRef<Path>>(state_file_path: P) -> Self {
        let state_file_path = state_file_path.as_ref().to_path_buf();
        let lock_file_path = state_file_path.with_extension("lock");

        Self {
            state_file_path,
            lock_file_path,
            lock_handle: None,
        }
    }

    /// Default state file location for a repository
    pub fn default_path(repo_path: &Path) -> PathBuf {
        repo_path.join(STATE_FILE_NAME)
    }

    /// Save pipeline state atomically
    pub fn save_state(&mut self, state: &PipelineState) -> Result<()> {
        self.acquire_lock()?;
        state.validate()?;

        let serialized =
            serde_json::to_string_pretty(state).map_err(|e| StateError::SaveFailed {
                reason: format!("Failed to serialize state: {e}"),
            })?;

        let temp_path = self.state_file_path.with_extension("tmp");
        fs::write(&temp_path, serialized).map_err(|e| StateError::SaveFailed {
            reason: format!("Failed to write temp file: {e}"),
        })?;

        fs::rename(&temp_path, &self.state_file_path).map_err(|e| StateError::SaveFailed {
            reason: format!("Failed to rename temp file: {e}"),
        })?;

        Ok(())
    }

    /// Load pipeline state from disk
    pub fn load_state(&mut self) -> Result<PipelineState> {
        if !self.state_file_path.exists() {
            return Err(StateError::NotFound.into());
        }

        let contents =
            fs::read_to_string(&self.state_file_path).map_err(|e| StateError::LoadFailed {
                reason: format!("Failed to read state file: {e}"),
            })?;

        let state: PipelineState =
            serde_json::from_str(&contents).map_err(|e| StateError::Corrupted {
                reason: format!("Failed to deserialize state: {e}"),
            })?;

        state.validate()?;
        Ok(state)
    }

    /// Check if a state file exists
    pub fn state_exists(&self) -> bool {
        self.state_file_path.exists()
    }

    /// Delete state and lock files
    pub fn cleanup_state(&mut self) -> Result<()> {
        self.lock_handle = None;

        let mut errors = Vec::new();

        if self.state_file_path.exists()
            && let Err(e) = fs::remove_file(&self.state_file_path)
        {
            errors.push(format!("Failed to remove state file: {e}"));
        }

        if self.lock_file_path.exists()
            && let Err(e) = fs::remove_file(&self.lock_file_path)
        {
            errors.push(format!("Failed to remove lock file: {e}"));
        }

        if !errors.is_empty() {
            return Err(StateError::SaveFailed {
                reason: format!("Cleanup errors: {}", errors.join("; ")),
            }
            .into());
        }

        Ok(())
    }

    /// Acquire the advisory lock, failing immediately when another process
    /// holds it.
    fn acquire_lock(&mut self) -> Result<()> {
        if self.lock_handle.is_some() {
            return Ok(());
        }

        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_file_path)
            .map_err(|e| StateError::SaveFailed {
                reason: format!("Failed to open lock file: {e}"),
            })?;

        file.try_lock_exclusive().map_err(|_| StateError::Locked)?;

        self.lock_handle = Some(file);
        Ok(())
    }
}

impl Drop for StateManager {
    fn drop(&mut self) {
        // The flock is released when the handle drops; remove the marker file
        if self.lock_handle.take().is_some() {
            let _ = fs::remove_file(&self.lock_file_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PipelinePhase;
    use tempfile::TempDir;

    fn state() -> PipelineState {
        PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string())
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);

        let mut saved = state();
        saved.set_phase(PipelinePhase::BuildAndPush);

        let mut manager = StateManager::new(&path);
        manager.save_state(&saved).unwrap();
        drop(manager);

        let mut manager = StateManager::new(&path);
        let loaded = manager.load_state().unwrap();
        assert_eq!(loaded.pipeline_id, saved.pipeline_id);
        assert_eq!(loaded.current_phase, PipelinePhase::BuildAndPush);
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);

        let mut manager = StateManager::new(&path);
        manager.save_state(&state()).unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn missing_state_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut manager = StateManager::new(dir.path().join(STATE_FILE_NAME));
        let err = manager.load_state().unwrap_err();
        assert!(err.to_string().contains("No release in progress"));
    }

    #[test]
    fn corrupted_state_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let mut manager = StateManager::new(&path);
        let err = manager.load_state().unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }

    #[test]
    fn cleanup_removes_state_and_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STATE_FILE_NAME);

        let mut manager = StateManager::new(&path);
        manager.save_state(&state()).unwrap();
        manager.cleanup_state().unwrap();

        assert!(!path.exists());
        assert!(!path.with_extension("lock").exists());
    }
}
