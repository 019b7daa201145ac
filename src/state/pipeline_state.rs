//! Pipeline state tracking and serialization.

use crate::error::{Result, StateError};
use serde::{Deserialize, Serialize};

/// Current version of the state format
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Complete pipeline run state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    /// Version of the state format
    pub format_version: u32,
    /// Unique ID for this pipeline run
    pub pipeline_id: String,
    /// Image repository being published
    pub image: String,
    /// Version being released (known after the bump phase)
    pub release_version: Option<semver::Version>,
    /// Commit that triggered the run
    pub trigger_commit: String,
    /// Timestamp when the run started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Timestamp when the run was last updated
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Current phase of the pipeline
    pub current_phase: PipelinePhase,
    /// Checkpoints passed during the run
    pub checkpoints: Vec<PipelineCheckpoint>,
    /// Any errors encountered during the run
    pub errors: Vec<PipelineError>,
}

/// Phase of the pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelinePhase {
    /// Initial validation (tools, repository, recipe)
    Validation,
    /// Version file bump
    VersionBump,
    /// Commit and push of the bump
    GitOperations,
    /// Registry authentication
    RegistryLogin,
    /// QEMU emulation and Buildx builder setup
    BuilderSetup,
    /// Multi-architecture build and push
    BuildAndPush,
    /// Post-push registry tag verification
    Verification,
    /// Pipeline completed successfully
    Completed,
    /// Pipeline failed
    Failed,
}

/// Checkpoint in the pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineCheckpoint {
    /// Checkpoint name
    pub name: String,
    /// Phase this checkpoint belongs to
    pub phase: PipelinePhase,
    /// Timestamp when the checkpoint was reached
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Any data associated with this checkpoint
    pub data: Option<serde_json::Value>,
}

/// Error encountered during the run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineError {
    /// Error message
    pub message: String,
    /// Phase where the error occurred
    pub phase: PipelinePhase,
    /// Timestamp when the error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl PipelineState {
    /// Create a new pipeline state
    pub fn new(image: String, trigger_commit: String) -> Self {
        let now = chrono::Utc::now();
        let pipeline_id = format!("release-{}", now.timestamp());

        Self {
            format_version: STATE_FORMAT_VERSION,
            pipeline_id,
            image,
            release_version: None,
            trigger_commit,
            started_at: now,
            updated_at: now,
            current_phase: PipelinePhase::Validation,
            checkpoints: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Add a checkpoint to the state
    pub fn add_checkpoint(
        &mut self,
        name: &str,
        phase: PipelinePhase,
        data: Option<serde_json::Value>,
    ) {
        self.checkpoints.push(PipelineCheckpoint {
            name: name.to_string(),
            phase,
            timestamp: chrono::Utc::now(),
            data,
        });
        self.updated_at = chrono::Utc::now();
    }

    /// Check if a specific phase has been completed
    pub fn has_completed(&self, phase: PipelinePhase) -> bool {
        self.checkpoints.iter().any(|cp| cp.phase == phase)
    }

    /// Set the current phase
    pub fn set_phase(&mut self, phase: PipelinePhase) {
        self.current_phase = phase;
        self.updated_at = chrono::Utc::now();
    }

    /// Record an error
    pub fn add_error(&mut self, message: String, phase: PipelinePhase) {
        self.errors.push(PipelineError {
            message,
            phase,
            timestamp: chrono::Utc::now(),
        });
        self.updated_at = chrono::Utc::now();
    }

    /// Whether the run finished, successfully or not
    pub fn is_finished(&self) -> bool {
        matches!(
            self.current_phase,
            PipelinePhase::Completed | PipelinePhase::Failed
        )
    }

    /// Get elapsed time
    pub fn elapsed_time(&self) -> chrono::Duration {
        self.updated_at - self.started_at
    }

    /// Validate state consistency
    pub fn validate(&self) -> Result<()> {
        if self.format_version != STATE_FORMAT_VERSION {
            return Err(StateError::VersionMismatch {
                expected: STATE_FORMAT_VERSION.to_string(),
                found: self.format_version.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Create a summary of the pipeline state
    pub fn summary(&self) -> String {
        let version = self
            .release_version
            .as_ref()
            .map(|v| format!("v{v}"))
            .unwrap_or_else(|| "(version pending)".to_string());

        format!(
            "Release {} of {} - {} - {} elapsed",
            version,
            self.image,
            self.current_phase,
            format_duration(self.elapsed_time())
        )
    }
}

fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Validation => write!(f, "Validation"),
            PipelinePhase::VersionBump => write!(f, "Version Bump"),
            PipelinePhase::GitOperations => write!(f, "Git Operations"),
            PipelinePhase::RegistryLogin => write!(f, "Registry Login"),
            PipelinePhase::BuilderSetup => write!(f, "Builder Setup"),
            PipelinePhase::BuildAndPush => write!(f, "Build and Push"),
            PipelinePhase::Verification => write!(f, "Verification"),
            PipelinePhase::Completed => write!(f, "Completed"),
            PipelinePhase::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_in_validation() {
        let state = PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string());
        assert_eq!(state.current_phase, PipelinePhase::Validation);
        assert!(!state.is_finished());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn checkpoints_track_completed_phases() {
        let mut state =
            PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string());
        assert!(!state.has_completed(PipelinePhase::VersionBump));

        state.add_checkpoint("version_bumped", PipelinePhase::VersionBump, None);
        assert!(state.has_completed(PipelinePhase::VersionBump));
    }

    #[test]
    fn terminal_phases_finish_the_run() {
        let mut state =
            PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string());
        state.set_phase(PipelinePhase::Completed);
        assert!(state.is_finished());
        state.set_phase(PipelinePhase::Failed);
        assert!(state.is_finished());
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state =
            PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string());
        state.release_version = Some(semver::Version::new(1, 0, 35));
        state.add_checkpoint(
            "build_complete",
            PipelinePhase::BuildAndPush,
            Some(serde_json::json!({"platforms": 7})),
        );

        let json = serde_json::to_string(&state).unwrap();
        let loaded: PipelineState = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.pipeline_id, state.pipeline_id);
        assert_eq!(loaded.release_version, state.release_version);
        assert!(loaded.has_completed(PipelinePhase::BuildAndPush));
        loaded.validate().unwrap();
    }

    #[test]
    fn format_version_mismatch_is_rejected() {
        let mut state =
            PipelineState::new("example/amcrest2mqtt".to_string(), "abc123".to_string());
        state.format_version = 99;
        assert!(state.validate().is_err());
    }
}
