//! Comprehensive error types for amcrest2mqtt-release operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for amcrest2mqtt-release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all amcrest2mqtt-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Trigger evaluation errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Version management errors
    #[error("Version error: {0}")]
    Version(#[from] VersionError),

    /// Git operation errors
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    /// Container recipe errors
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// Docker / Buildx errors
    #[error("Docker error: {0}")]
    Docker(#[from] DockerError),

    /// Registry authentication and verification errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// State management errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Trigger evaluation errors
#[derive(Error, Debug)]
pub enum TriggerError {
    /// Repository could not be opened
    #[error("Could not open git repository at {path}: {reason}")]
    RepoOpenFailed {
        /// Repository path
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },

    /// HEAD could not be resolved to a commit
    #[error("Could not resolve HEAD to a commit: {reason}")]
    HeadUnresolved {
        /// Reason for the error
        reason: String,
    },
}

/// Version management errors
#[derive(Error, Debug)]
pub enum VersionError {
    /// Version file missing
    #[error("Version file not found at {path}")]
    FileNotFound {
        /// Path where the version file was expected
        path: PathBuf,
    },

    /// Version parsing failed
    #[error("Failed to parse version '{version}': {source}")]
    ParseFailed {
        /// Version string
        version: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// Invalid version progression
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Version string
        version: String,
        /// Reason for the error
        reason: String,
    },

    /// Failed to write the version file
    #[error("Failed to update version file at {path}: {reason}")]
    WriteFailed {
        /// Path to the version file
        path: PathBuf,
        /// Reason for the error
        reason: String,
    },
}

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository. Please initialize git first.")]
    NotRepository,

    /// Working directory not clean
    #[error("Working directory not clean. Please commit or stash changes before releasing.")]
    DirtyWorkingDirectory,

    /// Commit failed
    #[error("Git commit failed: {reason}")]
    CommitFailed {
        /// Reason for the error
        reason: String,
    },

    /// Push failed
    #[error("Git push failed: {reason}")]
    PushFailed {
        /// Reason for the error
        reason: String,
    },

    /// Read-side repository inspection failed
    #[error("Git inspection failed: {operation} - {reason}")]
    InspectionFailed {
        /// Operation that failed
        operation: String,
        /// Reason for the error
        reason: String,
    },
}

/// Container recipe errors
#[derive(Error, Debug)]
pub enum RecipeError {
    /// Dockerfile missing
    #[error("Dockerfile not found at {path}")]
    NotFound {
        /// Path where the Dockerfile was expected
        path: PathBuf,
    },

    /// Recipe violates the image contract
    #[error("Recipe contract violation: {reason}")]
    ContractViolation {
        /// Reason for the error
        reason: String,
    },
}

/// Docker / Buildx errors
#[derive(Error, Debug)]
pub enum DockerError {
    /// Docker daemon unavailable
    #[error("Docker is not available: {reason}")]
    Unavailable {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Docker command failed: {command} - {reason}")]
    CommandFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },

    /// Operation exceeded its timeout
    #[error("Docker command timed out after {seconds}s: {command}")]
    Timeout {
        /// Command that timed out
        command: String,
        /// Timeout in seconds
        seconds: u64,
    },

    /// Unknown target platform
    #[error("Unknown target platform '{platform}'")]
    UnknownPlatform {
        /// Platform string
        platform: String,
    },
}

/// Registry authentication and verification errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Missing credentials
    #[error("Missing registry credentials: set {variable}")]
    MissingCredentials {
        /// Environment variable name
        variable: String,
    },

    /// Login failed
    #[error("Registry login failed: {reason}")]
    LoginFailed {
        /// Reason for the error
        reason: String,
    },

    /// Published tag could not be verified
    #[error("Tag '{tag}' for image '{image}' not found on the registry")]
    TagNotFound {
        /// Image repository
        image: String,
        /// Tag name
        tag: String,
    },

    /// Network error talking to the registry API
    #[error("Registry API error: {reason}")]
    ApiError {
        /// Reason for the error
        reason: String,
    },
}

/// State management errors
#[derive(Error, Debug)]
pub enum StateError {
    /// State file corrupted
    #[error("State file corrupted: {reason}")]
    Corrupted {
        /// Reason for the error
        reason: String,
    },

    /// State file not found
    #[error("State file not found. No release in progress.")]
    NotFound,

    /// State version mismatch
    #[error("State file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version
        expected: String,
        /// Found version
        found: String,
    },

    /// Another process holds the state lock
    #[error("State file is locked by another release process")]
    Locked,

    /// Failed to save state
    #[error("Failed to save state: {reason}")]
    SaveFailed {
        /// Reason for the error
        reason: String,
    },

    /// Failed to load state
    #[error("Failed to load state: {reason}")]
    LoadFailed {
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Required external tool is missing
    #[error("Required tool '{tool}' not found on PATH")]
    ToolNotFound {
        /// Tool name
        tool: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Git(GitError::NotRepository) => vec![
                "Run from within the amcrest2mqtt repository checkout".to_string(),
                "Initialize a repository: git init".to_string(),
            ],
            ReleaseError::Git(GitError::DirtyWorkingDirectory) => vec![
                "Commit pending changes: git add . && git commit -m 'message'".to_string(),
                "Stash changes temporarily: git stash".to_string(),
                "Pass --allow-dirty to release anyway".to_string(),
            ],
            ReleaseError::Docker(DockerError::Unavailable { .. }) => vec![
                "Ensure the Docker daemon is running: docker info".to_string(),
                "Install Docker from https://docs.docker.com/get-docker/".to_string(),
            ],
            ReleaseError::Registry(RegistryError::MissingCredentials { variable }) => vec![
                format!("Export the credential: export {}=...", variable),
                "Docker Hub credentials are read from DOCKER_USERNAME / DOCKER_PASSWORD"
                    .to_string(),
            ],
            ReleaseError::Registry(RegistryError::LoginFailed { .. }) => vec![
                "Verify the username and password are correct".to_string(),
                "Check registry availability: docker login".to_string(),
            ],
            ReleaseError::State(StateError::Locked) => vec![
                "Wait for the other release process to finish".to_string(),
                "If no release is running, remove stale state: amcrest2mqtt-release cleanup"
                    .to_string(),
            ],
            ReleaseError::Version(VersionError::FileNotFound { path }) => vec![format!(
                "Create the version file: echo '1.0.0' > {}",
                path.display()
            )],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            ReleaseError::Git(GitError::NotRepository)
                | ReleaseError::Version(VersionError::ParseFailed { .. })
                | ReleaseError::Version(VersionError::InvalidVersion { .. })
                | ReleaseError::Recipe(RecipeError::ContractViolation { .. })
                | ReleaseError::Docker(DockerError::UnknownPlatform { .. })
        )
    }
}
