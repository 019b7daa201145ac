//! Pipeline state persistence.
//!
//! Each run checkpoints its phases to a JSON file next to the repository so
//! `status` can inspect the last run and a failed run leaves a post-mortem
//! record. The pipeline is fail-fast by contract, so state is diagnostic
//! only; there is no resume.

mod manager;
mod pipeline_state;

pub use manager::{StateManager, STATE_FILE_NAME};
pub use pipeline_state::{
    PipelineCheckpoint, PipelineError, PipelinePhase, PipelineState, STATE_FORMAT_VERSION,
};
