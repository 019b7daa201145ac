//! Command line interface for amcrest2mqtt-release.
//!
//! This module provides the CLI for the release pipeline, with argument
//! parsing, command execution and user feedback.

mod args;
pub mod commands;
mod output;

pub use args::{Args, Command, PipelineArgs, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use crate::error::Result;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    execute_command(args).await
}
