//! Docker daemon availability checks.

use crate::error::{DockerError, ReleaseError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for Docker info check (5 seconds)
/// Quick daemon availability check shouldn't take long
pub const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform-specific Docker startup instructions
#[cfg(target_os = "macos")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from Applications or Spotlight";

#[cfg(target_os = "linux")]
const DOCKER_START_HELP: &str = "Start Docker daemon: sudo systemctl start docker";

#[cfg(target_os = "windows")]
const DOCKER_START_HELP: &str = "Start Docker Desktop from the Start menu";

/// Checks if Docker is installed and the daemon is running.
///
/// # Returns
///
/// * `Ok(())` - Docker is available
/// * `Err` - Docker is not installed or daemon is not running
pub async fn check_docker_available() -> Result<(), ReleaseError> {
    let status_result = timeout(
        DOCKER_INFO_TIMEOUT,
        Command::new("docker")
            .arg("info")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status(),
    )
    .await;

    match status_result {
        // Timeout occurred
        Err(_) => Err(ReleaseError::Docker(DockerError::Unavailable {
            reason: format!(
                "Docker daemon check timed out after {} seconds.\n\
                 \n\
                 This usually means Docker is not responding.\n\
                 {}\n\
                 \n\
                 If Docker is running, check: docker ps",
                DOCKER_INFO_TIMEOUT.as_secs(),
                DOCKER_START_HELP
            ),
        })),

        // Command succeeded
        Ok(Ok(status)) if status.success() => Ok(()),

        // Docker command exists but daemon isn't responding
        Ok(Ok(status)) => {
            let exit_code = status.code().unwrap_or(-1);
            Err(ReleaseError::Docker(DockerError::Unavailable {
                reason: format!(
                    "Docker daemon is not responding (exit code: {}).\n\
                     \n\
                     {}\n\
                     \n\
                     If Docker is installed, ensure the daemon is running.\n\
                     If not installed, visit: https://docs.docker.com/get-docker/",
                    exit_code, DOCKER_START_HELP
                ),
            }))
        }

        // Docker command not found - not installed
        Ok(Err(e)) => Err(ReleaseError::Docker(DockerError::Unavailable {
            reason: format!(
                "Docker command not found: {}\n\
                 \n\
                 Docker does not appear to be installed.\n\
                 Install from: https://docs.docker.com/get-docker/",
                e
            ),
        })),
    }
}
