//! Buildx builder management and the multi-architecture build itself.
//!
//! Emulation setup and the builder bootstrap replace the workflow's QEMU and
//! Buildx setup steps. The build invocation is assembled as a plain argv so
//! the tag/label contract can be unit-tested without a Docker daemon.

use crate::cli::RuntimeConfig;
use crate::docker::Platform;
use crate::error::{DockerError, Result};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

/// Name of the Buildx builder instance this tool manages
pub const BUILDER_NAME: &str = "amcrest2mqtt-release-builder";

/// Image used to register binfmt handlers for cross-architecture emulation
pub const BINFMT_IMAGE: &str = "tonistiigi/binfmt";

/// Timeout for the multi-architecture build and push (1 hour)
/// Seven emulated architectures plus registry upload can take a while.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

/// Timeout for builder/emulation setup commands (5 minutes)
pub const SETUP_TIMEOUT: Duration = Duration::from_secs(300);

/// A fully specified multi-architecture build
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Image repository, e.g. `user/amcrest2mqtt`
    pub image: String,
    /// Version tag (the bumped version)
    pub version: semver::Version,
    /// Target platforms
    pub platforms: Vec<Platform>,
    /// Build context directory
    pub context: PathBuf,
    /// Dockerfile path
    pub dockerfile: PathBuf,
    /// Push to the registry after building
    pub push: bool,
}

impl BuildRequest {
    /// The two tags every successful run produces.
    pub fn tags(&self) -> [String; 2] {
        [
            format!("{}:latest", self.image),
            format!("{}:{}", self.image, self.version),
        ]
    }

    /// Assemble the `docker buildx build` argv.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "buildx".to_string(),
            "build".to_string(),
            "--platform".to_string(),
            Platform::join(&self.platforms),
        ];

        for tag in self.tags() {
            args.push("-t".to_string());
            args.push(tag);
        }

        args.push("--label".to_string());
        args.push(format!("version={}", self.version));

        args.push("-f".to_string());
        args.push(self.dockerfile.to_string_lossy().into_owned());

        if self.push {
            args.push("--push".to_string());
        }

        args.push(self.context.to_string_lossy().into_owned());
        args
    }
}

/// Register QEMU binfmt handlers so foreign architectures can be built.
pub async fn setup_emulation(config: &RuntimeConfig) -> Result<()> {
    config.progress("Registering QEMU emulation handlers...");

    run_docker(
        &[
            "run",
            "--privileged",
            "--rm",
            BINFMT_IMAGE,
            "--install",
            "all",
        ],
        "docker run binfmt",
        SETUP_TIMEOUT,
    )
    .await?;

    config.verbose_println("QEMU handlers registered");
    Ok(())
}

/// Ensure the Buildx builder instance exists, is selected and bootstrapped.
pub async fn ensure_builder(config: &RuntimeConfig) -> Result<()> {
    let exists = run_docker(
        &["buildx", "inspect", BUILDER_NAME],
        "docker buildx inspect",
        SETUP_TIMEOUT,
    )
    .await
    .is_ok();

    if exists {
        config.verbose_println(&format!("Reusing Buildx builder '{BUILDER_NAME}'"));
        run_docker(
            &["buildx", "use", BUILDER_NAME],
            "docker buildx use",
            SETUP_TIMEOUT,
        )
        .await?;
    } else {
        config.progress(&format!("Creating Buildx builder '{BUILDER_NAME}'..."));
        run_docker(
            &[
                "buildx",
                "create",
                "--name",
                BUILDER_NAME,
                "--driver",
                "docker-container",
                "--use",
            ],
            "docker buildx create",
            SETUP_TIMEOUT,
        )
        .await?;
    }

    run_docker(
        &["buildx", "inspect", "--bootstrap", BUILDER_NAME],
        "docker buildx inspect --bootstrap",
        SETUP_TIMEOUT,
    )
    .await?;

    config.verbose_println("Buildx builder ready");
    Ok(())
}

/// Run the multi-architecture build, streaming output as it happens.
///
/// Build output goes through the output manager line by line; on timeout the
/// child is killed and reaped before the error is returned.
pub async fn run_build(request: &BuildRequest, config: &RuntimeConfig) -> Result<()> {
    let args = request.to_args();

    config.progress(&format!(
        "Building {} for {} platforms{}...",
        request.image,
        request.platforms.len(),
        if request.push { " and pushing" } else { "" }
    ));

    let mut child = Command::new("docker")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DockerError::CommandFailed {
            command: "docker buildx build".to_string(),
            reason: e.to_string(),
        })?;

    // Buildx writes progress to stderr; stream both pipes
    if let Some(stdout) = child.stdout.take() {
        let output = config.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                output.indent(&line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let output = config.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                output.indent(&line);
            }
        });
    }

    let status = match timeout(BUILD_TIMEOUT, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return Err(DockerError::CommandFailed {
                command: "docker buildx build".to_string(),
                reason: e.to_string(),
            }
            .into());
        }
        Err(_elapsed) => {
            config.warning_println("Build timed out, terminating process...");

            if let Err(e) = child.kill().await {
                log::warn!("Failed to kill docker buildx process: {e}");
            }
            // Reap the child so no zombie is left behind
            let _ = timeout(Duration::from_secs(10), child.wait()).await;

            return Err(DockerError::Timeout {
                command: "docker buildx build".to_string(),
                seconds: BUILD_TIMEOUT.as_secs(),
            }
            .into());
        }
    };

    if !status.success() {
        return Err(DockerError::CommandFailed {
            command: "docker buildx build".to_string(),
            reason: format!("exited with code {}", status.code().unwrap_or(-1)),
        }
        .into());
    }

    config.success_println(&format!(
        "Image built{}: {}",
        if request.push { " and pushed" } else { "" },
        request.tags().join(", ")
    ));
    Ok(())
}

async fn run_docker(args: &[&str], label: &str, limit: Duration) -> Result<()> {
    let output = timeout(
        limit,
        Command::new("docker").args(args).stdin(Stdio::null()).output(),
    )
    .await
    .map_err(|_| DockerError::Timeout {
        command: label.to_string(),
        seconds: limit.as_secs(),
    })?
    .map_err(|e| DockerError::CommandFailed {
        command: label.to_string(),
        reason: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DockerError::CommandFailed {
            command: label.to_string(),
            reason: format!(
                "exited with {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(push: bool) -> BuildRequest {
        BuildRequest {
            image: "example/amcrest2mqtt".to_string(),
            version: semver::Version::new(1, 0, 35),
            platforms: Platform::all().to_vec(),
            context: PathBuf::from("."),
            dockerfile: PathBuf::from("Dockerfile"),
            push,
        }
    }

    #[test]
    fn argv_always_carries_both_tags() {
        let args = request(true).to_args();
        let tags: Vec<&String> = args
            .iter()
            .zip(args.iter().skip(1))
            .filter(|(flag, _)| *flag == "-t")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(
            tags,
            ["example/amcrest2mqtt:latest", "example/amcrest2mqtt:1.0.35"]
        );
    }

    #[test]
    fn argv_carries_version_label() {
        let args = request(true).to_args();
        let label_pos = args.iter().position(|a| a == "--label").unwrap();
        assert_eq!(args[label_pos + 1], "version=1.0.35");
    }

    #[test]
    fn argv_covers_full_platform_matrix() {
        let args = request(true).to_args();
        let platform_pos = args.iter().position(|a| a == "--platform").unwrap();
        assert_eq!(
            args[platform_pos + 1],
            "linux/386,linux/amd64,linux/arm/v6,linux/arm/v7,linux/arm64/v8,linux/ppc64le,linux/s390x"
        );
    }

    #[test]
    fn push_flag_is_present_only_when_pushing() {
        assert!(request(true).to_args().contains(&"--push".to_string()));
        assert!(!request(false).to_args().contains(&"--push".to_string()));
    }

    #[test]
    fn context_is_the_final_argument() {
        let args = request(true).to_args();
        assert_eq!(args.last().map(String::as_str), Some("."));
    }
}
