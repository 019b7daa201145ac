//! Container registry authentication and post-push verification.
//!
//! Login shells out to `docker login` with the password on stdin so the
//! secret never appears on an argv. Verification asks the Docker Hub tags API
//! whether both produced tags actually exist after the push.

use crate::cli::RuntimeConfig;
use crate::error::{RegistryError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for registry login (1 minute)
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for a single tag verification request
pub const VERIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Registry credentials consumed from the environment
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Registry username
    pub username: String,
    /// Registry password or access token
    pub password: String,
    /// Registry host; `None` means Docker Hub
    pub registry: Option<String>,
}

impl Credentials {
    /// Build credentials, failing with the offending variable name when a
    /// secret is missing.
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        registry: Option<String>,
    ) -> Result<Self> {
        let username = username.ok_or(RegistryError::MissingCredentials {
            variable: "DOCKER_USERNAME".to_string(),
        })?;
        let password = password.ok_or(RegistryError::MissingCredentials {
            variable: "DOCKER_PASSWORD".to_string(),
        })?;

        Ok(Self {
            username,
            password,
            registry,
        })
    }
}

/// Authenticate to the container registry.
pub async fn login(credentials: &Credentials, config: &RuntimeConfig) -> Result<()> {
    let target = credentials
        .registry
        .clone()
        .unwrap_or_else(|| "Docker Hub".to_string());
    config.progress(&format!("Logging in to {target}..."));

    let mut command = Command::new("docker");
    command.arg("login");
    if let Some(registry) = &credentials.registry {
        command.arg(registry);
    }
    command
        .args(["--username", &credentials.username, "--password-stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|e| RegistryError::LoginFailed {
        reason: e.to_string(),
    })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(credentials.password.as_bytes())
            .await
            .map_err(|e| RegistryError::LoginFailed {
                reason: format!("failed to write password to stdin: {e}"),
            })?;
        // Close stdin so docker login stops reading
        drop(stdin);
    }

    let output = timeout(LOGIN_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| RegistryError::LoginFailed {
            reason: format!("login timed out after {}s", LOGIN_TIMEOUT.as_secs()),
        })?
        .map_err(|e| RegistryError::LoginFailed {
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RegistryError::LoginFailed {
            reason: stderr.trim().to_string(),
        }
        .into());
    }

    config.success_println("Registry login succeeded");
    Ok(())
}

/// Log out from the registry. Best-effort: failures are logged, not raised.
pub async fn logout(credentials: &Credentials) {
    let mut command = Command::new("docker");
    command.arg("logout");
    if let Some(registry) = &credentials.registry {
        command.arg(registry);
    }

    match command.output().await {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            log::warn!(
                "docker logout exited with {}",
                output.status.code().unwrap_or(-1)
            );
        }
        Err(e) => log::warn!("docker logout failed to start: {e}"),
    }
}

/// Verify that every produced tag exists on the registry after the push.
///
/// Only Docker Hub exposes the public tags API this uses; for custom
/// registries verification is skipped with a note.
pub async fn verify_tags(
    image: &str,
    tags: &[String],
    registry: Option<&str>,
    config: &RuntimeConfig,
) -> Result<()> {
    if registry.is_some() {
        config.verbose_println("Custom registry configured, skipping tag verification");
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .timeout(VERIFY_TIMEOUT)
        .build()
        .map_err(|e| RegistryError::ApiError {
            reason: e.to_string(),
        })?;

    for tag in tags {
        let tag_name = tag.rsplit(':').next().unwrap_or(tag);
        let url = format!("https://hub.docker.com/v2/repositories/{image}/tags/{tag_name}");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::ApiError {
                reason: e.to_string(),
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RegistryError::TagNotFound {
                image: image.to_string(),
                tag: tag_name.to_string(),
            }
            .into());
        }

        if !response.status().is_success() {
            return Err(RegistryError::ApiError {
                reason: format!("unexpected status {} for {url}", response.status()),
            }
            .into());
        }

        config.verbose_println(&format!("Verified tag: {tag}"));
    }

    config.success_println(&format!("All {} tags verified on the registry", tags.len()));
    Ok(())
}
