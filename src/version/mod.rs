//! Version file management for releases.
//!
//! The released version lives in a plain `VERSION` file in the repository
//! root. Each qualifying push bumps it; the bumped value becomes the image
//! tag and the `version` label.

mod bumper;

pub use bumper::VersionBump;

use crate::error::{Result, VersionError};
use semver::Version;
use std::path::{Path, PathBuf};

/// Result of bumping the version file
#[derive(Debug, Clone)]
pub struct BumpResult {
    /// Version before the bump
    pub previous: Version,
    /// Version after the bump
    pub new: Version,
    /// Path of the file that was modified
    pub path: PathBuf,
}

/// Read and parse the version file.
///
/// A leading `v` prefix and surrounding whitespace are tolerated, so both
/// `1.0.34` and `v1.0.34\n` parse to the same version.
pub fn read_version_file(path: &Path) -> Result<Version> {
    if !path.exists() {
        return Err(VersionError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw = std::fs::read_to_string(path)?;
    parse_version(&raw)
}

/// Parse a version file's contents.
pub fn parse_version(raw: &str) -> Result<Version> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('v').unwrap_or(trimmed);

    let version = Version::parse(stripped).map_err(|e| VersionError::ParseFailed {
        version: trimmed.to_string(),
        source: e,
    })?;

    if !version.pre.is_empty() || !version.build.is_empty() {
        return Err(VersionError::InvalidVersion {
            version: trimmed.to_string(),
            reason: "version file must contain a plain x.y.z version".to_string(),
        }
        .into());
    }

    Ok(version)
}

/// Bump the version file and return both the previous and new versions.
///
/// The write is atomic (temp file + rename) so a failed run never leaves a
/// half-written version file behind.
pub fn bump_version_file(path: &Path, bump: VersionBump) -> Result<BumpResult> {
    let previous = read_version_file(path)?;
    let new = bump.apply(&previous);

    // Invariant enforced by the bump arithmetic, checked anyway before
    // anything is written to disk.
    if new <= previous {
        return Err(VersionError::InvalidVersion {
            version: new.to_string(),
            reason: format!("new version must be greater than current version '{previous}'"),
        }
        .into());
    }

    write_version_file(path, &new)?;

    Ok(BumpResult {
        previous,
        new,
        path: path.to_path_buf(),
    })
}

/// Write a version to the version file atomically.
pub fn write_version_file(path: &Path, version: &Version) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    std::fs::write(&temp_path, format!("{version}\n")).map_err(|e| VersionError::WriteFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to write temp file: {e}"),
    })?;

    std::fs::rename(&temp_path, path).map_err(|e| VersionError::WriteFailed {
        path: path.to_path_buf(),
        reason: format!("Failed to rename temp file: {e}"),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_plain_version() {
        assert_eq!(parse_version("1.0.34").unwrap(), Version::new(1, 0, 34));
    }

    #[test]
    fn parses_prefixed_and_newline_terminated_version() {
        assert_eq!(parse_version("v1.0.34\n").unwrap(), Version::new(1, 0, 34));
    }

    #[test]
    fn rejects_prerelease_versions() {
        assert!(parse_version("1.0.0-beta.1").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_version("not a version").is_err());
    }

    #[test]
    fn bump_rewrites_file_monotonically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        std::fs::write(&path, "1.0.34\n").unwrap();

        let result = bump_version_file(&path, VersionBump::Patch).unwrap();
        assert_eq!(result.previous, Version::new(1, 0, 34));
        assert_eq!(result.new, Version::new(1, 0, 35));
        assert!(result.new > result.previous);

        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "1.0.35\n");
    }

    #[test]
    fn bump_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        std::fs::write(&path, "0.1.0").unwrap();

        bump_version_file(&path, VersionBump::Minor).unwrap();
        assert!(!dir.path().join("VERSION.tmp").exists());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = read_version_file(&dir.path().join("VERSION")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
