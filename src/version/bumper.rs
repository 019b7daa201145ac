//! Semantic version bump arithmetic.

use semver::Version;

/// Type of version bump to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum VersionBump {
    /// Increment the major version, reset minor and patch
    Major,
    /// Increment the minor version, reset patch
    Minor,
    /// Increment the patch version (the workflow default)
    #[default]
    Patch,
}

impl VersionBump {
    /// Apply this bump to a version.
    ///
    /// Pre-release and build metadata are dropped, matching the plain
    /// `x.y.z` contents of the version file.
    pub fn apply(self, version: &Version) -> Version {
        match self {
            VersionBump::Major => Version::new(version.major + 1, 0, 0),
            VersionBump::Minor => Version::new(version.major, version.minor + 1, 0),
            VersionBump::Patch => Version::new(version.major, version.minor, version.patch + 1),
        }
    }
}

impl std::fmt::Display for VersionBump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_bump_increments_patch_only() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Patch.apply(&v), Version::new(1, 2, 4));
    }

    #[test]
    fn minor_bump_resets_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Minor.apply(&v), Version::new(1, 3, 0));
    }

    #[test]
    fn major_bump_resets_minor_and_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(VersionBump::Major.apply(&v), Version::new(2, 0, 0));
    }

    #[test]
    fn bump_is_monotonic() {
        let v = Version::new(0, 9, 9);
        for bump in [VersionBump::Major, VersionBump::Minor, VersionBump::Patch] {
            assert!(bump.apply(&v) > v);
        }
    }
}
