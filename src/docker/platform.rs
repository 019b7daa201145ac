//! Target platform matrix for the multi-architecture build.

use crate::error::DockerError;
use std::str::FromStr;

/// A target CPU architecture for the published image.
///
/// The variants cover exactly the matrix the publish workflow built, and
/// serialize to the `linux/<arch>` platform strings Buildx expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// 32-bit x86
    I386,
    /// 64-bit x86
    Amd64,
    /// ARMv6 (e.g. Raspberry Pi 1 / Zero)
    ArmV6,
    /// ARMv7 (e.g. Raspberry Pi 2/3 in 32-bit mode)
    ArmV7,
    /// 64-bit ARM
    Arm64V8,
    /// 64-bit little-endian PowerPC
    Ppc64le,
    /// IBM Z
    S390x,
}

impl Platform {
    /// The full build matrix of the publish workflow.
    pub fn all() -> &'static [Platform] {
        &[
            Platform::I386,
            Platform::Amd64,
            Platform::ArmV6,
            Platform::ArmV7,
            Platform::Arm64V8,
            Platform::Ppc64le,
            Platform::S390x,
        ]
    }

    /// Architecture part of the platform string, without the OS prefix.
    pub fn arch(&self) -> &'static str {
        match self {
            Platform::I386 => "386",
            Platform::Amd64 => "amd64",
            Platform::ArmV6 => "arm/v6",
            Platform::ArmV7 => "arm/v7",
            Platform::Arm64V8 => "arm64/v8",
            Platform::Ppc64le => "ppc64le",
            Platform::S390x => "s390x",
        }
    }

    /// Wire form passed to `docker buildx build --platform`.
    pub fn as_buildx(&self) -> String {
        format!("linux/{}", self.arch())
    }

    /// Join platforms into a single `--platform` argument value.
    pub fn join(platforms: &[Platform]) -> String {
        platforms
            .iter()
            .map(Platform::as_buildx)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for Platform {
    type Err = DockerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let arch = s.trim().strip_prefix("linux/").unwrap_or(s.trim());
        match arch {
            "386" | "i386" => Ok(Platform::I386),
            "amd64" | "x86_64" => Ok(Platform::Amd64),
            "arm/v6" => Ok(Platform::ArmV6),
            "arm/v7" => Ok(Platform::ArmV7),
            "arm64/v8" | "arm64" => Ok(Platform::Arm64V8),
            "ppc64le" => Ok(Platform::Ppc64le),
            "s390x" => Ok(Platform::S390x),
            other => Err(DockerError::UnknownPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_buildx())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_covers_the_seven_architectures() {
        let joined = Platform::join(Platform::all());
        assert_eq!(
            joined,
            "linux/386,linux/amd64,linux/arm/v6,linux/arm/v7,linux/arm64/v8,linux/ppc64le,linux/s390x"
        );
    }

    #[test]
    fn parse_accepts_prefixed_and_bare_forms() {
        assert_eq!("linux/arm/v7".parse::<Platform>().unwrap(), Platform::ArmV7);
        assert_eq!("amd64".parse::<Platform>().unwrap(), Platform::Amd64);
        assert_eq!("arm64".parse::<Platform>().unwrap(), Platform::Arm64V8);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for platform in Platform::all() {
            let parsed: Platform = platform.to_string().parse().unwrap();
            assert_eq!(&parsed, platform);
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = "linux/riscv64".parse::<Platform>().unwrap_err();
        assert!(err.to_string().contains("riscv64"));
    }
}
