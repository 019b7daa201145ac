//! Docker integration for the multi-architecture release build.
//!
//! Cross-architecture builds are delegated to Buildx with QEMU emulation,
//! mirroring the publish workflow's QEMU and Buildx setup steps.
//!
//! # Module Structure
//!
//! - `buildx` - builder management and the build/push invocation
//! - `image` - daemon availability checks
//! - `platform` - the target architecture matrix

mod buildx;
mod image;
mod platform;

// Re-export public API
pub use buildx::{
    ensure_builder, run_build, setup_emulation, BuildRequest, BUILDER_NAME, BUILD_TIMEOUT,
};
pub use image::check_docker_available;
pub use platform::Platform;
