//! Host platform detection
//!
//! Only used to pick defaults for `--platforms` and `--archs` and to tell the
//! toolchain lookup which machine the builds run on.

use crate::core::job::{Arch, Platform};
use crate::error::ConfigurationError;

/// Map a Rust `target_os` name to a platform
pub fn platform_from_os(os: &str) -> Option<Platform> {
    match os {
        "linux" => Some(Platform::Linux),
        "windows" => Some(Platform::Windows),
        "macos" => Some(Platform::Darwin),
        _ => None,
    }
}

/// Map a Rust `target_arch` name to an architecture
pub fn arch_from_target(arch: &str) -> Option<Arch> {
    match arch {
        "x86_64" => Some(Arch::X86_64),
        "aarch64" => Some(Arch::Arm64),
        "arm" => Some(Arch::Arm),
        _ => None,
    }
}

/// Platform of the running machine
pub fn host_platform() -> Result<Platform, ConfigurationError> {
    platform_from_os(std::env::consts::OS).ok_or_else(|| ConfigurationError::UnsupportedHost {
        name: std::env::consts::OS.to_string(),
    })
}

/// Architecture of the running machine
pub fn host_arch() -> Result<Arch, ConfigurationError> {
    arch_from_target(std::env::consts::ARCH).ok_or_else(|| ConfigurationError::UnsupportedHost {
        name: format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    })
}
