//! Toolchain file selection
//!
//! Picks the CMake toolchain file for a (host, target) pair. Windows and
//! darwin hosts only build natively; linux hosts also cross-compile for
//! windows and mingw through the mingw toolchain.

use std::path::{Path, PathBuf};

use crate::config::defaults::TOOLCHAINS_SUBDIR;
use crate::core::executor::{Toolchain, ToolchainLookup};
use crate::core::job::Platform;

/// Toolchain name for a (host, target) pair, `None` if unsupported
pub fn toolchain_name(host: Platform, target: Platform) -> Option<&'static str> {
    match (host, target) {
        (Platform::Windows, Platform::Windows) => Some("windows"),
        (Platform::Darwin, Platform::Darwin) => Some("darwin"),
        (Platform::Linux, Platform::Linux) => Some("linux"),
        (Platform::Linux, Platform::Windows | Platform::Mingw) => Some("mingw"),
        _ => None,
    }
}

/// Toolchain files stored as `<dir>/<name>.cmake`
#[derive(Debug, Clone)]
pub struct CMakeToolchains {
    dir: PathBuf,
}

impl CMakeToolchains {
    /// Toolchain files in an explicit directory
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Toolchain files at their usual place in a source tree
    pub fn in_source(source_dir: &Path) -> Self {
        Self::new(source_dir.join(TOOLCHAINS_SUBDIR))
    }

    /// Get the toolchains directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ToolchainLookup for CMakeToolchains {
    fn lookup(&self, host: Platform, target: Platform) -> Option<Toolchain> {
        let Some(name) = toolchain_name(host, target) else {
            tracing::debug!("Cross compile from {host} to {target} is not supported");
            return None;
        };
        Some(Toolchain {
            name: name.to_string(),
            file: self.dir.join(format!("{name}.cmake")),
        })
    }
}
