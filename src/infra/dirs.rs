//! Build and install directory layout
//!
//! Every configuration owns one build directory and one install directory:
//!
//! ```text
//! <out>/build/<platform>-<arch>/<build_type>[/<options-key>]
//! <out>/install/<platform>-<arch>/<build_type>[/<options-key>]
//! ```
//!
//! The `<options-key>` segment only exists for matrix jobs. It is a short
//! SHA-256 digest of the ordered option assignments, so two option
//! combinations of the same platform/arch/build type never share a tree.
//! Paths depend on nothing but the job, which lets reruns reuse them.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::config::defaults::{BUILD_SUBDIR, DEFAULT_OUT_DIR, INSTALL_SUBDIR, OPTIONS_KEY_LEN};
use crate::core::job::BuildJob;

/// Directories owned by one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDirs {
    /// Build tree
    pub build: PathBuf,
    /// Install prefix
    pub install: PathBuf,
}

/// Root of all build and install trees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirs {
    build_root: PathBuf,
    install_root: PathBuf,
}

impl BuildDirs {
    /// Layout under an output root
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            build_root: out_dir.join(BUILD_SUBDIR),
            install_root: out_dir.join(INSTALL_SUBDIR),
        }
    }

    /// Layout under the default output root of a source tree
    pub fn under_source(source_dir: &Path) -> Self {
        Self::new(source_dir.join(DEFAULT_OUT_DIR))
    }

    /// Get the build root
    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    /// Get the install root
    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Directories for one job
    pub fn for_job(&self, job: &BuildJob) -> JobDirs {
        let mut relative = PathBuf::from(format!("{}-{}", job.platform, job.arch))
            .join(job.build_type.name());
        if let Some(key) = options_key(job) {
            relative.push(key);
        }
        JobDirs {
            build: self.build_root.join(&relative),
            install: self.install_root.join(relative),
        }
    }
}

/// Make a path absolute against the current directory
///
/// Build tools run with the source tree as working directory, so every path
/// handed to them must not depend on where buildmatrix was started.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Short stable digest of a job's option assignments
pub fn options_key(job: &BuildJob) -> Option<String> {
    if job.options.is_empty() {
        return None;
    }
    let mut hasher = Sha256::new();
    for opt in &job.options {
        hasher.update(opt.name.as_bytes());
        hasher.update(b"=");
        hasher.update(opt.value.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    Some(digest[..OPTIONS_KEY_LEN].to_string())
}
