//! Build job data model
//!
//! A [`BuildJob`] names one configuration to build, a [`JobResult`] records
//! how it ended.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

fn join_names<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Target operating system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    Darwin,
    Mingw,
}

impl Platform {
    /// Every supported platform, in declaration order
    pub const ALL: [Platform; 4] = [
        Platform::Linux,
        Platform::Windows,
        Platform::Darwin,
        Platform::Mingw,
    ];

    /// Get the platform name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::Darwin => "darwin",
            Platform::Mingw => "mingw",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Platform {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| ConfigurationError::UnsupportedPlatform {
                name: s.to_string(),
                supported: join_names(&Self::ALL),
            })
    }
}

/// Target CPU architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Amd64,
    Arm,
    Arm64,
}

impl Arch {
    /// Every supported architecture, in declaration order
    pub const ALL: [Arch; 4] = [Arch::X86_64, Arch::Amd64, Arch::Arm, Arch::Arm64];

    /// Get the architecture name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Amd64 => "amd64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ConfigurationError::UnsupportedArch {
                name: s.to_string(),
                supported: join_names(&Self::ALL),
            })
    }
}

/// Optimization profile of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    /// Every supported build type, in declaration order
    pub const ALL: [BuildType; 2] = [BuildType::Debug, BuildType::Release];

    /// Get the build type name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            BuildType::Debug => "debug",
            BuildType::Release => "release",
        }
    }

    /// Whether this is a debug build
    pub fn is_debug(&self) -> bool {
        matches!(self, BuildType::Debug)
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| ConfigurationError::UnsupportedBuildType {
                name: s.to_string(),
                supported: join_names(&Self::ALL),
            })
    }
}

/// Build-mode selector given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    /// Debug builds only
    Debug,
    /// Release builds only
    Release,
    /// Debug and release builds
    All,
    /// Debug and release builds across every option combination
    AllOptionsMatrix,
}

impl BuildMode {
    /// Every supported mode
    pub const ALL: [BuildMode; 4] = [
        BuildMode::Debug,
        BuildMode::Release,
        BuildMode::All,
        BuildMode::AllOptionsMatrix,
    ];

    /// Get the mode name as used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
            BuildMode::All => "all",
            BuildMode::AllOptionsMatrix => "all_options_matrix",
        }
    }

    /// Build types selected by this mode
    pub fn build_types(&self) -> Vec<BuildType> {
        match self {
            BuildMode::Debug => vec![BuildType::Debug],
            BuildMode::Release => vec![BuildType::Release],
            BuildMode::All | BuildMode::AllOptionsMatrix => BuildType::ALL.to_vec(),
        }
    }

    /// Whether the option space is expanded
    pub fn is_matrix(&self) -> bool {
        matches!(self, BuildMode::AllOptionsMatrix)
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuildMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigurationError::UnsupportedBuildMode {
                name: s.to_string(),
                supported: join_names(&Self::ALL),
            })
    }
}

/// One option assignment of a matrix job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobOption {
    /// Option (cache variable) name
    pub name: String,
    /// Selected value
    pub value: String,
}

/// One requested configuration
///
/// `options` keeps declaration order and is empty outside matrix mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildJob {
    pub platform: Platform,
    pub arch: Arch,
    pub build_type: BuildType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<JobOption>,
}

impl BuildJob {
    /// Create a job without matrix options
    pub fn new(platform: Platform, arch: Arch, build_type: BuildType) -> Self {
        Self {
            platform,
            arch,
            build_type,
            options: Vec::new(),
        }
    }

    /// Add an option assignment
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(JobOption {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Look up the value selected for an option
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }
}

impl fmt::Display for BuildJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) {}", self.platform, self.arch, self.build_type)?;
        for opt in &self.options {
            write!(f, " {}={}", opt.name, opt.value)?;
        }
        Ok(())
    }
}

/// Terminal outcome of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Every pipeline stage exited with 0
    Success,
    /// A stage exited nonzero, or no toolchain exists
    Failure,
    /// The pipeline faulted before finishing
    Error,
}

/// Outcome of one executed job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub job: BuildJob,
    pub status: JobStatus,
    pub exit_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl JobResult {
    /// Result of a finished pipeline; status follows the exit code
    pub fn from_exit_code(job: BuildJob, exit_code: i32) -> Self {
        let status = if exit_code == 0 {
            JobStatus::Success
        } else {
            JobStatus::Failure
        };
        Self {
            job,
            status,
            exit_code,
            error_detail: None,
        }
    }

    /// Result of a faulted pipeline
    pub fn error(job: BuildJob, exit_code: i32, detail: impl Into<String>) -> Self {
        Self {
            job,
            status: JobStatus::Error,
            exit_code,
            error_detail: Some(detail.into()),
        }
    }

    /// Whether the job succeeded
    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}
