//! Error types for buildmatrix
//!
//! Domain-specific error types using thiserror.
//!
//! Only [`ConfigurationError`] is allowed to abort a whole run. Build failures
//! and execution faults are captured per job in
//! [`JobResult`](crate::core::job::JobResult) and never surface as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// Problems detected before any job is started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Unknown target platform
    #[error("Unknown platform specified ({name}). Supported: {supported}")]
    UnsupportedPlatform { name: String, supported: String },

    /// Unknown target architecture
    #[error("Unknown architecture specified ({name}). Supported: {supported}")]
    UnsupportedArch { name: String, supported: String },

    /// Unknown build type
    #[error("Unknown build type specified ({name}). Supported: {supported}")]
    UnsupportedBuildType { name: String, supported: String },

    /// Unknown build mode selector
    #[error("Unknown build mode specified ({name}). Supported: {supported}")]
    UnsupportedBuildMode { name: String, supported: String },

    /// The machine running buildmatrix is not a known build host
    #[error("Unknown build host detected: {name}")]
    UnsupportedHost { name: String },

    /// No toolchain can target the platform from this host
    #[error("Compatible toolchain not found for {target} on {host} host")]
    ToolchainNotFound { host: String, target: String },

    /// Matrix option declared without candidate values
    #[error("Matrix option '{name}' has no candidate values")]
    EmptyOptionValues { name: String },

    /// Matrix option name is not a valid cache variable
    #[error("Matrix option '{name}' is not a valid variable name")]
    InvalidOptionName { name: String },

    /// Source directory missing or not a directory
    #[error("Source directory '{}' does not exist", path.display())]
    SourceDirNotFound { path: PathBuf },

    /// Output directory cannot be resolved
    #[error("Invalid output directory '{}': {error}", path.display())]
    OutputDir { path: PathBuf, error: String },

    /// Failed to read settings file
    #[error("Failed to read settings file '{}': {error}", path.display())]
    SettingsRead { path: PathBuf, error: String },

    /// Failed to parse settings file
    #[error("Failed to parse settings file '{}': {error}", path.display())]
    SettingsParse { path: PathBuf, error: String },
}

/// Faults raised while driving the external build pipeline
///
/// These are distinct from a stage returning a nonzero exit code, which is
/// an ordinary build failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The build tool executable could not be located
    #[error("Build tool '{tool}' not found in PATH")]
    ToolNotFound { tool: String },

    /// The build tool could not be launched
    #[error("Failed to launch '{command}': {error}")]
    Launch { command: String, error: String },

    /// A stage was terminated without an exit code (e.g. by a signal)
    #[error("Stage '{stage}' terminated without an exit code")]
    Terminated { stage: String },

    /// Filesystem preparation failed
    #[error("IO error for '{}': {error}", path.display())]
    Io { path: PathBuf, error: String },
}
