//! Run settings
//!
//! Reads optional project defaults from `buildmatrix.toml` and combines them
//! with command-line choices into one explicit [`MatrixSelection`]. Nothing
//! in the core reads the environment or global state; the CLI resolves all
//! of that once and passes the result in.
//!
//! ```toml
//! [build]
//! jobs = 4
//! fail_fast = true
//! extra_args = ["-DCMAKE_EXPORT_COMPILE_COMMANDS=ON"]
//!
//! [matrix]
//! ENABLE_LTO = [false, true]
//! SANITIZER = ["address", "thread"]
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::core::enumerator::{default_option_space, enumerate, OptionSpace};
use crate::core::job::{BuildJob, BuildMode};
use crate::error::ConfigurationError;

/// Scalar accepted as a matrix value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum MatrixValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for MatrixValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatrixValue::Bool(b) => write!(f, "{b}"),
            MatrixValue::Int(i) => write!(f, "{i}"),
            MatrixValue::Text(s) => f.write_str(s),
        }
    }
}

/// Default build options from the `[build]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDefaults {
    /// Worker cap
    pub jobs: Option<i64>,

    /// Stop after the first failure
    pub fail_fast: Option<bool>,

    /// Run jobs one by one
    pub sequential: Option<bool>,

    /// Arguments appended to every configure call
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    build: BuildDefaults,
    #[serde(default)]
    matrix: IndexMap<String, Vec<MatrixValue>>,
}

/// Contents of `buildmatrix.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsFile {
    /// `[build]` defaults
    pub build: BuildDefaults,
    /// `[matrix]` option space, empty when not declared
    pub matrix: OptionSpace,
}

impl SettingsFile {
    /// Parse settings from TOML text
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigurationError> {
        let raw: RawSettings =
            toml::from_str(content).map_err(|e| ConfigurationError::SettingsParse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;
        let matrix = raw
            .matrix
            .into_iter()
            .map(|(name, values)| (name, values.iter().map(ToString::to_string).collect()))
            .collect();
        Ok(Self {
            build: raw.build,
            matrix,
        })
    }

    /// Load settings from a file
    ///
    /// A missing file gives the defaults; an unreadable or invalid one is a
    /// configuration error.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            tracing::debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigurationError::SettingsRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        tracing::info!("Loaded settings from {}", path.display());
        Self::from_toml(&content, path)
    }

    /// Option space for matrix mode: the declared one, else the default
    pub fn option_space(&self) -> OptionSpace {
        if self.matrix.is_empty() {
            default_option_space()
        } else {
            self.matrix.clone()
        }
    }
}

/// What to build: requested names plus the build mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSelection {
    /// Requested platform names
    pub platforms: Vec<String>,
    /// Requested architecture names
    pub archs: Vec<String>,
    /// Build-mode selector
    pub mode: BuildMode,
    /// Options expanded in matrix mode
    pub option_space: OptionSpace,
}

impl MatrixSelection {
    /// Build type names selected by the mode
    pub fn build_types(&self) -> Vec<String> {
        self.mode
            .build_types()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Option space actually expanded (empty outside matrix mode)
    pub fn effective_option_space(&self) -> OptionSpace {
        if self.mode.is_matrix() {
            self.option_space.clone()
        } else {
            OptionSpace::new()
        }
    }

    /// Enumerate the jobs of this selection
    pub fn jobs(&self) -> Result<Vec<BuildJob>, ConfigurationError> {
        enumerate(
            &self.platforms,
            &self.archs,
            &self.build_types(),
            &self.effective_option_space(),
        )
    }
}
