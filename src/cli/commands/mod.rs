//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod plan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::output::OutputConfig;
use crate::config::defaults::{DEFAULT_WINDOWS_LLVM_DIR, SETTINGS_FILE_NAME};
use crate::core::enumerator::split_list;
use crate::core::job::BuildMode;
use crate::core::settings::{MatrixSelection, SettingsFile};
use crate::error::ConfigurationError;
use crate::infra::host::{host_arch, host_platform};

/// Which configurations to consider
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Comma-separated target platforms (linux, windows, darwin, mingw) [default: host]
    #[arg(short, long)]
    pub platforms: Option<String>,

    /// Comma-separated target architectures (x86_64, amd64, arm, arm64) [default: host]
    #[arg(short, long)]
    pub archs: Option<String>,

    /// Build mode: debug, release, all, or all_options_matrix
    #[arg(short, long, default_value = "debug")]
    pub mode: String,

    /// Project source directory
    #[arg(short = 'C', long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Settings file [default: <source-dir>/buildmatrix.toml]
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

impl SelectionArgs {
    /// Path of the settings file to read
    pub fn settings_path(&self) -> PathBuf {
        self.settings
            .clone()
            .unwrap_or_else(|| self.source_dir.join(SETTINGS_FILE_NAME))
    }

    /// Resolve names, mode and settings into a selection
    ///
    /// Platform and architecture default to the host's.
    pub fn resolve(&self) -> Result<(MatrixSelection, SettingsFile), ConfigurationError> {
        let settings = SettingsFile::load_from_path(&self.settings_path())?;
        let mode: BuildMode = self.mode.parse()?;

        let platforms = match &self.platforms {
            Some(list) => split_list(list),
            None => vec![host_platform()?.to_string()],
        };
        let archs = match &self.archs {
            Some(list) => split_list(list),
            None => vec![host_arch()?.to_string()],
        };

        let selection = MatrixSelection {
            platforms,
            archs,
            mode,
            option_space: settings.option_space(),
        };
        Ok((selection, settings))
    }
}

/// Options for `buildmatrix build`
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Stop starting new builds after the first failure
    #[arg(long)]
    pub fail_fast: bool,

    /// Build configurations one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Maximum concurrent builds [default: number of CPUs]
    #[arg(short, long, env = "BUILDMATRIX_JOBS", allow_negative_numbers = true)]
    pub jobs: Option<i64>,

    /// Comma-separated extra arguments passed to CMake (e.g. "-DOPTION=VALUE,-DXXX=YYY")
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub extra_args: String,

    /// Do not run clang-tidy during the build
    #[arg(long)]
    pub no_clang_tidy: bool,

    /// Do not build test targets
    #[arg(long)]
    pub no_testing: bool,

    /// Skip the install step
    #[arg(long)]
    pub no_install: bool,

    /// Skip the package step
    #[arg(long)]
    pub no_package: bool,

    /// Output root for build and install trees [default: <source-dir>/out]
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// CMake executable
    #[arg(long, env = "BUILDMATRIX_CMAKE", default_value = "cmake")]
    pub cmake: String,

    /// Additional include directories passed to the project
    #[arg(long, env = "INCLUDE", default_value = "", hide_env_values = true)]
    pub include_dirs: String,

    /// Additional link directories passed to the project
    #[arg(long, env = "LIB", default_value = "", hide_env_values = true)]
    pub link_dirs: String,

    /// LLVM install location (Windows hosts)
    #[arg(long, env = "LLVM_DIR", default_value = DEFAULT_WINDOWS_LLVM_DIR)]
    pub llvm_dir: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every configuration of the matrix
    Build(BuildArgs),

    /// List the configurations a build would run, without building
    Plan(SelectionArgs),
}

impl Commands {
    /// Execute the command and return the process exit code
    pub async fn run(self, output: &OutputConfig) -> Result<i32> {
        match self {
            Commands::Build(args) => build::execute(&args, output).await,
            Commands::Plan(args) => plan::execute(&args, output),
        }
    }
}
