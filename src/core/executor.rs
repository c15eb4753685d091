//! Single-job execution
//!
//! [`JobExecutor::execute`] turns one [`BuildJob`] into exactly one
//! [`JobResult`]. Toolchain lookup and the build pipeline are collaborators
//! behind traits so the executor never touches a real build tool in tests.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::defaults::{
    DEFAULT_WINDOWS_LLVM_DIR, EXECUTION_FAULT_EXIT, TOOLCHAIN_NOT_FOUND_EXIT,
};
use crate::core::job::{BuildJob, JobResult, Platform};
use crate::error::{ConfigurationError, PipelineError};
use crate::infra::dirs::{BuildDirs, JobDirs};

/// Toolchain usable for one (host, target) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Short toolchain name (e.g. "mingw")
    pub name: String,
    /// Toolchain file handed to the build tool
    pub file: PathBuf,
}

/// Finds a toolchain for a target platform
pub trait ToolchainLookup: Send + Sync {
    /// `None` when the host cannot build for `target`
    fn lookup(&self, host: Platform, target: Platform) -> Option<Toolchain>;
}

/// Everything the external pipeline needs for one configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRequest {
    /// Project source directory
    pub source_dir: PathBuf,
    /// Per-configuration build and install directories
    pub dirs: JobDirs,
    /// Cache variable definitions, in order
    pub definitions: Vec<(String, String)>,
    /// Arguments appended verbatim after the definitions
    pub extra_args: Vec<String>,
    /// Let the build tool parallelize internally
    pub parallel: bool,
    /// Run the install stage
    pub install: bool,
    /// Run the package stage
    pub package: bool,
}

impl PipelineRequest {
    /// Look up a definition by name
    pub fn definition(&self, name: &str) -> Option<&str> {
        self.definitions
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Configure, build, and optionally install and package one configuration
///
/// Implementations block until done and stop at the first stage with a
/// nonzero exit code, returning that code unchanged. `Err` is reserved for
/// faults where no stage could report a code at all.
pub trait BuildPipeline: Send + Sync {
    fn run(&self, request: &PipelineRequest) -> Result<i32, PipelineError>;
}

/// Inputs shared by every job of a run
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Platform of the machine running the builds
    pub host: Platform,
    /// Project source directory
    pub source_dir: PathBuf,
    /// Output directory layout
    pub dirs: BuildDirs,
    /// Run clang-tidy during the build
    pub clang_tidy: bool,
    /// Build test targets
    pub build_testing: bool,
    /// Let the build tool parallelize internally
    pub parallel_build: bool,
    /// Run the install stage
    pub install: bool,
    /// Run the package stage
    pub package: bool,
    /// Passthrough arguments appended to every job
    pub extra_args: Vec<String>,
    /// Additional include directories (from `INCLUDE`)
    pub include_dirs: String,
    /// Additional link directories (from `LIB`)
    pub link_dirs: String,
    /// LLVM install location, used on Windows hosts
    pub llvm_dir: PathBuf,
}

impl ExecutorSettings {
    /// Settings with the default flags for a project
    pub fn new(host: Platform, source_dir: PathBuf) -> Self {
        let dirs = BuildDirs::under_source(&source_dir);
        Self {
            host,
            source_dir,
            dirs,
            clang_tidy: true,
            build_testing: true,
            parallel_build: true,
            install: true,
            package: true,
            extra_args: Vec::new(),
            include_dirs: String::new(),
            link_dirs: String::new(),
            llvm_dir: PathBuf::from(DEFAULT_WINDOWS_LLVM_DIR),
        }
    }

    /// Use a different output layout
    #[must_use]
    pub fn with_dirs(mut self, dirs: BuildDirs) -> Self {
        self.dirs = dirs;
        self
    }

    /// Append passthrough arguments
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args.extend(args);
        self
    }

    /// Skip the install and package stages
    #[must_use]
    pub fn build_only(mut self) -> Self {
        self.install = false;
        self.package = false;
        self
    }
}

/// Boolean literals become `TRUE`/`FALSE`; anything else passes unchanged
pub fn option_value(value: &str) -> String {
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        value.to_ascii_uppercase()
    } else {
        value.to_string()
    }
}

fn flag(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "build pipeline panicked".to_string()
    }
}

/// Runs build jobs one at a time
pub struct JobExecutor {
    settings: ExecutorSettings,
    toolchains: Arc<dyn ToolchainLookup>,
    pipeline: Arc<dyn BuildPipeline>,
}

impl JobExecutor {
    /// Create an executor from settings and collaborators
    pub fn new(
        settings: ExecutorSettings,
        toolchains: Arc<dyn ToolchainLookup>,
        pipeline: Arc<dyn BuildPipeline>,
    ) -> Self {
        Self {
            settings,
            toolchains,
            pipeline,
        }
    }

    /// Get the executor settings
    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Fail early if any job targets a platform the host cannot build for
    pub fn check_toolchains(&self, jobs: &[BuildJob]) -> Result<(), ConfigurationError> {
        let targets: BTreeSet<Platform> = jobs.iter().map(|j| j.platform).collect();
        for target in targets {
            if self.toolchains.lookup(self.settings.host, target).is_none() {
                return Err(ConfigurationError::ToolchainNotFound {
                    host: self.settings.host.to_string(),
                    target: target.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Build the pipeline request for a job
    pub fn request_for(&self, job: &BuildJob, toolchain: &Toolchain) -> PipelineRequest {
        let s = &self.settings;
        let dirs = s.dirs.for_job(job);

        let mut definitions = vec![
            (
                "CMAKE_TOOLCHAIN_FILE".to_string(),
                toolchain.file.display().to_string(),
            ),
            ("BUILD_DEBUG".to_string(), flag(job.build_type.is_debug())),
            (
                "CMAKE_INSTALL_PREFIX".to_string(),
                dirs.install.display().to_string(),
            ),
            ("TARGET_OS_NAME".to_string(), job.platform.to_string()),
            ("TARGET_ARCH".to_string(), job.arch.to_string()),
            ("DO_CLANG_TIDY".to_string(), flag(s.clang_tidy)),
            ("BUILD_TESTING".to_string(), flag(s.build_testing)),
        ];

        if s.host == Platform::Windows {
            definitions.push((
                "LLVM_INCLUDE_DIRS".to_string(),
                s.llvm_dir.join("include").display().to_string(),
            ));
            definitions.push((
                "LLVM_LIBRARY_DIRS".to_string(),
                s.llvm_dir.join("lib").display().to_string(),
            ));
        }

        definitions.push((
            "ADDITIONAL_INCLUDE_DIRECTORIES".to_string(),
            s.include_dirs.clone(),
        ));
        definitions.push(("ADDITIONAL_LINK_DIRECTORIES".to_string(), s.link_dirs.clone()));

        definitions.extend(
            job.options
                .iter()
                .map(|o| (o.name.clone(), option_value(&o.value))),
        );

        PipelineRequest {
            source_dir: s.source_dir.clone(),
            dirs,
            definitions,
            extra_args: s.extra_args.clone(),
            parallel: s.parallel_build,
            install: s.install,
            package: s.package,
        }
    }

    /// Run one job to a terminal result
    ///
    /// Never panics and never returns early without a result: a missing
    /// toolchain is a failure, a pipeline fault or panic is an error.
    pub fn execute(&self, job: BuildJob) -> JobResult {
        let Some(toolchain) = self.toolchains.lookup(self.settings.host, job.platform) else {
            tracing::warn!(
                "No toolchain for {} on {} host, skipping {job}",
                job.platform,
                self.settings.host
            );
            return JobResult::from_exit_code(job, TOOLCHAIN_NOT_FOUND_EXIT);
        };

        let request = self.request_for(&job, &toolchain);
        tracing::info!("Building {job} with {} toolchain", toolchain.name);
        tracing::debug!("Definitions for {job}: {:?}", request.definitions);

        let pipeline = &self.pipeline;
        let result = match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&request))) {
            Ok(Ok(code)) => JobResult::from_exit_code(job, code),
            Ok(Err(e)) => JobResult::error(job, EXECUTION_FAULT_EXIT, e.to_string()),
            Err(payload) => {
                JobResult::error(job, EXECUTION_FAULT_EXIT, panic_message(payload.as_ref()))
            }
        };

        if result.is_success() {
            tracing::info!("Finished {}", result.job);
        } else {
            tracing::warn!(
                "{} ended with {:?} (exit code {})",
                result.job,
                result.status,
                result.exit_code
            );
        }
        result
    }
}
