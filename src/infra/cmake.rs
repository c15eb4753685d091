//! CMake build pipeline
//!
//! Runs `configure -> build -> [install] -> [package]` for one configuration
//! and stops at the first stage with a nonzero exit code. Output of every
//! stage goes to a log file inside the job's own build directory, so
//! concurrent jobs never interleave on the terminal.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::defaults::{BUILD_LOG_FILE, CMAKE_GENERATOR};
use crate::core::executor::{BuildPipeline, PipelineRequest};
use crate::error::PipelineError;

/// One step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configure,
    Build,
    Install,
    Package,
}

impl Stage {
    /// Get the stage name
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Configure => "configure",
            Stage::Build => "build",
            Stage::Install => "install",
            Stage::Package => "package",
        }
    }

    /// Arguments passed to cmake for this stage
    pub fn args(&self, request: &PipelineRequest) -> Vec<String> {
        let build_dir = request.dirs.build.display().to_string();
        let mut args = match self {
            Stage::Configure => {
                let mut args = vec![
                    "-S".to_string(),
                    request.source_dir.display().to_string(),
                    "-B".to_string(),
                    build_dir,
                    "-G".to_string(),
                    CMAKE_GENERATOR.to_string(),
                ];
                args.extend(request.definitions.iter().map(|(k, v)| format!("-D{k}={v}")));
                args.extend(request.extra_args.iter().cloned());
                args
            }
            Stage::Build => vec!["--build".to_string(), build_dir],
            Stage::Install => vec!["--install".to_string(), build_dir],
            Stage::Package => vec![
                "--build".to_string(),
                build_dir,
                "--target".to_string(),
                "package".to_string(),
            ],
        };
        if request.parallel && matches!(self, Stage::Build | Stage::Package) {
            args.push("--parallel".to_string());
        }
        args
    }

    /// Stages a request asks for, in execution order
    pub fn for_request(request: &PipelineRequest) -> Vec<Stage> {
        let mut stages = vec![Stage::Configure, Stage::Build];
        if request.install {
            stages.push(Stage::Install);
        }
        if request.package {
            stages.push(Stage::Package);
        }
        stages
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pipeline backed by the `cmake` executable
#[derive(Debug, Clone)]
pub struct CMakePipeline {
    program: String,
}

impl CMakePipeline {
    /// Pipeline invoking `program` (usually "cmake")
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locate the executable in PATH
    pub fn resolve(&self) -> Result<PathBuf, PipelineError> {
        which::which(&self.program).map_err(|_| PipelineError::ToolNotFound {
            tool: self.program.clone(),
        })
    }

    fn log_handle(log: &File, path: &Path) -> Result<Stdio, PipelineError> {
        log.try_clone()
            .map(Stdio::from)
            .map_err(|e| PipelineError::Io {
                path: path.to_path_buf(),
                error: e.to_string(),
            })
    }
}

impl Default for CMakePipeline {
    fn default() -> Self {
        Self::new("cmake")
    }
}

impl BuildPipeline for CMakePipeline {
    fn run(&self, request: &PipelineRequest) -> Result<i32, PipelineError> {
        let program = self.resolve()?;

        fs::create_dir_all(&request.dirs.build).map_err(|e| PipelineError::Io {
            path: request.dirs.build.clone(),
            error: e.to_string(),
        })?;
        let log_path = request.dirs.build.join(BUILD_LOG_FILE);
        let log = File::create(&log_path).map_err(|e| PipelineError::Io {
            path: log_path.clone(),
            error: e.to_string(),
        })?;

        for stage in Stage::for_request(request) {
            let args = stage.args(request);
            tracing::debug!("cmake {stage} command: {} {}", program.display(), args.join(" "));

            let status = Command::new(&program)
                .args(&args)
                .current_dir(&request.source_dir)
                .stdin(Stdio::null())
                .stdout(Self::log_handle(&log, &log_path)?)
                .stderr(Self::log_handle(&log, &log_path)?)
                .status()
                .map_err(|e| PipelineError::Launch {
                    command: format!("{} {stage}", program.display()),
                    error: e.to_string(),
                })?;

            let code = status.code().ok_or_else(|| PipelineError::Terminated {
                stage: stage.name().to_string(),
            })?;
            if code != 0 {
                tracing::warn!(
                    "cmake {stage} failed: {code} (see {})",
                    log_path.display()
                );
                return Ok(code);
            }
        }

        Ok(0)
    }
}
