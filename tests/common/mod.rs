//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use buildmatrix::core::executor::{
    BuildPipeline, ExecutorSettings, JobExecutor, PipelineRequest, Toolchain, ToolchainLookup,
};
use buildmatrix::core::job::Platform;
use buildmatrix::error::PipelineError;
use buildmatrix::infra::dirs::BuildDirs;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Install a fake cmake that echoes its arguments and exits with `code`
    #[cfg(unix)]
    pub fn fake_cmake(&self, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join("fake-cmake.sh");
        std::fs::write(&path, format!("#!/bin/sh\necho \"$@\"\nexit {code}\n"))
            .expect("Failed to write fake cmake");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake cmake executable");
        path
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run buildmatrix inside a project with a clean environment
pub fn run_buildmatrix(project: &TestProject, args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_buildmatrix"));
    cmd.current_dir(project.path());
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("BUILDMATRIX_JOBS");
    cmd.env_remove("BUILDMATRIX_CMAKE");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute buildmatrix")
}

/// Toolchain lookup that knows every target
pub struct AnyToolchain;

impl ToolchainLookup for AnyToolchain {
    fn lookup(&self, _host: Platform, target: Platform) -> Option<Toolchain> {
        Some(Toolchain {
            name: target.name().to_string(),
            file: PathBuf::from(format!("/toolchains/{target}.cmake")),
        })
    }
}

type Decide = dyn Fn(&PipelineRequest) -> i32 + Send + Sync;

/// Pipeline stub that counts calls and answers with an exit code
pub struct CountingPipeline {
    decide: Box<Decide>,
    calls: AtomicUsize,
    pub requests: Mutex<Vec<PipelineRequest>>,
}

impl CountingPipeline {
    pub fn new(decide: impl Fn(&PipelineRequest) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            decide: Box::new(decide),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(|_| 0)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BuildPipeline for CountingPipeline {
    fn run(&self, request: &PipelineRequest) -> Result<i32, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        Ok((self.decide)(request))
    }
}

/// Executor on a linux host rooted at `root`
pub fn executor(root: &Path, pipeline: Arc<CountingPipeline>) -> Arc<JobExecutor> {
    let settings = ExecutorSettings::new(Platform::Linux, root.to_path_buf())
        .with_dirs(BuildDirs::new(root.join("out")));
    Arc::new(JobExecutor::new(settings, Arc::new(AnyToolchain), pipeline))
}
