//! Build command implementation
//!
//! Implements `buildmatrix build`: enumerate the configuration matrix, make
//! sure every target has a toolchain, run all jobs and print the report.
//! Configuration problems abort before any job starts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::cli::commands::BuildArgs;
use crate::cli::output::{self, create_build_bar, status, OutputConfig};
use crate::config::defaults::CONFIGURATION_ERROR_EXIT;
use crate::core::enumerator::split_list;
use crate::core::executor::{BuildPipeline, ExecutorSettings, JobExecutor, ToolchainLookup};
use crate::core::job::BuildJob;
use crate::core::report::ExitPolicy;
use crate::core::scheduler::{clamp_workers, default_workers, SchedulePolicy, Scheduler};
use crate::core::settings::MatrixSelection;
use crate::error::ConfigurationError;
use crate::infra::cmake::CMakePipeline;
use crate::infra::dirs::{absolute, BuildDirs};
use crate::infra::host::host_platform;
use crate::infra::toolchain::CMakeToolchains;

/// Everything needed to start a run
pub struct PreparedBuild {
    pub selection: MatrixSelection,
    pub jobs: Vec<BuildJob>,
    pub executor: JobExecutor,
    pub policy: SchedulePolicy,
    pub exit_policy: ExitPolicy,
}

fn source_dir(path: &Path) -> Result<PathBuf, ConfigurationError> {
    if !path.is_dir() {
        return Err(ConfigurationError::SourceDirNotFound {
            path: path.to_path_buf(),
        });
    }
    absolute(path).map_err(|_| ConfigurationError::SourceDirNotFound {
        path: path.to_path_buf(),
    })
}

/// Resolve arguments into jobs, an executor and a policy
///
/// Fails with a [`ConfigurationError`] for unknown names, a bad settings
/// file or a target platform without toolchain.
pub fn prepare(
    args: &BuildArgs,
    toolchains: Arc<dyn ToolchainLookup>,
    pipeline: Arc<dyn BuildPipeline>,
) -> Result<PreparedBuild, ConfigurationError> {
    let (selection, settings) = args.selection.resolve()?;
    let jobs = selection.jobs()?;
    let source = source_dir(&args.selection.source_dir)?;

    let mut exec_settings = ExecutorSettings::new(host_platform()?, source);
    if let Some(out) = &args.out_dir {
        let out = absolute(out).map_err(|e| ConfigurationError::OutputDir {
            path: out.clone(),
            error: e.to_string(),
        })?;
        exec_settings = exec_settings.with_dirs(BuildDirs::new(out));
    }
    exec_settings.clang_tidy = !args.no_clang_tidy;
    exec_settings.build_testing = !args.no_testing;
    exec_settings.install = !args.no_install;
    exec_settings.package = !args.no_package;
    exec_settings.include_dirs.clone_from(&args.include_dirs);
    exec_settings.link_dirs.clone_from(&args.link_dirs);
    exec_settings.llvm_dir.clone_from(&args.llvm_dir);
    exec_settings = exec_settings
        .with_extra_args(settings.build.extra_args.clone())
        .with_extra_args(split_list(&args.extra_args));
    if selection.mode.is_matrix() {
        exec_settings = exec_settings.build_only();
    }

    let executor = JobExecutor::new(exec_settings, toolchains, pipeline);
    executor.check_toolchains(&jobs)?;

    let fail_fast = args.fail_fast || settings.build.fail_fast.unwrap_or(false);
    let sequential = args.sequential || settings.build.sequential.unwrap_or(false);
    let policy = if sequential {
        SchedulePolicy::sequential(fail_fast)
    } else {
        let workers = args
            .jobs
            .or(settings.build.jobs)
            .map_or_else(|| default_workers(num_cpus::get()), clamp_workers);
        SchedulePolicy::concurrent(workers, fail_fast)
    };

    let exit_policy = if selection.mode.is_matrix() {
        ExitPolicy::AnyFailure
    } else {
        ExitPolicy::FailureCount
    };

    Ok(PreparedBuild {
        selection,
        jobs,
        executor,
        policy,
        exit_policy,
    })
}

/// Matrix banner with counts of distinct values actually enumerated
fn matrix_banner(jobs: &[BuildJob]) -> String {
    let platforms: HashSet<_> = jobs.iter().map(|j| j.platform).collect();
    let archs: HashSet<_> = jobs.iter().map(|j| j.arch).collect();
    let build_types: HashSet<_> = jobs.iter().map(|j| j.build_type).collect();
    let combinations: HashSet<_> = jobs.iter().map(|j| &j.options).collect();
    format!(
        "Testing {} platforms x {} arch x {} build types x {} option combinations = {} configurations...",
        platforms.len(),
        archs.len(),
        build_types.len(),
        combinations.len(),
        jobs.len()
    )
}

fn announce(output: &OutputConfig, prepared: &PreparedBuild) {
    let selection = &prepared.selection;
    output.info(&format!("target platforms: {}", selection.platforms.join(", ")));
    output.info(&format!("target architectures: {}", selection.archs.join(", ")));
    output.info(&format!("target build types: {}", selection.build_types().join(", ")));
    if selection.mode.is_matrix() {
        output.info(&matrix_banner(&prepared.jobs));
    }
}

/// Run a prepared build and report; returns the exit code
pub async fn run(prepared: PreparedBuild, output: &OutputConfig) -> Result<i32> {
    announce(output, &prepared);

    let PreparedBuild {
        jobs,
        executor,
        policy,
        exit_policy,
        ..
    } = prepared;
    let total = jobs.len();

    let bar = create_build_bar(total as u64, output);
    let tick = bar.clone();
    let scheduler = Scheduler::new(Arc::new(executor), policy).with_observer(move |result| {
        tick.set_message(result.job.to_string());
        tick.inc(1);
    });

    let summary = scheduler.run(jobs).await;
    bar.finish_and_clear();

    output::print_report(output, &summary, exit_policy, total - summary.total())?;
    Ok(summary.exit_code(exit_policy))
}

/// Execute the build command
pub async fn execute(args: &BuildArgs, output: &OutputConfig) -> Result<i32> {
    let source = absolute(&args.selection.source_dir)
        .unwrap_or_else(|_| args.selection.source_dir.clone());
    let toolchains = Arc::new(CMakeToolchains::in_source(&source));
    let pipeline = Arc::new(CMakePipeline::new(args.cmake.clone()));

    match prepare(args, toolchains, pipeline) {
        Ok(prepared) => run(prepared, output).await,
        Err(e) => {
            eprintln!("{} {e}", status::ERROR);
            Ok(CONFIGURATION_ERROR_EXIT)
        }
    }
}
