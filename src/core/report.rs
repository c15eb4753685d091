//! Result aggregation and reporting
//!
//! [`summarize`] partitions finished jobs into successes and failures and
//! [`RunSummary::exit_code`] turns the partition into a process exit code.
//! Both are pure, so summarizing the same results twice gives the same
//! answer. Table and JSON rendering live here too; printing is left to the
//! CLI.

use std::time::Duration;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::config::defaults::MAX_EXIT_CODE;
use crate::core::job::{BuildJob, JobResult, JobStatus};

/// How failures map to an exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitPolicy {
    /// Number of failed configurations, clamped to `1..=254`
    FailureCount,
    /// 1 on any failure
    AnyFailure,
}

/// Consolidated outcome of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Successful jobs, in the order received
    pub succeeded: Vec<JobResult>,
    /// Failed and faulted jobs, in the order received
    pub failed: Vec<JobResult>,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl RunSummary {
    /// Total number of executed jobs
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether every executed job succeeded
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Exit code under the given policy, 0 when nothing failed
    pub fn exit_code(&self, policy: ExitPolicy) -> i32 {
        if self.failed.is_empty() {
            return 0;
        }
        match policy {
            ExitPolicy::FailureCount => {
                i32::try_from(self.failed.len()).map_or(MAX_EXIT_CODE, |n| n.clamp(1, MAX_EXIT_CODE))
            }
            ExitPolicy::AnyFailure => 1,
        }
    }
}

/// Stable partition of results into successes and failures
pub fn summarize(results: &[JobResult], elapsed: Duration) -> RunSummary {
    let (succeeded, failed): (Vec<JobResult>, Vec<JobResult>) =
        results.iter().cloned().partition(JobResult::is_success);
    RunSummary {
        succeeded,
        failed,
        elapsed,
    }
}

/// `"3 min 7 sec"`
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{} min {} sec", secs / 60, secs % 60)
}

fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Option names across all jobs, in first-seen order
fn option_columns<'a>(jobs: impl Iterator<Item = &'a BuildJob>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for job in jobs {
        for opt in &job.options {
            if !names.contains(&opt.name) {
                names.push(opt.name.clone());
            }
        }
    }
    names
}

fn job_cells(job: &BuildJob, option_names: &[String]) -> Vec<Cell> {
    let mut cells = vec![
        Cell::new(job.platform),
        Cell::new(job.arch),
        Cell::new(job.build_type),
    ];
    cells.extend(
        option_names
            .iter()
            .map(|name| Cell::new(job.option(name).unwrap_or("-"))),
    );
    cells
}

fn header(option_names: &[String], last: &str) -> Vec<Cell> {
    ["OS", "Arch", "BuildType"]
        .into_iter()
        .map(String::from)
        .chain(option_names.iter().cloned())
        .chain(std::iter::once(last.to_string()))
        .map(|label| Cell::new(label).fg(Color::Cyan))
        .collect()
}

fn status_cell(result: &JobResult) -> Cell {
    match result.status {
        JobStatus::Success => Cell::new("✓").fg(Color::Green),
        JobStatus::Failure => Cell::new(format!("✗ (exit {})", result.exit_code)).fg(Color::Red),
        JobStatus::Error => Cell::new(format!(
            "💥 ({})",
            result.error_detail.as_deref().unwrap_or("unknown error")
        ))
        .fg(Color::Red),
    }
}

/// Table of executed jobs with one column per job field and option
pub fn render_results(results: &[JobResult]) -> Table {
    let option_names = option_columns(results.iter().map(|r| &r.job));
    let mut table = create_table();
    table.set_header(header(&option_names, "Result"));
    for result in results {
        let mut row = job_cells(&result.job, &option_names);
        row.push(status_cell(result));
        table.add_row(row);
    }
    table
}

/// Table of planned jobs, numbered in execution order
pub fn render_plan(jobs: &[BuildJob]) -> Table {
    let option_names = option_columns(jobs.iter());
    let mut table = create_table();
    table.set_header(header(&option_names, "#"));
    for (index, job) in jobs.iter().enumerate() {
        let mut row = job_cells(job, &option_names);
        row.push(Cell::new(index + 1));
        table.add_row(row);
    }
    table
}

/// Machine-readable form of a summary
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub exit_code: i32,
    pub elapsed_secs: f64,
    pub succeeded: &'a [JobResult],
    pub failed: &'a [JobResult],
}

impl<'a> JsonReport<'a> {
    pub fn new(summary: &'a RunSummary, policy: ExitPolicy) -> Self {
        Self {
            exit_code: summary.exit_code(policy),
            elapsed_secs: summary.elapsed.as_secs_f64(),
            succeeded: &summary.succeeded,
            failed: &summary.failed,
        }
    }
}
