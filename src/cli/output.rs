//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status messages, and the final build report.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::core::report::{format_elapsed, render_results, ExitPolicy, JsonReport, RunSummary};

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

/// How much the CLI prints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Only errors
    pub quiet: bool,
    /// Machine-readable output on stdout
    pub json: bool,
    /// Verbosity level from `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    /// Create an output configuration
    pub fn new(quiet: bool, json: bool, verbose: u8) -> Self {
        Self {
            quiet,
            json,
            verbose,
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Whether human-readable text goes to stdout
    pub fn is_human(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Print an informational line in human mode
    pub fn info(&self, message: &str) {
        if self.is_human() {
            println!("{message}");
        }
    }
}

/// Create a progress bar for build jobs
pub fn create_build_bar(total: u64, output: &OutputConfig) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if !output.is_human() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
        return pb;
    }
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} configurations ({msg})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} Error: {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}

/// Human-readable end-of-run report
pub fn render_report(summary: &RunSummary, not_started: usize) -> String {
    let mut out = String::new();

    if !summary.succeeded.is_empty() {
        out.push_str("\nSuccessful Builds:\n");
        out.push_str(&render_results(&summary.succeeded).to_string());
        out.push('\n');
    }

    if !summary.failed.is_empty() {
        out.push_str("\nFailed Builds:\n");
        out.push_str(&render_results(&summary.failed).to_string());
        out.push('\n');
    }

    if not_started > 0 {
        out.push_str(&format!(
            "\n{} {not_started} configurations not started (fail-fast)\n",
            status::WARNING
        ));
    }

    if summary.is_success() {
        out.push_str(&format!(
            "\n{} All {} builds completed in {}.\n",
            status::SUCCESS,
            summary.total(),
            format_elapsed(summary.elapsed)
        ));
    } else {
        out.push_str(&format!(
            "\n{} {} / {} configurations failed ({}).\n",
            status::ERROR,
            summary.failed.len(),
            summary.total(),
            format_elapsed(summary.elapsed)
        ));
    }

    out
}

/// Print the end-of-run report in the configured format
pub fn print_report(
    output: &OutputConfig,
    summary: &RunSummary,
    policy: ExitPolicy,
    not_started: usize,
) -> anyhow::Result<()> {
    if output.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonReport::new(summary, policy))?
        );
    } else if !output.quiet {
        print!("{}", render_report(summary, not_started));
    }
    Ok(())
}
