//! Plan command implementation
//!
//! Implements `buildmatrix plan`: show the configurations a build with the
//! same selection would run, in execution order, without building anything.

use anyhow::Result;

use crate::cli::commands::SelectionArgs;
use crate::cli::output::{status, OutputConfig};
use crate::config::defaults::CONFIGURATION_ERROR_EXIT;
use crate::core::job::BuildJob;
use crate::core::report::render_plan;
use crate::error::ConfigurationError;

fn planned_jobs(args: &SelectionArgs) -> Result<Vec<BuildJob>, ConfigurationError> {
    let (selection, _) = args.resolve()?;
    selection.jobs()
}

/// Execute the plan command
pub fn execute(args: &SelectionArgs, output: &OutputConfig) -> Result<i32> {
    let jobs = match planned_jobs(args) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("{} {e}", status::ERROR);
            return Ok(CONFIGURATION_ERROR_EXIT);
        }
    };

    if output.json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
    } else if !output.quiet {
        println!("{}", render_plan(&jobs));
        println!("{} {} configurations", status::INFO, jobs.len());
    }

    Ok(0)
}
