//! buildmatrix - build-matrix orchestrator for CMake projects
//!
//! Enumerates every requested (platform, architecture, build type[, options])
//! configuration, runs the configure/build/install/package pipeline for each
//! one, sequentially or on a bounded worker pool, and reports the outcome.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Enumeration, execution, scheduling and reporting
//! - [`infra`] - Host detection, toolchains, directories and the CMake pipeline
//! - [`config`] - Constants
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
