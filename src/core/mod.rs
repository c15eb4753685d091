//! Core logic
//!
//! Nothing here launches processes or inspects the host; those collaborators
//! live in [`crate::infra`] and are injected through traits.
//!
//! # Submodules
//!
//! - [`job`] - Platforms, architectures, build types, jobs and results
//! - [`enumerator`] - Cartesian product of the requested dimensions
//! - [`executor`] - One job through the build pipeline
//! - [`scheduler`] - Sequential or bounded-concurrent runs with fail-fast
//! - [`report`] - Summaries, exit codes and result tables
//! - [`settings`] - `buildmatrix.toml` and the resolved selection

pub mod enumerator;
pub mod executor;
pub mod job;
pub mod report;
pub mod scheduler;
pub mod settings;
