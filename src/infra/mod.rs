//! Infrastructure layer
//!
//! Handles the host, the filesystem and external processes.

pub mod cmake;
pub mod dirs;
pub mod host;
pub mod toolchain;
