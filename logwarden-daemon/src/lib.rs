//! Library surface of `logwarden-daemon`.
//!
//! Exposes the CLI, logging, and metrics modules so integration tests can
//! exercise them without spawning the binary.

pub mod cli;
pub mod logging;
pub mod metrics_server;
