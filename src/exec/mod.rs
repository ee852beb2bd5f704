// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised script,
//! using `tokio::process::Command`, and reporting back to the supervisor via
//! `SupervisorEvent`s.
//!
//! - [`launch`] builds the command line, stdio wiring and environment.
//! - [`process_runner`] owns one child: waits for it or kills it on request.
//! - [`spawned`] is the handle given to spawn listeners.
//! - [`backend`] provides the `ProcessBackend` trait and a concrete
//!   `RealProcessBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod launch;
pub mod process_runner;
pub mod spawned;

pub use backend::{ProcessBackend, RealProcessBackend};
pub use launch::LaunchSpec;
pub use spawned::SpawnedProcess;
