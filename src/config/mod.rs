// src/config/mod.rs

//! Configuration loading and validation for respawn.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI overrides (`loader.rs`).
//! - Validate invariants and apply defaults (`validate.rs`).
//! - Parse duration strings (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_for_cli, load_from_path};
pub use model::{
    ConfigFile, ProcessConfig, ProcessSection, RawConfigFile, StdioConfig, Timing,
    TimingSection, WatchConfig, WatchSection,
};
