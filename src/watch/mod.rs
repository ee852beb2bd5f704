// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling `watch` / `ignore` glob patterns (`patterns.rs`).
//! - Walking the pattern roots into a concrete watch set (`resolver.rs`).
//! - Deduplicating and gating native notifications (`multiplexer.rs`).
//! - Wiring up a cross-platform filesystem watcher (`notify`, `watcher.rs`).
//!
//! It does **not** know about processes; it only turns filesystem changes
//! into "this change qualifies for a restart" verdicts.

pub mod multiplexer;
pub mod path_utils;
pub mod patterns;
pub mod resolver;
pub mod watcher;

pub use multiplexer::{ChangeVerdict, DedupKey, DedupTable, WatchMultiplexer, WatchPhase};
pub use patterns::{AnchorMode, CompiledPattern, PatternSet, compile};
pub use resolver::{TargetKind, WatchSet, WatchTarget, resolve};
pub use watcher::{NotifyWatchBackend, WatchBackend};
