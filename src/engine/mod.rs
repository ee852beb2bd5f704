// src/engine/mod.rs

//! Supervision engine for respawn.
//!
//! This module ties together:
//! - the process lifecycle state machine
//! - the watch multiplexer (dedup, acceptance filter, state gate)
//! - the timers (cooldown, debounce, watcher delay, dedup expiry)
//! - the main event loop that reacts to:
//!   - start/stop/restart/shutdown requests
//!   - process spawn, error and close notifications
//!   - file-change notifications
//!   - timer firings
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::time::Duration;

use crate::types::{ChangeKind, InstanceId};

/// Events flowing into the supervisor from handles, backends and timers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    StartRequested,
    StopRequested,
    RestartRequested,
    /// Stop, then leave the event loop once the child is gone (e.g. Ctrl-C).
    ShutdownRequested,
    /// The OS accepted the spawn.
    ProcessSpawned {
        instance: InstanceId,
        pid: Option<u32>,
    },
    /// The spawn failed. A `ProcessClosed` for the same instance follows.
    ProcessError {
        instance: InstanceId,
        message: String,
    },
    ProcessClosed {
        instance: InstanceId,
        code: Option<i32>,
    },
    /// A native file-system notification, path in forward-slash form.
    FileChanged {
        kind: ChangeKind,
        path: String,
    },
    TimerFired {
        token: TimerToken,
    },
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Launch a new child for this instance.
    Spawn { instance: InstanceId },
    /// Kill the child of this instance. A `ProcessClosed` is expected back.
    Kill { instance: InstanceId },
    ArmTimer {
        token: TimerToken,
        kind: TimerKind,
        after: Duration,
    },
    CancelTimer { token: TimerToken },
    /// Resolve the patterns and open native watches.
    CreateWatches,
    /// Close every native watch before handling the next event.
    CloseWatches,
    /// Run spawn listeners for this instance.
    NotifySpawn { instance: InstanceId },
    /// Leave the event loop.
    RequestExit,
}

/// Decision returned by the core after handling a single `SupervisorEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<SupervisorCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

pub mod core;
pub mod event_handlers;
pub mod listeners;
pub mod runtime;
pub mod timers;

pub use core::{CoreSupervisor, ProcessHandle, ProcessStatus};
pub use listeners::SpawnListeners;
pub use runtime::{Reloader, ReloaderHandle};
pub use timers::{TimerKind, TimerToken, Timers};
