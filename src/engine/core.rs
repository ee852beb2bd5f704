// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! This module contains a synchronous, deterministic "core supervisor" that
//! consumes [`SupervisorEvent`]s and produces:
//! - an updated lifecycle state
//! - a list of commands describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Reloader`) is responsible for:
//! - reading events from the channel
//! - spawning and killing processes through a `ProcessBackend`
//! - opening and closing native watches through a `WatchBackend`
//! - sleeping for timers and posting `TimerFired` back
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, filesystem, or processes.

use crate::config::model::Timing;
use crate::engine::timers::Timers;
use crate::engine::{CoreStep, SupervisorEvent};
use crate::types::{InstanceId, SupervisorState};
use crate::watch::multiplexer::WatchMultiplexer;
use crate::watch::patterns::PatternSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    /// Exited on its own; `None` when killed by a signal or never started.
    Exited(Option<i32>),
}

/// The single live child, as far as the core knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub instance: InstanceId,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
}

impl ProcessHandle {
    pub fn has_exited(&self) -> bool {
        matches!(self.status, ProcessStatus::Exited(_))
    }
}

/// Pure core supervisor state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreSupervisor {
    pub(super) state: SupervisorState,
    pub(super) process: Option<ProcessHandle>,
    /// Most recently spawned instance; notifications for others are stale.
    pub(super) current: Option<InstanceId>,
    pub(super) next_instance: u64,
    pub(super) timers: Timers,
    pub(super) watch: WatchMultiplexer,
    pub(super) timing: Timing,
    pub(super) shutting_down: bool,
}

impl CoreSupervisor {
    pub fn new(patterns: PatternSet, timing: Timing) -> Self {
        Self {
            state: SupervisorState::Stopped,
            process: None,
            current: None,
            next_instance: 0,
            timers: Timers::new(),
            watch: WatchMultiplexer::new(patterns, timing.dedup_ttl),
            timing,
            shutting_down: false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn process(&self) -> Option<&ProcessHandle> {
        self.process.as_ref()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn watch(&self) -> &WatchMultiplexer {
        &self.watch
    }

    pub fn patterns(&self) -> &PatternSet {
        self.watch.patterns()
    }

    /// Handle a single event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        let mut commands = Vec::new();
        let mut keep_running = true;

        match event {
            SupervisorEvent::StartRequested => self.handle_start(&mut commands),
            SupervisorEvent::StopRequested => self.handle_stop(&mut commands),
            SupervisorEvent::RestartRequested => self.handle_restart(&mut commands),
            SupervisorEvent::ShutdownRequested => {
                keep_running = self.handle_shutdown(&mut commands);
            }
            SupervisorEvent::ProcessSpawned { instance, pid } => {
                self.handle_spawned(instance, pid, &mut commands)
            }
            SupervisorEvent::ProcessError { instance, message } => {
                self.handle_error(instance, &message)
            }
            SupervisorEvent::ProcessClosed { instance, code } => {
                keep_running = self.handle_closed(instance, code, &mut commands);
            }
            SupervisorEvent::FileChanged { kind, path } => {
                self.handle_file_changed(kind, &path, &mut commands)
            }
            SupervisorEvent::TimerFired { token } => self.handle_timer(token, &mut commands),
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}
