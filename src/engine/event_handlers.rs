// src/engine/event_handlers.rs

//! Event handling logic for the core supervisor.
//!
//! Redundant requests (start while running, stop while stopped, restart
//! while restarting) are diagnostic-only no-ops.

use tracing::{debug, info, warn};

use crate::engine::core::{CoreSupervisor, ProcessHandle, ProcessStatus};
use crate::engine::timers::{TimerKind, TimerToken};
use crate::engine::SupervisorCommand;
use crate::types::{ChangeKind, InstanceId, SupervisorState};
use crate::watch::multiplexer::ChangeVerdict;

type Commands = Vec<SupervisorCommand>;

impl CoreSupervisor {
    pub(super) fn handle_start(&mut self, commands: &mut Commands) {
        if let Some(process) = &self.process {
            debug!(
                state = %self.state,
                instance = %process.instance,
                "start requested but a process exists; ignoring"
            );
            return;
        }
        self.spawn(commands);
    }

    pub(super) fn handle_stop(&mut self, commands: &mut Commands) {
        let Some(process) = self.process.take() else {
            debug!(state = %self.state, "stop requested but no process; ignoring");
            return;
        };

        self.timers.cancel_kind(TimerKind::Cooldown, commands);
        self.timers.cancel_kind(TimerKind::Debounce, commands);
        self.watch.close(&mut self.timers, commands);

        if process.has_exited() {
            // Nothing left to kill.
            info!(instance = %process.instance, "stopped while closed");
            self.transition(SupervisorState::Stopped);
            return;
        }

        info!(instance = %process.instance, "stopping process");
        commands.push(SupervisorCommand::Kill {
            instance: process.instance,
        });
        self.transition(SupervisorState::Stopping);
    }

    pub(super) fn handle_restart(&mut self, commands: &mut Commands) {
        if self.state == SupervisorState::Restarting {
            debug!("restart requested while already restarting; ignoring");
            return;
        }
        let Some(process) = &self.process else {
            debug!(state = %self.state, "restart requested but no process; ignoring");
            return;
        };

        self.timers.cancel_kind(TimerKind::Debounce, commands);

        if process.has_exited() {
            info!(instance = %process.instance, "restarting exited process immediately");
            self.spawn(commands);
            return;
        }

        let instance = process.instance;
        info!(%instance, "restarting process");
        commands.push(SupervisorCommand::Kill { instance });
        self.transition(SupervisorState::Restarting);
    }

    /// Returns `keep_running`.
    pub(super) fn handle_shutdown(&mut self, commands: &mut Commands) -> bool {
        self.shutting_down = true;
        self.handle_stop(commands);
        if self.state == SupervisorState::Stopping {
            return true;
        }
        commands.push(SupervisorCommand::RequestExit);
        false
    }

    pub(super) fn handle_spawned(
        &mut self,
        instance: InstanceId,
        pid: Option<u32>,
        commands: &mut Commands,
    ) {
        if self.is_stale(instance) {
            debug!(%instance, "spawn notification for stale instance");
            return;
        }
        if let Some(process) = self.process.as_mut() {
            process.pid = pid;
        }
        if self.state != SupervisorState::Starting {
            return;
        }

        info!(%instance, pid = ?pid, "process started");
        self.transition(SupervisorState::Started);
        commands.push(SupervisorCommand::NotifySpawn { instance });
        self.watch
            .schedule(self.timing.watcher_delay, &mut self.timers, commands);
    }

    pub(super) fn handle_error(&mut self, instance: InstanceId, message: &str) {
        if self.is_stale(instance) {
            return;
        }
        // The close notification that follows drives the state machine.
        warn!(%instance, error = %message, "process error");
    }

    /// Returns `keep_running`.
    pub(super) fn handle_closed(
        &mut self,
        instance: InstanceId,
        code: Option<i32>,
        commands: &mut Commands,
    ) -> bool {
        if self.is_stale(instance) {
            debug!(%instance, "close notification for stale instance");
            return true;
        }

        match self.state {
            SupervisorState::Stopping => {
                info!(%instance, code = ?code, "process stopped");
                self.process = None;
                self.transition(SupervisorState::Stopped);
                if self.shutting_down {
                    commands.push(SupervisorCommand::RequestExit);
                    return false;
                }
            }
            SupervisorState::Restarting => {
                debug!(%instance, code = ?code, "process closed for restart");
                self.process = None;
                self.spawn(commands);
            }
            SupervisorState::Stopped => {}
            _ => {
                warn!(
                    %instance,
                    code = ?code,
                    cooldown = ?self.timing.restart_timeout,
                    "process exited unexpectedly; respawning after cooldown"
                );
                if let Some(process) = self.process.as_mut() {
                    process.status = ProcessStatus::Exited(code);
                }
                self.transition(SupervisorState::Closed);
                self.timers
                    .arm(TimerKind::Cooldown, self.timing.restart_timeout, commands);
            }
        }
        true
    }

    pub(super) fn handle_file_changed(
        &mut self,
        kind: ChangeKind,
        path: &str,
        commands: &mut Commands,
    ) {
        let verdict = self
            .watch
            .on_change(kind, path, self.state, &mut self.timers, commands);
        match verdict {
            ChangeVerdict::Debounce => {
                info!(%kind, path, "change detected; restart scheduled");
                self.transition(SupervisorState::RestartDelay);
                self.timers
                    .arm(TimerKind::Debounce, self.timing.debounce, commands);
            }
            ChangeVerdict::NotStarted => {
                debug!(%kind, path, state = %self.state, "change ignored in current state");
            }
            ChangeVerdict::Inactive | ChangeVerdict::NotAccepted | ChangeVerdict::Duplicate => {}
        }
    }

    pub(super) fn handle_timer(&mut self, token: TimerToken, commands: &mut Commands) {
        let Some(kind) = self.timers.fire(token) else {
            debug!(%token, "stale timer fired");
            return;
        };

        match kind {
            TimerKind::Cooldown => {
                if self.state == SupervisorState::Closed {
                    self.spawn(commands);
                }
            }
            TimerKind::Debounce => self.handle_restart(commands),
            TimerKind::WatcherDelay => self.watch.activate(commands),
            TimerKind::DedupExpiry => self.watch.expire(token),
        }
    }

    fn spawn(&mut self, commands: &mut Commands) {
        self.timers.cancel_kind(TimerKind::Cooldown, commands);

        self.next_instance += 1;
        let instance = InstanceId(self.next_instance);
        self.current = Some(instance);
        self.process = Some(ProcessHandle {
            instance,
            pid: None,
            status: ProcessStatus::Running,
        });
        self.transition(SupervisorState::Starting);
        commands.push(SupervisorCommand::Spawn { instance });
    }

    fn is_stale(&self, instance: InstanceId) -> bool {
        self.current != Some(instance)
    }

    fn transition(&mut self, next: SupervisorState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "state transition");
            self.state = next;
        }
    }
}
