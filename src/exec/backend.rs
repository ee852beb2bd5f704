// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The runtime talks to a `ProcessBackend` instead of `tokio::process`
//! directly. This makes it easy to swap in a fake backend in tests.
//!
//! - `RealProcessBackend` is the default implementation used by `respawn`.
//!   Every child gets its own wait/kill task (see [`super::process_runner`])
//!   that reports `ProcessClosed` back into the supervisor queue.
//! - Tests can provide their own `ProcessBackend` that records spawns and
//!   emits close notifications on demand.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::engine::SupervisorEvent;
use crate::errors::{RespawnError, Result};
use crate::types::InstanceId;

use super::launch::LaunchSpec;
use super::process_runner::run_process;
use super::spawned::SpawnedProcess;

/// Trait abstracting how the supervised child is started and stopped.
///
/// Contract:
/// - `spawn` either returns the live process or an error. On success the
///   backend must eventually send exactly one `ProcessClosed` for `instance`.
/// - `kill` asks the child of `instance` to terminate; the resulting
///   `ProcessClosed` is the confirmation.
pub trait ProcessBackend: Send {
    fn spawn(&mut self, instance: InstanceId, spec: &LaunchSpec) -> Result<SpawnedProcess>;

    fn kill(&mut self, instance: InstanceId) -> Result<()>;
}

/// Real backend used in production.
pub struct RealProcessBackend {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    kills: HashMap<InstanceId, oneshot::Sender<()>>,
}

impl RealProcessBackend {
    /// Create a backend reporting into the given supervisor event sender.
    pub fn new(events_tx: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        Self {
            events_tx,
            kills: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for RealProcessBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealProcessBackend")
            .field("live", &self.kills.len())
            .finish()
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&mut self, instance: InstanceId, spec: &LaunchSpec) -> Result<SpawnedProcess> {
        // Forget kill handles of children whose runner already finished.
        self.kills.retain(|_, tx| !tx.is_closed());

        info!(%instance, cmd = %spec, "spawning process");
        let mut child = spec.command().spawn().map_err(|source| RespawnError::Spawn {
            program: spec.program().to_string(),
            source,
        })?;

        let pid = child.id();
        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (kill_tx, kill_rx) = oneshot::channel();
        self.kills.insert(instance, kill_tx);
        tokio::spawn(run_process(instance, child, self.events_tx.clone(), kill_rx));

        Ok(SpawnedProcess::new(instance, pid, stdin, stdout, stderr))
    }

    fn kill(&mut self, instance: InstanceId) -> Result<()> {
        match self.kills.remove(&instance) {
            Some(tx) => {
                // Err means the runner already finished; its close is on the way.
                let _ = tx.send(());
            }
            None => debug!(%instance, "kill for unknown instance"),
        }
        Ok(())
    }
}
