use std::io;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use respawn::engine::SupervisorEvent;
use respawn::errors::{RespawnError, Result};
use respawn::exec::{LaunchSpec, ProcessBackend, SpawnedProcess};
use respawn::types::InstanceId;

#[derive(Debug, Default)]
struct FakeProcessLog {
    attempts: usize,
    spawned: Vec<InstanceId>,
    killed: Vec<InstanceId>,
    fail_next: usize,
}

/// A fake process backend that:
/// - records which instances were spawned and killed
/// - reports `ProcessClosed` immediately when killed
/// - lets the test make an instance "exit" or a spawn fail.
pub struct FakeProcessBackend {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    log: Arc<Mutex<FakeProcessLog>>,
}

/// Test-side handle to a [`FakeProcessBackend`].
#[derive(Debug, Clone)]
pub struct FakeProcessControl {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    log: Arc<Mutex<FakeProcessLog>>,
}

impl FakeProcessBackend {
    pub fn new(events_tx: mpsc::UnboundedSender<SupervisorEvent>) -> (Self, FakeProcessControl) {
        let log = Arc::new(Mutex::new(FakeProcessLog::default()));
        let control = FakeProcessControl {
            events_tx: events_tx.clone(),
            log: Arc::clone(&log),
        };
        (Self { events_tx, log }, control)
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&mut self, instance: InstanceId, spec: &LaunchSpec) -> Result<SpawnedProcess> {
        let mut log = self.log.lock().unwrap();
        log.attempts += 1;
        if log.fail_next > 0 {
            log.fail_next -= 1;
            return Err(RespawnError::Spawn {
                program: spec.program().to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }
        log.spawned.push(instance);
        Ok(SpawnedProcess::detached(instance, Some(1000 + instance.0 as u32)))
    }

    fn kill(&mut self, instance: InstanceId) -> Result<()> {
        self.log.lock().unwrap().killed.push(instance);
        let _ = self
            .events_tx
            .send(SupervisorEvent::ProcessClosed { instance, code: None });
        Ok(())
    }
}

impl FakeProcessControl {
    /// Make `instance` exit on its own with `code`.
    pub fn exit(&self, instance: InstanceId, code: Option<i32>) {
        self.events_tx
            .send(SupervisorEvent::ProcessClosed { instance, code })
            .expect("supervisor loop is gone");
    }

    /// Make the next `n` spawns fail.
    pub fn fail_next_spawns(&self, n: usize) {
        self.log.lock().unwrap().fail_next += n;
    }

    pub fn attempts(&self) -> usize {
        self.log.lock().unwrap().attempts
    }

    pub fn spawned(&self) -> Vec<InstanceId> {
        self.log.lock().unwrap().spawned.clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.log.lock().unwrap().spawned.len()
    }

    pub fn killed(&self) -> Vec<InstanceId> {
        self.log.lock().unwrap().killed.clone()
    }

    pub fn last_instance(&self) -> Option<InstanceId> {
        self.log.lock().unwrap().spawned.last().copied()
    }
}
