use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use respawn::engine::SupervisorEvent;
use respawn::errors::Result;
use respawn::types::ChangeKind;
use respawn::watch::{WatchBackend, WatchTarget};

#[derive(Debug, Default)]
struct FakeWatchLog {
    open: Vec<WatchTarget>,
    created: usize,
    closes: usize,
}

/// A fake watch backend that records targets instead of opening native
/// watches. Notifications are injected through [`FakeWatchControl::emit`].
pub struct FakeWatchBackend {
    log: Arc<Mutex<FakeWatchLog>>,
}

/// Test-side handle to a [`FakeWatchBackend`].
#[derive(Debug, Clone)]
pub struct FakeWatchControl {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    log: Arc<Mutex<FakeWatchLog>>,
}

impl FakeWatchBackend {
    pub fn new(events_tx: mpsc::UnboundedSender<SupervisorEvent>) -> (Self, FakeWatchControl) {
        let log = Arc::new(Mutex::new(FakeWatchLog::default()));
        let control = FakeWatchControl {
            events_tx,
            log: Arc::clone(&log),
        };
        (Self { log }, control)
    }
}

impl WatchBackend for FakeWatchBackend {
    fn watch(&mut self, target: &WatchTarget) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.open.is_empty() {
            log.created += 1;
        }
        log.open.push(target.clone());
        Ok(())
    }

    fn close_all(&mut self) {
        let mut log = self.log.lock().unwrap();
        if !log.open.is_empty() {
            log.closes += 1;
        }
        log.open.clear();
    }

    fn watched(&self) -> usize {
        self.log.lock().unwrap().open.len()
    }
}

impl FakeWatchControl {
    /// Inject a native notification, as if a watched path changed.
    ///
    /// Sent regardless of whether any watch is open; the supervisor decides.
    pub fn emit(&self, kind: ChangeKind, path: &str) {
        self.events_tx
            .send(SupervisorEvent::FileChanged {
                kind,
                path: path.to_string(),
            })
            .expect("supervisor loop is gone");
    }

    /// Paths of the currently open watches.
    pub fn open_paths(&self) -> Vec<PathBuf> {
        self.log
            .lock()
            .unwrap()
            .open
            .iter()
            .map(|t| t.path.clone())
            .collect()
    }

    pub fn open_count(&self) -> usize {
        self.log.lock().unwrap().open.len()
    }

    /// How many watch sets were opened (first target after being empty).
    pub fn created_count(&self) -> usize {
        self.log.lock().unwrap().created
    }

    pub fn close_count(&self) -> usize {
        self.log.lock().unwrap().closes
    }
}
