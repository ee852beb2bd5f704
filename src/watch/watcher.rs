// src/watch/watcher.rs

use std::fmt;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::SupervisorEvent;
use crate::errors::Result;
use crate::types::ChangeKind;
use crate::watch::path_utils::normalize_path;
use crate::watch::resolver::WatchTarget;

/// Native watch handles for one watch set.
///
/// `close_all` must be synchronous: once it returns, no further
/// notifications are produced by this backend.
pub trait WatchBackend: Send {
    /// Open a non-recursive watch on one target.
    fn watch(&mut self, target: &WatchTarget) -> Result<()>;

    fn close_all(&mut self);

    /// Number of open watches.
    fn watched(&self) -> usize;
}

/// Production backend built on `notify`'s recommended watcher.
///
/// One `RecommendedWatcher` carries every target; it is created lazily on the
/// first `watch` and dropped by `close_all`.
pub struct NotifyWatchBackend {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    inner: Option<RecommendedWatcher>,
    count: usize,
}

impl fmt::Debug for NotifyWatchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyWatchBackend")
            .field("active", &self.inner.is_some())
            .field("count", &self.count)
            .finish()
    }
}

impl NotifyWatchBackend {
    pub fn new(events_tx: mpsc::UnboundedSender<SupervisorEvent>) -> Self {
        Self {
            events_tx,
            inner: None,
            count: 0,
        }
    }

    fn create_watcher(&self) -> Result<RecommendedWatcher> {
        let tx = self.events_tx.clone();
        // Called synchronously by notify on its own thread.
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => forward(&tx, event),
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;
        info!("file watcher started");
        Ok(watcher)
    }
}

impl WatchBackend for NotifyWatchBackend {
    fn watch(&mut self, target: &WatchTarget) -> Result<()> {
        if self.inner.is_none() {
            self.inner = Some(self.create_watcher()?);
        }
        if let Some(watcher) = self.inner.as_mut() {
            watcher.watch(&target.path, RecursiveMode::NonRecursive)?;
        }
        self.count += 1;
        debug!(path = %target.path.display(), kind = ?target.kind, "watching");
        Ok(())
    }

    fn close_all(&mut self) {
        if self.inner.take().is_some() {
            info!(count = self.count, "file watcher closed");
        }
        self.count = 0;
    }

    fn watched(&self) -> usize {
        self.count
    }
}

/// Map a native event kind onto the four kinds the multiplexer knows.
pub fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Create),
        EventKind::Modify(ModifyKind::Name(_)) => Some(ChangeKind::Rename),
        EventKind::Modify(_) | EventKind::Any => Some(ChangeKind::Change),
        EventKind::Remove(_) => Some(ChangeKind::Remove),
        EventKind::Access(_) | EventKind::Other => None,
    }
}

fn forward(tx: &mpsc::UnboundedSender<SupervisorEvent>, event: Event) {
    let Some(kind) = change_kind(&event.kind) else {
        return;
    };
    for path in &event.paths {
        let sent = tx.send(SupervisorEvent::FileChanged {
            kind,
            path: normalize_path(path),
        });
        if sent.is_err() {
            // Supervisor loop has exited.
            return;
        }
    }
}
