// src/engine/listeners.rs

//! Subscribers to the `spawn` notification.
//!
//! Listeners run once per successful spawn, before the first watch set is
//! built. The handle is replaced on every restart, so anything a listener
//! attaches (e.g. a reader on the child's stdout) must be re-attached on the
//! next call.

use std::fmt;

use crate::exec::SpawnedProcess;

pub type SpawnListener = Box<dyn FnMut(&mut SpawnedProcess) + Send>;

#[derive(Default)]
pub struct SpawnListeners {
    listeners: Vec<SpawnListener>,
}

impl fmt::Debug for SpawnListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnListeners")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl SpawnListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&mut SpawnedProcess) + Send + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Call every listener in subscription order.
    pub fn notify(&mut self, process: &mut SpawnedProcess) {
        for listener in self.listeners.iter_mut() {
            listener(process);
        }
    }
}
