// src/engine/runtime.rs

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::exec::{LaunchSpec, ProcessBackend, RealProcessBackend, SpawnedProcess};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::{InstanceId, SupervisorState};
use crate::watch::patterns::PatternSet;
use crate::watch::resolver::resolve;
use crate::watch::watcher::{NotifyWatchBackend, WatchBackend};

use super::core::CoreSupervisor;
use super::listeners::SpawnListeners;
use super::timers::TimerToken;
use super::{SupervisorCommand, SupervisorEvent};

/// Drives the supervisor core in response to `SupervisorEvent`s and
/// executes its commands against the process and watch backends.
///
/// This is a pure IO shell around `CoreSupervisor`, which contains all the
/// lifecycle semantics. The shell is the only consumer of the event queue,
/// so every transition happens on one logical thread.
pub struct Reloader<P: ProcessBackend, W: WatchBackend> {
    core: CoreSupervisor,
    launch: LaunchSpec,
    autostart: bool,
    fs: Arc<dyn FileSystem>,
    process: P,
    watcher: W,
    listeners: SpawnListeners,
    /// Spawned but not yet announced to listeners.
    pending: Option<SpawnedProcess>,
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    events_rx: mpsc::UnboundedReceiver<SupervisorEvent>,
    /// Events produced while executing commands; handled before the channel.
    local: VecDeque<SupervisorEvent>,
    timer_tasks: HashMap<TimerToken, JoinHandle<()>>,
    state_tx: watch::Sender<SupervisorState>,
}

impl<P: ProcessBackend, W: WatchBackend> fmt::Debug for Reloader<P, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reloader")
            .field("core", &self.core)
            .field("launch", &self.launch)
            .finish_non_exhaustive()
    }
}

impl Reloader<RealProcessBackend, NotifyWatchBackend> {
    /// Reloader wired to real processes, `notify` and `std::fs`.
    pub fn with_real_backends(config: &ConfigFile) -> Result<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let process = RealProcessBackend::new(events_tx.clone());
        let watcher = NotifyWatchBackend::new(events_tx.clone());
        Self::new(
            config,
            Arc::new(RealFileSystem),
            process,
            watcher,
            events_tx,
            events_rx,
        )
    }
}

impl<P: ProcessBackend, W: WatchBackend> Reloader<P, W> {
    /// Build a reloader from a validated config.
    ///
    /// `events_tx` must be the sender the backends report into; the reloader
    /// also uses it for timers and hands clones to [`ReloaderHandle`]s.
    pub fn new(
        config: &ConfigFile,
        fs: Arc<dyn FileSystem>,
        process: P,
        watcher: W,
        events_tx: mpsc::UnboundedSender<SupervisorEvent>,
        events_rx: mpsc::UnboundedReceiver<SupervisorEvent>,
    ) -> Result<Self> {
        let patterns = PatternSet::compile(&config.watch.paths, &config.watch.ignore)?;
        let core = CoreSupervisor::new(patterns, config.timing);
        let (state_tx, _) = watch::channel(core.state());

        Ok(Self {
            core,
            launch: LaunchSpec::from_config(&config.process),
            autostart: config.process.autostart,
            fs,
            process,
            watcher,
            listeners: SpawnListeners::new(),
            pending: None,
            events_tx,
            events_rx,
            local: VecDeque::new(),
            timer_tasks: HashMap::new(),
            state_tx,
        })
    }

    /// Subscribe to the `spawn` notification.
    pub fn on_spawn<F>(&mut self, listener: F)
    where
        F: FnMut(&mut SpawnedProcess) + Send + 'static,
    {
        self.listeners.subscribe(listener);
    }

    pub fn handle(&self) -> ReloaderHandle {
        ReloaderHandle {
            events_tx: self.events_tx.clone(),
            state_rx: self.state_tx.subscribe(),
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.core.state()
    }

    pub fn launch(&self) -> &LaunchSpec {
        &self.launch
    }

    /// Main event loop.
    ///
    /// - Seeds a start request when `autostart` is set.
    /// - Consumes `SupervisorEvent`s and feeds them into the core.
    /// - Executes the commands returned by the core.
    ///
    /// Returns once a shutdown completes, or with the error of a failed
    /// watch-set resolution.
    pub async fn run(mut self) -> Result<()> {
        info!(cmd = %self.launch, "respawn supervisor started");

        if self.autostart {
            self.local.push_back(SupervisorEvent::StartRequested);
        }

        let result = self.event_loop().await;
        if let Err(err) = &result {
            error!(error = %err, "supervisor stopped with an error");
        }
        self.teardown();

        info!("supervisor exiting");
        result
    }

    async fn event_loop(&mut self) -> Result<()> {
        loop {
            let event = match self.local.pop_front() {
                Some(e) => e,
                None => match self.events_rx.recv().await {
                    Some(e) => e,
                    // `self.events_tx` keeps the channel open; `recv` never
                    // yields `None` while the loop runs.
                    None => break,
                },
            };

            if let SupervisorEvent::TimerFired { token } = &event {
                self.timer_tasks.remove(token);
            }
            debug!(?event, "supervisor received event");

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command)?;
            }
            self.publish_state();

            if !step.keep_running {
                info!("core requested exit; stopping supervisor");
                break;
            }
        }
        Ok(())
    }

    /// Execute a single command from the core.
    fn execute_command(&mut self, command: SupervisorCommand) -> Result<()> {
        match command {
            SupervisorCommand::Spawn { instance } => self.spawn(instance),
            SupervisorCommand::Kill { instance } => {
                if let Err(err) = self.process.kill(instance) {
                    warn!(%instance, error = %err, "failed to kill process");
                }
                if self.pending.as_ref().map(|p| p.instance()) == Some(instance) {
                    if let Some(pending) = self.pending.take() {
                        pending.drain_unclaimed();
                    }
                }
            }
            SupervisorCommand::ArmTimer { token, kind, after } => {
                debug!(%token, ?kind, ?after, "arming timer");
                let tx = self.events_tx.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = tx.send(SupervisorEvent::TimerFired { token });
                });
                self.timer_tasks.insert(token, handle);
            }
            SupervisorCommand::CancelTimer { token } => {
                if let Some(handle) = self.timer_tasks.remove(&token) {
                    handle.abort();
                }
            }
            SupervisorCommand::CreateWatches => self.create_watches()?,
            SupervisorCommand::CloseWatches => {
                self.watcher.close_all();
            }
            SupervisorCommand::NotifySpawn { instance } => self.notify_spawn(instance),
            SupervisorCommand::RequestExit => {
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    fn spawn(&mut self, instance: InstanceId) {
        match self.process.spawn(instance, &self.launch) {
            Ok(spawned) => {
                let pid = spawned.pid();
                if let Some(stale) = self.pending.replace(spawned) {
                    stale.drain_unclaimed();
                }
                self.local
                    .push_back(SupervisorEvent::ProcessSpawned { instance, pid });
            }
            Err(err) => {
                error!(%instance, error = %err, "failed to spawn process");
                self.local.push_back(SupervisorEvent::ProcessError {
                    instance,
                    message: err.to_string(),
                });
                self.local.push_back(SupervisorEvent::ProcessClosed {
                    instance,
                    code: None,
                });
            }
        }
    }

    fn notify_spawn(&mut self, instance: InstanceId) {
        let Some(mut spawned) = self.pending.take() else {
            return;
        };
        if spawned.instance() == instance {
            self.listeners.notify(&mut spawned);
        }
        spawned.drain_unclaimed();
    }

    fn create_watches(&mut self) -> Result<()> {
        let set = resolve(self.fs.as_ref(), self.core.patterns())?;

        for target in set.targets() {
            debug!(path = %target.path.display(), kind = ?target.kind, "watch target");
            if let Err(err) = self.watcher.watch(target) {
                warn!(path = %target.path.display(), error = %err, "failed to watch path");
            }
        }

        if set.is_empty() {
            warn!("watch set is empty; file changes will not trigger restarts");
        }
        info!(
            targets = set.len(),
            watched = self.watcher.watched(),
            "watch set created"
        );
        Ok(())
    }

    fn publish_state(&self) {
        let state = self.core.state();
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn teardown(&mut self) {
        for (_, handle) in self.timer_tasks.drain() {
            handle.abort();
        }
        self.watcher.close_all();
        if let Some(pending) = self.pending.take() {
            pending.drain_unclaimed();
        }
        if let Some(process) = self.core.process() {
            if !process.has_exited() {
                let instance = process.instance;
                if let Err(err) = self.process.kill(instance) {
                    warn!(%instance, error = %err, "failed to kill process on exit");
                }
            }
        }
    }
}

/// Cloneable control handle for a running [`Reloader`].
///
/// All operations return immediately; their effect is applied by the
/// supervisor loop. Requests sent after the loop has exited are dropped.
#[derive(Debug, Clone)]
pub struct ReloaderHandle {
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    state_rx: watch::Receiver<SupervisorState>,
}

impl ReloaderHandle {
    pub fn start(&self) {
        self.send(SupervisorEvent::StartRequested);
    }

    pub fn stop(&self) {
        self.send(SupervisorEvent::StopRequested);
    }

    pub fn restart(&self) {
        self.send(SupervisorEvent::RestartRequested);
    }

    /// Stop the child and make [`Reloader::run`] return.
    pub fn shutdown(&self) {
        self.send(SupervisorEvent::ShutdownRequested);
    }

    /// Last published lifecycle state.
    pub fn state(&self) -> SupervisorState {
        *self.state_rx.borrow()
    }

    /// Receiver notified on every state change.
    pub fn state_changes(&self) -> watch::Receiver<SupervisorState> {
        self.state_rx.clone()
    }

    fn send(&self, event: SupervisorEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("supervisor loop has exited; request dropped");
        }
    }
}
