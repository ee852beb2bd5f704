// src/control.rs

//! Out-of-band control of a running supervisor through unix signals.
//!
//! | signal    | request     |
//! |-----------|-------------|
//! | `SIGUSR1` | `start()`   |
//! | `SIGHUP`  | `restart()` |
//! | `SIGUSR2` | `stop()`    |
//!
//! This is how a `--no-autostart` supervisor gets its first start
//! (`kill -USR1 <pid>`).

use std::fmt;

use crate::engine::ReloaderHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Start,
    Restart,
    Stop,
}

impl ControlRequest {
    pub fn apply(self, handle: &ReloaderHandle) {
        match self {
            ControlRequest::Start => handle.start(),
            ControlRequest::Restart => handle.restart(),
            ControlRequest::Stop => handle.stop(),
        }
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlRequest::Start => "start",
            ControlRequest::Restart => "restart",
            ControlRequest::Stop => "stop",
        })
    }
}

/// Install the signal handlers and forward every delivery to `handle`.
///
/// The handlers are registered before this returns, so a signal sent right
/// afterwards is not lost.
#[cfg(unix)]
pub fn listen(handle: ReloaderHandle) -> std::io::Result<tokio::task::JoinHandle<()>> {
    use tokio::signal::unix::{SignalKind, signal};
    use tracing::info;

    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut hup = signal(SignalKind::hangup())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;

    Ok(tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                Some(()) = usr1.recv() => ControlRequest::Start,
                Some(()) = hup.recv() => ControlRequest::Restart,
                Some(()) = usr2.recv() => ControlRequest::Stop,
                else => break,
            };
            info!(%request, "control signal received");
            request.apply(&handle);
        }
    }))
}
