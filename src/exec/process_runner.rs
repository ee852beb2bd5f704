// src/exec/process_runner.rs

//! Per-child wait/kill task.

use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::SupervisorEvent;
use crate::types::InstanceId;

/// Wait for `child` to exit, or kill it when `kill_rx` fires.
///
/// Exactly one `ProcessClosed` is sent for the instance either way. If the
/// kill sender is dropped without firing, the child is killed as well.
pub async fn run_process(
    instance: InstanceId,
    mut child: Child,
    events_tx: mpsc::UnboundedSender<SupervisorEvent>,
    mut kill_rx: oneshot::Receiver<()>,
) {
    let code = tokio::select! {
        status = child.wait() => match status {
            Ok(status) => {
                info!(
                    %instance,
                    exit_code = ?status.code(),
                    success = status.success(),
                    "process exited"
                );
                status.code()
            }
            Err(e) => {
                warn!(%instance, error = %e, "failed to wait for process");
                None
            }
        },

        cancel = &mut kill_rx => {
            match cancel {
                Ok(()) => debug!(%instance, "kill requested"),
                Err(_) => debug!(%instance, "kill channel dropped; killing process"),
            }
            kill_and_reap(instance, &mut child).await
        }
    };

    if events_tx
        .send(SupervisorEvent::ProcessClosed { instance, code })
        .is_err()
    {
        debug!(%instance, "supervisor gone; close notification dropped");
    }
}

async fn kill_and_reap(instance: InstanceId, child: &mut Child) -> Option<i32> {
    if let Err(e) = child.start_kill() {
        // Usually means it already exited; wait() below reaps it.
        debug!(%instance, error = %e, "start_kill failed");
    }
    match child.wait().await {
        Ok(status) => {
            info!(%instance, exit_code = ?status.code(), "process killed");
            status.code()
        }
        Err(e) => {
            warn!(%instance, error = %e, "failed to reap killed process");
            None
        }
    }
}
