// src/exec/spawned.rs

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tracing::debug;

use crate::types::InstanceId;

/// The live process handed to spawn listeners.
///
/// Piped streams can be taken by a listener; whatever is left unclaimed is
/// drained by [`SpawnedProcess::drain_unclaimed`] so the child never blocks
/// on a full pipe.
#[derive(Debug)]
pub struct SpawnedProcess {
    instance: InstanceId,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl SpawnedProcess {
    pub fn new(
        instance: InstanceId,
        pid: Option<u32>,
        stdin: Option<ChildStdin>,
        stdout: Option<ChildStdout>,
        stderr: Option<ChildStderr>,
    ) -> Self {
        Self {
            instance,
            pid,
            stdin,
            stdout,
            stderr,
        }
    }

    /// A handle without any streams, for backends that don't run real processes.
    pub fn detached(instance: InstanceId, pid: Option<u32>) -> Self {
        Self::new(instance, pid, None, None, None)
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    pub fn take_stderr(&mut self) -> Option<ChildStderr> {
        self.stderr.take()
    }

    /// Log remaining piped output at debug level until EOF.
    ///
    /// Must be called from within a Tokio runtime when streams are present.
    pub fn drain_unclaimed(self) {
        // Dropping stdin closes it.
        let SpawnedProcess {
            instance,
            stdout,
            stderr,
            ..
        } = self;

        if let Some(stdout) = stdout {
            spawn_drain(instance, "stdout", stdout);
        }
        if let Some(stderr) = stderr {
            spawn_drain(instance, "stderr", stderr);
        }
    }
}

fn spawn_drain<R>(instance: InstanceId, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(%instance, stream, "{}", line);
        }
    });
}
