use std::fmt;
use std::process::Stdio;

use serde::Deserialize;

/// Lifecycle state of the supervised process.
///
/// Exactly one state holds at any instant. Transitions are driven by the
/// pure core in [`crate::engine::CoreSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupervisorState {
    /// No process, nothing scheduled.
    #[default]
    Stopped,
    /// Spawn issued, waiting for confirmation.
    Starting,
    /// Process confirmed running.
    Started,
    /// A file change was accepted; debounce window is open.
    RestartDelay,
    /// Kill issued as part of a restart; respawn on close.
    Restarting,
    /// Kill issued as part of a stop; settle in `Stopped` on close.
    Stopping,
    /// Process exited on its own; cooldown timer armed.
    Closed,
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Stopped => "STOPPED",
            SupervisorState::Starting => "STARTING",
            SupervisorState::Started => "STARTED",
            SupervisorState::RestartDelay => "RESTART_DELAY",
            SupervisorState::Restarting => "RESTARTING",
            SupervisorState::Stopping => "STOPPING",
            SupervisorState::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one of the child's standard streams is wired.
///
/// - `Inherit`: share the supervisor's stream (default).
/// - `Piped`: create a pipe; the parent end is handed to spawn listeners.
/// - `Null`: connect to the null device.
///
/// `pipe` and `ignore` are accepted as spellings of `piped` and `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StdioMode {
    #[default]
    Inherit,
    #[serde(alias = "pipe")]
    Piped,
    #[serde(alias = "ignore")]
    Null,
}

impl StdioMode {
    pub fn to_stdio(self) -> Stdio {
        match self {
            StdioMode::Inherit => Stdio::inherit(),
            StdioMode::Piped => Stdio::piped(),
            StdioMode::Null => Stdio::null(),
        }
    }
}

/// Identifier of one spawned process instance.
///
/// Every spawn gets a fresh id; notifications about older instances are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Normalized kind of a native file-system notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Change,
    Rename,
    Remove,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Change => "change",
            ChangeKind::Rename => "rename",
            ChangeKind::Remove => "remove",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
