// src/engine/timers.rs

//! Timer bookkeeping for the pure core.
//!
//! The core never sleeps. It allocates a [`TimerToken`], asks the shell to
//! arm a timer for it, and later receives `TimerFired { token }`. A token
//! that is no longer armed when it fires is stale and ignored, which makes
//! cancellation race-free even when the sleep already completed.
//!
//! Cooldown, debounce and watcher-delay are *slots*: at most one timer per
//! slot is armed, and arming a slot cancels whatever it held before.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::engine::SupervisorCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Respawn after an unexpected exit.
    Cooldown,
    /// Quiet window between an accepted change and the restart.
    Debounce,
    /// Delay between the first confirmed spawn and building the watch set.
    WatcherDelay,
    /// Expiry of one dedup key. Not a slot; many may be armed at once.
    DedupExpiry,
}

impl TimerKind {
    fn slot(self) -> Option<usize> {
        match self {
            TimerKind::Cooldown => Some(0),
            TimerKind::Debounce => Some(1),
            TimerKind::WatcherDelay => Some(2),
            TimerKind::DedupExpiry => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Timers {
    next: u64,
    armed: HashMap<TimerToken, TimerKind>,
    slots: [Option<TimerToken>; 3],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer of `kind`, cancelling the slot's previous timer if any.
    pub fn arm(
        &mut self,
        kind: TimerKind,
        after: Duration,
        commands: &mut Vec<SupervisorCommand>,
    ) -> TimerToken {
        if kind.slot().is_some() {
            self.cancel_kind(kind, commands);
        }

        self.next += 1;
        let token = TimerToken(self.next);
        self.armed.insert(token, kind);
        if let Some(slot) = kind.slot() {
            self.slots[slot] = Some(token);
        }
        commands.push(SupervisorCommand::ArmTimer { token, kind, after });
        token
    }

    /// Cancel the timer held by the slot of `kind`. No-op when nothing is armed.
    pub fn cancel_kind(&mut self, kind: TimerKind, commands: &mut Vec<SupervisorCommand>) {
        let Some(slot) = kind.slot() else {
            return;
        };
        if let Some(token) = self.slots[slot].take() {
            self.armed.remove(&token);
            commands.push(SupervisorCommand::CancelTimer { token });
        }
    }

    /// Cancel one specific token.
    pub fn cancel(&mut self, token: TimerToken, commands: &mut Vec<SupervisorCommand>) {
        if let Some(kind) = self.armed.remove(&token) {
            if let Some(slot) = kind.slot() {
                if self.slots[slot] == Some(token) {
                    self.slots[slot] = None;
                }
            }
            commands.push(SupervisorCommand::CancelTimer { token });
        }
    }

    /// Consume a firing. Returns `None` for stale tokens.
    pub fn fire(&mut self, token: TimerToken) -> Option<TimerKind> {
        let kind = self.armed.remove(&token)?;
        if let Some(slot) = kind.slot() {
            if self.slots[slot] == Some(token) {
                self.slots[slot] = None;
            }
        }
        Some(kind)
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind.slot() {
            Some(slot) => self.slots[slot].is_some(),
            None => self.armed.values().any(|k| *k == kind),
        }
    }

    /// Token currently held by the slot of `kind`.
    pub fn slot_token(&self, kind: TimerKind) -> Option<TimerToken> {
        kind.slot().and_then(|slot| self.slots[slot])
    }

    /// Number of armed timers of `kind`.
    pub fn armed_count(&self, kind: TimerKind) -> usize {
        self.armed.values().filter(|k| **k == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arming_a_slot_cancels_the_previous_timer() {
        let mut timers = Timers::new();
        let mut cmds = Vec::new();
        let first = timers.arm(TimerKind::Cooldown, Duration::from_secs(3), &mut cmds);
        let second = timers.arm(TimerKind::Cooldown, Duration::from_secs(3), &mut cmds);

        assert_eq!(timers.armed_count(TimerKind::Cooldown), 1);
        assert!(cmds
            .iter()
            .any(|c| matches!(c, SupervisorCommand::CancelTimer { token } if *token == first)));
        assert_eq!(timers.fire(first), None);
        assert_eq!(timers.fire(second), Some(TimerKind::Cooldown));
        assert!(!timers.is_armed(TimerKind::Cooldown));
    }

    #[test]
    fn dedup_timers_coexist() {
        let mut timers = Timers::new();
        let mut cmds = Vec::new();
        let a = timers.arm(TimerKind::DedupExpiry, Duration::from_millis(200), &mut cmds);
        let _b = timers.arm(TimerKind::DedupExpiry, Duration::from_millis(200), &mut cmds);
        assert_eq!(timers.armed_count(TimerKind::DedupExpiry), 2);

        timers.cancel(a, &mut cmds);
        assert_eq!(timers.armed_count(TimerKind::DedupExpiry), 1);
        assert_eq!(timers.fire(a), None);
    }

    #[test]
    fn cancelling_an_empty_slot_emits_nothing() {
        let mut timers = Timers::new();
        let mut cmds = Vec::new();
        timers.cancel_kind(TimerKind::Debounce, &mut cmds);
        assert!(cmds.is_empty());
    }
}
