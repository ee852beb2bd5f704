// src/watch/multiplexer.rs

//! Pure half of the watch multiplexer.
//!
//! Native notifications go through, in order:
//! 1. the active-set gate (nothing is watched before creation / after stop),
//! 2. the acceptance filter (ignored or unwatched paths are dropped),
//! 3. the dedup table (`(kind, path)` seen within the TTL is dropped),
//! 4. the state gate (only `STARTED` may move to `RESTART_DELAY`).
//!
//! The caller owns the state transition and the debounce timer; this type
//! only answers whether a notification qualifies.

use std::collections::HashMap;
use std::time::Duration;

use tracing::trace;

use crate::engine::SupervisorCommand;
use crate::engine::timers::{TimerKind, TimerToken, Timers};
use crate::types::{ChangeKind, SupervisorState};
use crate::watch::patterns::PatternSet;

/// Key used to collapse repeated native notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub kind: ChangeKind,
    pub path: String,
}

/// Recently seen keys, each with its own expiry timer.
#[derive(Debug, Default)]
pub struct DedupTable {
    keys: HashMap<DedupKey, TimerToken>,
    by_token: HashMap<TimerToken, DedupKey>,
}

impl DedupTable {
    pub fn contains(&self, key: &DedupKey) -> bool {
        self.keys.contains_key(key)
    }

    pub fn insert(&mut self, key: DedupKey, token: TimerToken) {
        self.by_token.insert(token, key.clone());
        self.keys.insert(key, token);
    }

    /// Drop the key whose expiry timer is `token`.
    pub fn expire(&mut self, token: TimerToken) -> Option<DedupKey> {
        let key = self.by_token.remove(&token)?;
        self.keys.remove(&key);
        Some(key)
    }

    /// Remove every key, returning their timer tokens.
    pub fn drain_tokens(&mut self) -> Vec<TimerToken> {
        self.keys.clear();
        self.by_token.drain().map(|(token, _)| token).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Lifecycle of the watch set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchPhase {
    /// No watch set, nothing scheduled.
    #[default]
    Idle,
    /// Watcher-delay timer armed after the first confirmed spawn.
    Delayed,
    /// Watch set built; notifications are considered.
    Active,
}

/// Why a notification was or was not turned into a debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    Inactive,
    NotAccepted,
    Duplicate,
    NotStarted,
    /// Qualifies: the caller moves to `RESTART_DELAY` and arms the debounce.
    Debounce,
}

#[derive(Debug)]
pub struct WatchMultiplexer {
    patterns: PatternSet,
    phase: WatchPhase,
    dedup: DedupTable,
    dedup_ttl: Duration,
}

impl WatchMultiplexer {
    pub fn new(patterns: PatternSet, dedup_ttl: Duration) -> Self {
        Self {
            patterns,
            phase: WatchPhase::Idle,
            dedup: DedupTable::default(),
            dedup_ttl,
        }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    pub fn dedup(&self) -> &DedupTable {
        &self.dedup
    }

    /// Whether file-triggered restarts are configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Arm the watcher-delay timer if no watch set exists or is scheduled.
    pub fn schedule(
        &mut self,
        delay: Duration,
        timers: &mut Timers,
        commands: &mut Vec<SupervisorCommand>,
    ) {
        if !self.is_enabled() || self.phase != WatchPhase::Idle {
            return;
        }
        timers.arm(TimerKind::WatcherDelay, delay, commands);
        self.phase = WatchPhase::Delayed;
    }

    /// The watcher delay elapsed: ask the shell to build the watch set.
    pub fn activate(&mut self, commands: &mut Vec<SupervisorCommand>) {
        if self.phase != WatchPhase::Delayed {
            return;
        }
        self.phase = WatchPhase::Active;
        commands.push(SupervisorCommand::CreateWatches);
    }

    /// Tear down the watch set (or the pending delay) and forget dedup keys.
    pub fn close(&mut self, timers: &mut Timers, commands: &mut Vec<SupervisorCommand>) {
        match self.phase {
            WatchPhase::Idle => {}
            WatchPhase::Delayed => timers.cancel_kind(TimerKind::WatcherDelay, commands),
            WatchPhase::Active => commands.push(SupervisorCommand::CloseWatches),
        }
        self.phase = WatchPhase::Idle;

        for token in self.dedup.drain_tokens() {
            timers.cancel(token, commands);
        }
    }

    pub fn on_change(
        &mut self,
        kind: ChangeKind,
        path: &str,
        state: SupervisorState,
        timers: &mut Timers,
        commands: &mut Vec<SupervisorCommand>,
    ) -> ChangeVerdict {
        if self.phase != WatchPhase::Active {
            return ChangeVerdict::Inactive;
        }
        if !self.patterns.accepts(path) {
            trace!(%kind, path, "change not accepted by patterns");
            return ChangeVerdict::NotAccepted;
        }

        let key = DedupKey {
            kind,
            path: path.to_string(),
        };
        if self.dedup.contains(&key) {
            return ChangeVerdict::Duplicate;
        }
        let token = timers.arm(TimerKind::DedupExpiry, self.dedup_ttl, commands);
        self.dedup.insert(key, token);

        if state != SupervisorState::Started {
            return ChangeVerdict::NotStarted;
        }
        ChangeVerdict::Debounce
    }

    /// A dedup expiry timer fired.
    pub fn expire(&mut self, token: TimerToken) {
        if let Some(key) = self.dedup.expire(token) {
            trace!(kind = %key.kind, path = %key.path, "dedup key expired");
        }
    }
}
