//! Scheduled session work.
//!
//! At most one deadline per [`TimerKind`]. Rescheduling a kind replaces its
//! deadline; stopping the session cancels them all.

use std::collections::HashMap;
use std::time::Instant;

/// Work the session schedules for later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Check whether the last ping was answered.
    PingCheck,
    /// Decrement the idle countdown.
    Countdown,
}

/// Cancellable set of deadlines.
#[derive(Clone, Debug, Default)]
pub struct TimerSet {
    deadlines: HashMap<TimerKind, Instant>,
}

impl TimerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` at `at`, replacing any earlier deadline for it.
    pub fn schedule(&mut self, kind: TimerKind, at: Instant) {
        self.deadlines.insert(kind, at);
    }

    /// Cancel one timer. Returns true if it was scheduled.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines.remove(&kind).is_some()
    }

    /// Cancel every timer.
    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    /// Check if `kind` is scheduled.
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Deadline of `kind`, if scheduled.
    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.deadlines.get(&kind).copied()
    }

    /// Earliest deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(kind, at)| (*at, *kind))
            .collect();
        due.sort_by_key(|(at, _)| *at);

        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Number of scheduled timers.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Check if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
