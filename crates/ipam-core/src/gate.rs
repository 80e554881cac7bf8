//! Refresh rate limiting
//!
//! The [`PollGate`] enforces a minimum interval between effective refreshes.
//! Time is read through the [`Clock`] trait so tests can drive it manually.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default minimum delay between consecutive metadata polls
pub const DEFAULT_MIN_POLL_PERIOD: Duration = Duration::from_secs(30);

/// Abstraction over monotonic time for testability.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

/// Production clock delegating to [`Instant::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Minimum-interval gate in front of the refresh operation
///
/// The first call always passes. Afterwards a call passes only once
/// `min_poll_period` has elapsed since the last call that passed. Check and
/// update happen under one lock, so two concurrent callers can never both
/// pass inside the same period.
#[derive(Debug)]
pub struct PollGate {
    last_refresh: Mutex<Option<Instant>>,
    min_poll_period: Duration,
}

impl PollGate {
    /// Create a gate with the given minimum period (zero disables throttling)
    pub fn new(min_poll_period: Duration) -> Self {
        Self {
            last_refresh: Mutex::new(None),
            min_poll_period,
        }
    }

    /// Minimum period between effective refreshes
    pub fn min_poll_period(&self) -> Duration {
        self.min_poll_period
    }

    /// Instant of the last refresh that passed the gate
    pub fn last_refresh(&self) -> Option<Instant> {
        *self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a refresh may run at `now`
    ///
    /// Returns `false` without touching state when the last effective refresh
    /// is less than `min_poll_period` ago; otherwise records `now` and
    /// returns `true`.
    pub fn should_refresh(&self, now: Instant) -> bool {
        let mut last = self
            .last_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = *last
            && now.saturating_duration_since(previous) < self.min_poll_period
        {
            return false;
        }

        *last = Some(now);
        true
    }
}

impl Default for PollGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POLL_PERIOD)
    }
}
