//! Time source abstraction.
//!
//! Capture expiry is computed and checked against a [`Clock`] so retention
//! behaviour can be tested deterministically. Production uses [`SystemClock`];
//! tests inject a [`ManualClock`] and advance it explicitly.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::types::Timestamp;

/// Source of "now" for every time-dependent operation in the core.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Manually driven clock for tests.
///
/// Cloning shares the underlying time, so a clone handed to the registry can
/// be advanced from the test body.
#[derive(Debug, Clone)]
pub struct ManualClock {
    micros: Arc<AtomicI64>,
}

impl ManualClock {
    /// Start the clock at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            micros: Arc::new(AtomicI64::new(start.timestamp_micros())),
        }
    }

    /// Start the clock at the current wall-clock time.
    pub fn starting_now() -> Self {
        Self::new(Utc::now())
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let step = delta.num_microseconds().unwrap_or(i64::MAX);
        self.micros.fetch_add(step, Ordering::AcqRel);
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, to: Timestamp) {
        self.micros.store(to.timestamp_micros(), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp_micros(self.micros.load(Ordering::Acquire)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(
            (clock.now() - start).num_seconds(),
            30,
            "clock should have moved exactly 30s"
        );
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::starting_now();
        let other = clock.clone();
        let before = other.now();
        clock.advance(chrono::Duration::minutes(1));
        assert_eq!((other.now() - before).num_seconds(), 60);
    }

    #[test]
    fn manual_clock_set_jumps() {
        let clock = ManualClock::starting_now();
        let target = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
