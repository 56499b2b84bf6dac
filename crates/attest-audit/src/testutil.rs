//! Deterministic clock for tests.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

use attest_core::traits::Clock;

/// A clock that advances by one second on every call, starting at `start`.
pub(crate) struct StepClock {
    next: AtomicI64,
}

impl StepClock {
    pub(crate) fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }

    /// The instant the `n`-th call (0-based) returned or will return.
    pub(crate) fn instant(start: i64, n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(start + n, 0).unwrap()
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.next.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).unwrap()
    }
}
