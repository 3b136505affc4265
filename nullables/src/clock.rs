//! Nullable clock — deterministic time for testing.

use ecobuild_types::{Clock, TimestampMs};
use std::sync::atomic::{AtomicI64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
pub struct NullClock {
    current: AtomicI64,
}

impl NullClock {
    pub fn new(initial_ms: i64) -> Self {
        Self {
            current: AtomicI64::new(initial_ms),
        }
    }

    /// Advance time by a number of milliseconds.
    pub fn advance(&self, ms: i64) {
        self.current.fetch_add(ms, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, ms: i64) {
        self.current.store(ms, Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> TimestampMs {
        TimestampMs::new(self.current.load(Ordering::SeqCst))
    }
}
