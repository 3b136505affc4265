//! Millisecond timestamps and the clock abstraction.
//!
//! Claims carry client timestamps in Unix epoch milliseconds; the server
//! compares them against its own clock, which is injected so tests can pin it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in milliseconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimestampMs(i64);

impl TimestampMs {
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Current system time. A clock before the epoch reads as zero.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Absolute distance to `other`, in milliseconds.
    pub fn abs_diff(&self, other: TimestampMs) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl fmt::Display for TimestampMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Source of server time.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimestampMs;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimestampMs {
        TimestampMs::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_diff_is_symmetric() {
        let a = TimestampMs::new(1_000);
        let b = TimestampMs::new(601_000);
        assert_eq!(a.abs_diff(b), 600_000);
        assert_eq!(b.abs_diff(a), 600_000);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_millis() > 1_577_836_800_000);
    }
}
