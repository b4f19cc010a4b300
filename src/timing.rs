//! Timestamps and interval arithmetic
//!
//! Timestamps are `(seconds, microseconds)` pairs, like `struct timeval`.
//! Intervals are computed in whole microseconds so a borrow from the seconds
//! field never leaves a negative fractional part behind.

use std::time::Instant;

const MICROS_PER_SEC: i64 = 1_000_000;

/// A point in time with microsecond resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    secs: i64,
    micros: i64,
}

impl Timestamp {
    /// `micros` above one second carries into `secs`
    pub fn new(secs: i64, micros: u32) -> Self {
        let micros = i64::from(micros);
        Self {
            secs: secs + micros / MICROS_PER_SEC,
            micros: micros % MICROS_PER_SEC,
        }
    }

    #[cfg(test)]
    pub fn secs(&self) -> i64 {
        self.secs
    }

    #[cfg(test)]
    pub fn subsec_micros(&self) -> i64 {
        self.micros
    }

    fn total_micros(&self) -> i64 {
        self.secs * MICROS_PER_SEC + self.micros
    }
}

/// Signed distance between two timestamps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    micros: i64,
}

impl Interval {
    /// `end - begin`
    pub fn between(begin: Timestamp, end: Timestamp) -> Self {
        Self {
            micros: end.total_micros() - begin.total_micros(),
        }
    }

    pub fn as_micros(&self) -> i64 {
        self.micros
    }

    /// Whole milliseconds, truncated toward zero
    pub fn whole_millis(&self) -> i64 {
        self.micros / 1000
    }

    pub fn is_negative(&self) -> bool {
        self.micros < 0
    }
}

/// Source of timestamps for the probe
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock measured from its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.origin.elapsed();
        let secs = i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX / MICROS_PER_SEC);
        Timestamp::new(secs, elapsed.subsec_micros())
    }
}
