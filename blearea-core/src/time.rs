//! Time handling for the tracker
//!
//! Every timestamp is a monotonic millisecond count. The tracker never
//! reads a clock on its own: callers either pass `now` explicitly or hand
//! over a [`TimeSource`] that is read exactly once per cycle.

use crate::constants::time::MS_PER_SECOND;

/// Monotonic timestamp in milliseconds
pub type Timestamp = u64;

/// Source of monotonic time for update cycles
pub trait TimeSource {
    /// Current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Monotonic clock measuring milliseconds since it was created (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed().as_millis() as Timestamp
    }
}

/// Fixed time source for testing and replay
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
}

impl FixedTime {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

/// Signed rate of change per second between two timestamped values
///
/// Returns `None` when `later` is not after `earlier`, since no rate can be
/// derived from a zero or negative time span.
pub fn rate_per_second(
    value_delta: f64,
    earlier: Timestamp,
    later: Timestamp,
) -> Option<f64> {
    if later <= earlier {
        return None;
    }

    let elapsed_ms = (later - earlier) as f64;
    Some(value_delta * MS_PER_SECOND as f64 / elapsed_ms)
}
