//! Time-Related Constants
//!
//! All timestamps in BleArea are monotonic milliseconds, so every
//! duration here is expressed in milliseconds too.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== UPDATE CYCLE =====

/// Nominal interval between update cycles (milliseconds).
///
/// Hosts usually drive [`Tracker::run_cycle`](crate::tracker::Tracker::run_cycle)
/// at roughly this rate.
pub const UPDATE_INTERVAL_MS: u64 = 1050;

// ===== DATA FRESHNESS =====

/// How long a link may go without a new sample before it is marked away.
///
/// Long enough to ride out dropped packets and brief occlusion.
pub const DISTANCE_TIMEOUT_MS: u64 = 30_000;

/// Timestamp advantage that lets a farther receiver beat a closer one.
///
/// Also the largest timestamp disadvantage a closer receiver may have and
/// still take the win.
pub const FRESHNESS_MARGIN_MS: u64 = 1000;

/// Age applied to synthesized timestamps from polled receivers.
///
/// Polled radios report no per-packet time, so their samples are dated
/// slightly in the past and never outrank a timestamped proxy on freshness.
pub const POLLED_AGE_OFFSET_MS: u64 = 3000;

/// Time without any accepted sample before a device is "not home".
pub const DEFAULT_DEVICE_TRACKER_TIMEOUT_MS: u64 = 30_000;

// ===== LOGGING =====

/// Minimum gap between repeats of the same rate-limited log message.
pub const LOG_SPAM_INTERVAL_MS: u64 = 300_000;
