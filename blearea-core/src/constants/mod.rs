//! Constants for BleArea Core
//!
//! Every tunable number used by the ranging pipeline lives here, grouped by
//! domain, with its unit in the name. Runtime configuration
//! ([`TrackerConfig`](crate::config::TrackerConfig)) takes its defaults from
//! these values.
//!
//! ## Organization
//!
//! - **Radio**: path-loss calibration and area-radius defaults
//! - **Time**: timeouts, freshness margins and clock offsets
//! - **Buffers**: history and smoothing window capacities

/// Radio calibration defaults and motion limits.
pub mod radio;

/// Timeouts and freshness margins, all in milliseconds.
pub mod time;

/// History and smoothing window capacities.
pub mod buffers;

// Re-export commonly used constants for convenience
pub use radio::{
    DEFAULT_ATTENUATION, DEFAULT_MAX_RADIUS_M, DEFAULT_MAX_VELOCITY_M_PER_S,
    DEFAULT_REF_POWER_DBM, DISTANCE_INFINITE_M,
};

pub use time::{
    DEFAULT_DEVICE_TRACKER_TIMEOUT_MS, DISTANCE_TIMEOUT_MS, FRESHNESS_MARGIN_MS,
    LOG_SPAM_INTERVAL_MS, MS_PER_SECOND, POLLED_AGE_OFFSET_MS,
};

pub use buffers::{DEFAULT_SMOOTHING_SAMPLES, HIST_KEEP_COUNT, MAX_SMOOTHING_SAMPLES};
