//! Buffer Sizes
//!
//! Per-link state is fixed-size so that memory use scales only with the
//! number of links, never with how long the tracker has been running.

/// Entries kept in each per-link history series.
///
/// Covers the timestamp, RSSI, distance, interval and velocity series.
/// Ten samples is plenty for velocity lookback at a 1 Hz update rate.
pub const HIST_KEEP_COUNT: usize = 10;

/// Hard capacity of the smoothing window.
///
/// The configured sample count may be anything from 1 up to this value.
pub const MAX_SMOOTHING_SAMPLES: usize = 64;

/// Default number of interval-spaced samples in the smoothing window.
///
/// Bigger windows make distance increases slower. 10 or 20 work well.
pub const DEFAULT_SMOOTHING_SAMPLES: u32 = 20;
