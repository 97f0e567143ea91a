//! Core ranging engine for BleArea
//!
//! Turns noisy RSSI reports from fixed Bluetooth receivers into a
//! per-receiver distance for every tracked device, and picks the area each
//! device is in from whichever receiver is nearest and fresh.
//!
//! Key constraints:
//! - Per-link state is fixed-size (ring buffers, bounded windows)
//! - Bad calibration or metadata on one link never stops the cycle
//! - Builds without std (`--no-default-features --features alloc`)
//!
//! ```no_run
//! use blearea_core::{Observation, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::indoor()).unwrap();
//!
//! // Once per update interval, with whatever the receivers reported
//! let observations = vec![
//!     Observation::timestamped("aa:bb:cc:dd:ee:ff", "proxy-office", -68.0, 41_200)
//!         .with_area("office"),
//! ];
//! let report = tracker.run_cycle(42_000, &observations);
//!
//! for device in tracker.devices() {
//!     println!("{} -> {:?} ({:?} m)", device.id(), device.area_id(), device.winning_distance());
//! }
//! # let _ = report;
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{ let _ = format_args!($($arg)*); }};
}

#[macro_use]
pub mod log_limit;

pub mod config;
pub mod constants;
pub mod device;
pub mod diagnostics;
pub mod distance;
pub mod errors;
pub mod filter;
pub mod history;
pub mod ingest;
pub mod link;
pub mod receiver;
pub mod resolver;
#[cfg(feature = "std")]
pub mod sync;
pub mod time;
pub mod tracker;
pub mod types;

// Public API
pub use config::TrackerConfig;
pub use device::{Device, Presence, ResolvedArea};
pub use diagnostics::{DeviceSnapshot, LinkSnapshot};
pub use distance::estimate_distance;
pub use errors::{TrackerError, TrackerResult};
pub use link::{Link, LinkState};
pub use receiver::Receiver;
#[cfg(feature = "std")]
pub use sync::SharedTracker;
pub use time::{FixedTime, TimeSource, Timestamp};
#[cfg(feature = "std")]
pub use time::MonotonicClock;
pub use tracker::{CycleReport, Tracker};
pub use types::{AreaId, DeviceId, Observation, ReceiverId, ReceiverKind};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
