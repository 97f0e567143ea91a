//! Radio Constants for BleArea
//!
//! Calibration defaults for the log-distance path-loss model and the
//! physical limits used to reject implausible readings.

// ===== PATH-LOSS CALIBRATION =====

/// Default RSSI expected at 1 metre from a receiver (dBm).
///
/// Typical for a phone or tag advertising at 0 dBm heard by an ESP32
/// proxy. Real values range from about -45 to -70 dBm depending on
/// antenna, enclosure and transmit power.
pub const DEFAULT_REF_POWER_DBM: f64 = -55.0;

/// Default environmental attenuation (path-loss exponent).
///
/// 2.0 is free space; furnished indoor spaces sit between 2.5 and 4.0.
pub const DEFAULT_ATTENUATION: f64 = 3.0;

// ===== AREA RESOLUTION =====

/// Default maximum distance at which a receiver may claim a device (m).
///
/// Readings at or beyond this radius never win an area.
pub const DEFAULT_MAX_RADIUS_M: f64 = 20.0;

/// Stand-in for "no distance known" when seeding the running minimum (m).
pub const DISTANCE_INFINITE_M: f64 = 999.0;

// ===== MOTION LIMITS =====

/// Default maximum plausible retreat speed of a tracked device (m/s).
///
/// A person walking briskly covers about 1.5 m/s; anything that appears
/// to move away faster than this is treated as RSSI noise.
pub const DEFAULT_MAX_VELOCITY_M_PER_S: f64 = 3.0;
