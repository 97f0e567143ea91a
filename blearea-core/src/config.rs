//! Tracker configuration
//!
//! One struct carries every tunable the pipeline reads. Defaults come from
//! [`constants`](crate::constants); hosts override what they need with the
//! `with_*` setters or by deserializing (missing fields fall back to the
//! defaults).
//!
//! ```rust
//! use blearea_core::config::TrackerConfig;
//!
//! let config = TrackerConfig::indoor()
//!     .with_max_radius(8.0)
//!     .with_rssi_offset("proxy-lounge", -3.0);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.rssi_offset(&"proxy-lounge".into()), -3.0);
//! ```

use alloc::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        buffers::{DEFAULT_SMOOTHING_SAMPLES, MAX_SMOOTHING_SAMPLES},
        radio::{
            DEFAULT_ATTENUATION, DEFAULT_MAX_RADIUS_M, DEFAULT_MAX_VELOCITY_M_PER_S,
            DEFAULT_REF_POWER_DBM,
        },
        time::{
            DEFAULT_DEVICE_TRACKER_TIMEOUT_MS, DISTANCE_TIMEOUT_MS, FRESHNESS_MARGIN_MS,
            LOG_SPAM_INTERVAL_MS,
        },
    },
    errors::{TrackerError, TrackerResult},
    types::ReceiverId,
};

/// Runtime configuration for a [`Tracker`](crate::tracker::Tracker)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct TrackerConfig {
    /// RSSI expected at 1 metre (dBm). `None` means uncalibrated.
    pub ref_power: Option<f64>,

    /// Environmental path-loss exponent. `None` means uncalibrated.
    pub attenuation: Option<f64>,

    /// Receivers at or beyond this distance (m) cannot claim a device
    pub max_radius: f64,

    /// Fastest plausible retreat (m/s); faster readings are discarded
    pub max_velocity: f64,

    /// Number of interval-spaced samples in the smoothing window
    pub smoothing_samples: u32,

    /// Time without a new sample before a link is marked away (ms)
    pub distance_timeout_ms: u64,

    /// Timestamp advantage that overrides distance in area resolution (ms)
    pub freshness_margin_ms: u64,

    /// Time without any sample before a device is not home (ms)
    pub device_tracker_timeout_ms: u64,

    /// Gap between repeats of the same rate-limited warning (ms)
    pub log_spam_interval_ms: u64,

    /// Per-receiver correction added to every RSSI it reports (dB)
    pub rssi_offsets: BTreeMap<ReceiverId, f64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ref_power: Some(DEFAULT_REF_POWER_DBM),
            attenuation: Some(DEFAULT_ATTENUATION),
            max_radius: DEFAULT_MAX_RADIUS_M,
            max_velocity: DEFAULT_MAX_VELOCITY_M_PER_S,
            smoothing_samples: DEFAULT_SMOOTHING_SAMPLES,
            distance_timeout_ms: DISTANCE_TIMEOUT_MS,
            freshness_margin_ms: FRESHNESS_MARGIN_MS,
            device_tracker_timeout_ms: DEFAULT_DEVICE_TRACKER_TIMEOUT_MS,
            log_spam_interval_ms: LOG_SPAM_INTERVAL_MS,
            rssi_offsets: BTreeMap::new(),
        }
    }
}

impl TrackerConfig {
    /// Homes and offices: walls everywhere, receivers a room apart
    pub fn indoor() -> Self {
        Self {
            attenuation: Some(3.5),
            max_radius: 10.0,
            max_velocity: 2.0,
            ..Self::default()
        }
    }

    /// Halls, warehouses and open-plan floors: fewer obstructions
    pub fn open_plan() -> Self {
        Self {
            attenuation: Some(2.2),
            max_radius: 30.0,
            max_velocity: 4.0,
            smoothing_samples: 10,
            ..Self::default()
        }
    }

    pub fn with_ref_power(mut self, dbm: f64) -> Self {
        self.ref_power = Some(dbm);
        self
    }

    pub fn with_attenuation(mut self, attenuation: f64) -> Self {
        self.attenuation = Some(attenuation);
        self
    }

    pub fn with_max_radius(mut self, metres: f64) -> Self {
        self.max_radius = metres;
        self
    }

    pub fn with_max_velocity(mut self, metres_per_sec: f64) -> Self {
        self.max_velocity = metres_per_sec;
        self
    }

    pub fn with_smoothing_samples(mut self, samples: u32) -> Self {
        self.smoothing_samples = samples;
        self
    }

    pub fn with_distance_timeout_ms(mut self, ms: u64) -> Self {
        self.distance_timeout_ms = ms;
        self
    }

    pub fn with_freshness_margin_ms(mut self, ms: u64) -> Self {
        self.freshness_margin_ms = ms;
        self
    }

    pub fn with_device_tracker_timeout_ms(mut self, ms: u64) -> Self {
        self.device_tracker_timeout_ms = ms;
        self
    }

    pub fn with_rssi_offset(mut self, receiver: impl Into<ReceiverId>, offset_db: f64) -> Self {
        self.rssi_offsets.insert(receiver.into(), offset_db);
        self
    }

    /// RSSI correction for a receiver, zero when none is configured
    pub fn rssi_offset(&self, receiver: &ReceiverId) -> f64 {
        self.rssi_offsets.get(receiver).copied().unwrap_or(0.0)
    }

    /// Smoothing window length as a buffer size
    pub fn smoothing_len(&self) -> usize {
        (self.smoothing_samples as usize).clamp(1, MAX_SMOOTHING_SAMPLES)
    }

    /// Check every value is usable
    ///
    /// Calibration values may be left unset here; that is reported per
    /// distance computation instead, so one missing value does not stop
    /// the tracker from running.
    pub fn validate(&self) -> TrackerResult<()> {
        if let Some(attenuation) = self.attenuation {
            if !attenuation.is_finite() || attenuation <= 0.0 {
                return Err(TrackerError::configuration("attenuation must be positive"));
            }
        }
        if let Some(ref_power) = self.ref_power {
            if !ref_power.is_finite() {
                return Err(TrackerError::configuration("ref_power must be finite"));
            }
        }
        if !self.max_radius.is_finite() || self.max_radius <= 0.0 {
            return Err(TrackerError::configuration("max_radius must be positive"));
        }
        if self.max_velocity.is_nan() || self.max_velocity <= 0.0 {
            return Err(TrackerError::configuration("max_velocity must be positive"));
        }
        if self.smoothing_samples == 0 {
            return Err(TrackerError::configuration("smoothing_samples must be at least 1"));
        }
        if self.smoothing_samples as usize > MAX_SMOOTHING_SAMPLES {
            return Err(TrackerError::configuration("smoothing_samples exceeds window capacity"));
        }
        if self.rssi_offsets.values().any(|offset| !offset.is_finite()) {
            return Err(TrackerError::configuration("rssi offsets must be finite"));
        }
        Ok(())
    }
}
