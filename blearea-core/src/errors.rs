//! Error Types for the Ranging Pipeline
//!
//! ## Design Philosophy
//!
//! Errors in BleArea are always local to one link or one device. A bad
//! calibration value, a receiver with missing metadata or an unassigned
//! area must never stop the rest of the cycle, so the tracker counts and
//! logs them rather than returning them.
//!
//! 1. **Small and Copy**: no `String` payloads, only `&'static str`
//!    reasons and numbers, so errors can be returned from hot paths and
//!    stored in reports freely.
//!
//! 2. **Identifiers are logged, not carried**: the tracker knows which
//!    device and receiver it was working on when an error comes back, so
//!    the error itself stays small.
//!
//! ## Error Categories
//!
//! - `Configuration`: missing or invalid calibration values. Fatal to that
//!   single distance computation only.
//! - `InvalidRssi`: the receiver reported a non-finite signal strength.
//! - `MissingTimestamp`: a timestamp-capable receiver claims a sighting but
//!   has no timestamp for it. Treated as stale.
//! - `NoAreaAssigned`: the winning receiver has no area. The device is
//!   reported with an explicit "no area" placeholder.
//!
//! Stale data is deliberately not an error: it shows up as
//! [`IngestOutcome::Stale`](crate::ingest::IngestOutcome) and in the
//! link's `stale_update_count`.
//!
//! ```rust
//! use blearea_core::distance::estimate_distance;
//! use blearea_core::TrackerError;
//!
//! match estimate_distance(-70.0, None, Some(3.0)) {
//!     Err(TrackerError::Configuration { reason }) => assert_eq!(reason, "ref_power is not set"),
//!     other => panic!("unexpected: {:?}", other),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for tracker operations
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Tracker errors - kept small so they can be returned from the hot path
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TrackerError {
    /// Calibration or limit value missing or outside its valid range
    #[error("Configuration error: {reason}")]
    Configuration {
        /// What was wrong with the configuration
        reason: &'static str,
    },

    /// Signal strength is not a usable number
    #[error("Invalid RSSI value: {value}")]
    InvalidRssi {
        /// The reported value
        value: f64,
    },

    /// Receiver claims a sighting but supplied no timestamp for it
    #[error("Receiver reported a sighting without a timestamp")]
    MissingTimestamp,

    /// The winning receiver has no area assignment
    #[error("Receiver has no area assigned")]
    NoAreaAssigned,
}

impl TrackerError {
    /// Shorthand for a configuration error
    pub const fn configuration(reason: &'static str) -> Self {
        Self::Configuration { reason }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TrackerError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Configuration { reason } =>
                defmt::write!(fmt, "Configuration: {}", reason),
            Self::InvalidRssi { value } =>
                defmt::write!(fmt, "Invalid RSSI {}", value),
            Self::MissingTimestamp =>
                defmt::write!(fmt, "Missing timestamp"),
            Self::NoAreaAssigned =>
                defmt::write!(fmt, "No area assigned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_small() {
        assert!(core::mem::size_of::<TrackerError>() <= 24);
    }

    #[test]
    fn display_messages() {
        let err = TrackerError::configuration("attenuation must be positive");
        assert_eq!(
            format!("{}", err),
            "Configuration error: attenuation must be positive"
        );
        assert_eq!(
            format!("{}", TrackerError::InvalidRssi { value: f64::NAN }),
            "Invalid RSSI value: NaN"
        );
    }
}
