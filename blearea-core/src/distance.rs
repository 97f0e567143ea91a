//! RSSI to distance conversion
//!
//! Uses the log-distance path-loss model:
//!
//! ```text
//! distance = 10 ^ ((ref_power - rssi) / (10 * attenuation))
//! ```
//!
//! - `ref_power` is the RSSI expected at 1 metre (dBm, negative). It depends
//!   on both receiver sensitivity and transmitter calibration.
//! - `attenuation` is the environmental path-loss exponent (> 0).
//!
//! Nothing here applies defaults. Callers resolve the effective values
//! first: the per-device `ref_power` override wins over the configured
//! value, and the per-receiver RSSI offset is added to the reading before
//! conversion. [`link_distance`] bundles those rules.

use crate::{
    config::TrackerConfig,
    errors::{TrackerError, TrackerResult},
};

/// Convert a signal strength to a distance in metres
///
/// Fails with [`TrackerError::Configuration`] when either calibration value
/// is unset or unusable, and with [`TrackerError::InvalidRssi`] when the
/// reading is not finite.
///
/// ```rust
/// use blearea_core::distance::estimate_distance;
///
/// // At the reference power the device is exactly 1 m away
/// assert_eq!(estimate_distance(-55.0, Some(-55.0), Some(3.0)).unwrap(), 1.0);
///
/// // 30 dB weaker with an exponent of 3 is ten times farther
/// let d = estimate_distance(-85.0, Some(-55.0), Some(3.0)).unwrap();
/// assert!((d - 10.0).abs() < 1e-9);
/// ```
pub fn estimate_distance(
    rssi: f64,
    ref_power: Option<f64>,
    attenuation: Option<f64>,
) -> TrackerResult<f64> {
    let ref_power = ref_power.ok_or(TrackerError::configuration("ref_power is not set"))?;
    let attenuation = attenuation.ok_or(TrackerError::configuration("attenuation is not set"))?;

    if !ref_power.is_finite() {
        return Err(TrackerError::configuration("ref_power must be finite"));
    }
    if !attenuation.is_finite() || attenuation <= 0.0 {
        return Err(TrackerError::configuration("attenuation must be positive"));
    }
    if !rssi.is_finite() {
        return Err(TrackerError::InvalidRssi { value: rssi });
    }

    Ok(libm::pow(10.0, (ref_power - rssi) / (10.0 * attenuation)))
}

/// Reference power to use for a device: its override, else the configured value
pub fn effective_ref_power(override_dbm: Option<f64>, config: &TrackerConfig) -> Option<f64> {
    override_dbm.or(config.ref_power)
}

/// Distance for one link's reading with all per-link adjustments applied
pub fn link_distance(
    rssi: f64,
    rssi_offset: f64,
    ref_power_override: Option<f64>,
    config: &TrackerConfig,
) -> TrackerResult<f64> {
    estimate_distance(
        rssi + rssi_offset,
        effective_ref_power(ref_power_override, config),
        config.attenuation,
    )
}
