//! Shared helpers for integration tests
//!
//! Scenarios are described in metres and converted to the RSSI the default
//! calibration maps back to that distance, so assertions can be written
//! in distances.

#![allow(dead_code)]

use blearea_core::{
    constants::{DEFAULT_ATTENUATION, DEFAULT_REF_POWER_DBM},
    Link, Observation, ReceiverKind, Timestamp, Tracker, TrackerConfig,
};

/// RSSI that the default calibration converts to `distance`
pub fn rssi_for_distance(distance: f64) -> f64 {
    DEFAULT_REF_POWER_DBM - 10.0 * DEFAULT_ATTENUATION * distance.log10()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {} to be within 1e-9 of {}",
        actual,
        expected
    );
}

pub fn tracker_with_radius(max_radius: f64) -> Tracker {
    Tracker::new(TrackerConfig::default().with_max_radius(max_radius))
        .expect("valid test configuration")
}

pub fn link<'a>(tracker: &'a Tracker, device: &str, receiver: &str) -> &'a Link {
    tracker
        .device(&device.into())
        .and_then(|d| d.link(&receiver.into()))
        .unwrap_or_else(|| panic!("no link {} -> {}", device, receiver))
}

/// Observations for one cycle, built receiver by receiver
#[derive(Debug, Default)]
pub struct Scene {
    observations: Vec<Observation>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timestamped proxy in `area` hearing `device` at `distance`
    pub fn proxy(
        mut self,
        device: &str,
        receiver: &str,
        area: &str,
        distance: f64,
        timestamp: Timestamp,
    ) -> Self {
        self.observations.push(
            Observation::timestamped(device, receiver, rssi_for_distance(distance), timestamp)
                .with_area(area),
        );
        self
    }

    /// A polled local radio in `area` hearing `device` at `distance`
    pub fn polled(mut self, device: &str, receiver: &str, area: &str, distance: f64) -> Self {
        self.observations.push(
            Observation::polled(device, receiver, rssi_for_distance(distance)).with_area(area),
        );
        self
    }

    /// A timestamped proxy with no area, or a hand-built observation
    pub fn raw(mut self, observation: Observation) -> Self {
        self.observations.push(observation);
        self
    }

    /// A timestamped proxy sighting that lacks its timestamp
    pub fn undated(mut self, device: &str, receiver: &str, distance: f64) -> Self {
        let mut observation =
            Observation::polled(device, receiver, rssi_for_distance(distance));
        observation.receiver_kind = ReceiverKind::Timestamped;
        self.observations.push(observation);
        self
    }

    pub fn run(&self, tracker: &mut Tracker, now: Timestamp) -> blearea_core::CycleReport {
        tracker.run_cycle(now, &self.observations)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }
}
