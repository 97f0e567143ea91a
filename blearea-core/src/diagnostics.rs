//! Point-in-time dumps of tracker state
//!
//! Snapshots copy everything the host may want to show or log for a device
//! and its links. History series are listed newest first. With the `serde`
//! feature they serialize field for field, and `snapshot_json` (std) renders
//! the whole tracker.

use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    device::{Device, Presence, ResolvedArea},
    history::SampleRecord,
    link::{Link, LinkState},
    time::Timestamp,
    tracker::Tracker,
    types::{AreaId, DeviceId, ReceiverId, ReceiverKind},
};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkSnapshot {
    pub receiver_id: ReceiverId,
    pub kind: ReceiverKind,
    pub state: LinkState,
    pub raw_rssi: Option<f64>,
    pub raw_distance: Option<f64>,
    pub smoothed_distance: Option<f64>,
    pub tx_power: Option<f64>,
    pub last_accepted_timestamp: Option<Timestamp>,
    pub stale_update_count: u32,
    pub smoothing_window: Vec<f64>,
    pub samples: Vec<SampleRecord>,
    pub velocities: Vec<f64>,
}

impl From<&Link> for LinkSnapshot {
    fn from(link: &Link) -> Self {
        Self {
            receiver_id: link.receiver_id().clone(),
            kind: link.kind(),
            state: link.state(),
            raw_rssi: link.raw_rssi(),
            raw_distance: link.raw_distance(),
            smoothed_distance: link.smoothed_distance(),
            tx_power: link.tx_power(),
            last_accepted_timestamp: link.last_accepted_timestamp(),
            stale_update_count: link.stale_update_count(),
            smoothing_window: link.smoothing_window().iter().copied().collect(),
            samples: link.history().samples().iter().copied().collect(),
            velocities: link.history().velocities().iter().copied().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub area: Option<ResolvedArea>,
    pub distance: Option<f64>,
    pub rssi: Option<f64>,
    pub winning_receiver_id: Option<ReceiverId>,
    pub last_known_area: Option<AreaId>,
    pub last_seen: Option<Timestamp>,
    pub presence: Presence,
    pub ref_power_override: Option<f64>,
    pub links: Vec<LinkSnapshot>,
}

impl From<&Device> for DeviceSnapshot {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id().clone(),
            area: device.area().cloned(),
            distance: device.winning_distance(),
            rssi: device.winning_rssi(),
            winning_receiver_id: device.winning_receiver_id().cloned(),
            last_known_area: device.last_known_area().cloned(),
            last_seen: device.last_seen(),
            presence: device.presence(),
            ref_power_override: device.ref_power_override(),
            links: device.links().map(LinkSnapshot::from).collect(),
        }
    }
}

impl Tracker {
    /// Snapshot of every device, ordered by id
    pub fn snapshot(&self) -> Vec<DeviceSnapshot> {
        self.devices().map(DeviceSnapshot::from).collect()
    }

    /// Snapshot of every device as pretty-printed JSON
    #[cfg(feature = "std")]
    pub fn snapshot_json(&self) -> Result<std::string::String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;

    fn tracker() -> Tracker {
        let mut tracker = Tracker::default();
        tracker.register_receiver("lounge-proxy", ReceiverKind::Timestamped, Some("lounge".into()));

        // -55 dBm is 1 m and -85 dBm is 10 m at the default calibration
        tracker.run_cycle(
            20_000,
            &[
                Observation::timestamped("phone", "lounge-proxy", -55.0, 19_000).with_tx_power(-4.0),
                Observation::polled("phone", "hci0", -85.0),
            ],
        );
        tracker.run_cycle(21_000, &[Observation::timestamped("phone", "lounge-proxy", -55.0, 20_000)]);
        tracker
    }

    #[test]
    fn snapshot_mirrors_state() {
        let snapshot = tracker().snapshot();
        assert_eq!(snapshot.len(), 1);

        let phone = &snapshot[0];
        assert_eq!(phone.id.as_str(), "phone");
        assert_eq!(phone.area, Some(ResolvedArea::Area("lounge".into())));
        assert_eq!(phone.distance, Some(1.0));
        assert_eq!(phone.presence, Presence::Home);
        assert_eq!(phone.links.len(), 2);

        let hci = &phone.links[0];
        assert_eq!(hci.receiver_id.as_str(), "hci0");
        assert_eq!(hci.kind, ReceiverKind::Polled);
        assert_eq!(hci.stale_update_count, 1);
        assert_eq!(hci.last_accepted_timestamp, Some(17_000));

        let proxy = &phone.links[1];
        assert_eq!(proxy.state, LinkState::Present);
        assert_eq!(proxy.tx_power, None);
        assert_eq!(proxy.samples.len(), 2);
        assert_eq!(proxy.samples[0].timestamp, 20_000);
        assert_eq!(proxy.samples[0].interval_ms, Some(1_000));
        assert_eq!(proxy.smoothing_window, vec![1.0, 1.0]);
        assert_eq!(proxy.velocities, vec![0.0]);
    }

    #[test]
    fn snapshot_json_round_trips() {
        let tracker = tracker();
        let json = tracker.snapshot_json().unwrap();
        assert!(json.contains("\"lounge-proxy\""));

        let parsed: Vec<DeviceSnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tracker.snapshot());
    }
}
