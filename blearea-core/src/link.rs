//! Per device/receiver link state
//!
//! A [`Link`] exists for every (device, receiver) pair that has exchanged
//! at least one advertisement. It is created on the first sighting, run
//! through ingest and filtering on every cycle afterwards (whether or not
//! the receiver heard anything new) and only removed by the host.
//!
//! The two halves of the per-cycle work live next door:
//! [`ingest`](crate::ingest) decides whether a new sample exists and
//! records it, [`filter`](crate::filter) turns raw distances into the
//! published estimate.

use heapless::Deque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::buffers::MAX_SMOOTHING_SAMPLES,
    history::LinkHistory,
    time::Timestamp,
    types::{DeviceId, ReceiverId, ReceiverKind},
};

/// Interval-spaced raw distances feeding the moving average, newest first
pub type SmoothingWindow = Deque<f64, MAX_SMOOTHING_SAMPLES>;

/// Where a link sits in its presence lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LinkState {
    /// No sample accepted yet
    Uninitialized,
    /// Publishing a distance
    Present,
    /// Timed out; distance unknown until the next sample arrives
    Away,
}

/// State for one device as heard by one receiver
#[derive(Debug, Clone)]
pub struct Link {
    pub(crate) device_id: DeviceId,
    pub(crate) receiver_id: ReceiverId,
    pub(crate) kind: ReceiverKind,
    pub(crate) last_accepted_timestamp: Option<Timestamp>,
    pub(crate) raw_rssi: Option<f64>,
    pub(crate) raw_distance: Option<f64>,
    pub(crate) tx_power: Option<f64>,
    pub(crate) smoothed_distance: Option<f64>,
    pub(crate) smoothing_window: SmoothingWindow,
    pub(crate) history: LinkHistory,
    pub(crate) stale_update_count: u32,
    /// Timestamp of the sample accepted this cycle, consumed by the filter
    pub(crate) pending_sample: Option<Timestamp>,
}

impl Link {
    pub fn new(device_id: DeviceId, receiver_id: ReceiverId, kind: ReceiverKind) -> Self {
        Self {
            device_id,
            receiver_id,
            kind,
            last_accepted_timestamp: None,
            raw_rssi: None,
            raw_distance: None,
            tx_power: None,
            smoothed_distance: None,
            smoothing_window: Deque::new(),
            history: LinkHistory::new(),
            stale_update_count: 0,
            pending_sample: None,
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn receiver_id(&self) -> &ReceiverId {
        &self.receiver_id
    }

    pub fn kind(&self) -> ReceiverKind {
        self.kind
    }

    pub fn last_accepted_timestamp(&self) -> Option<Timestamp> {
        self.last_accepted_timestamp
    }

    pub fn raw_rssi(&self) -> Option<f64> {
        self.raw_rssi
    }

    pub fn raw_distance(&self) -> Option<f64> {
        self.raw_distance
    }

    pub fn tx_power(&self) -> Option<f64> {
        self.tx_power
    }

    /// Published distance estimate; `None` while away
    pub fn smoothed_distance(&self) -> Option<f64> {
        self.smoothed_distance
    }

    pub fn smoothing_window(&self) -> &SmoothingWindow {
        &self.smoothing_window
    }

    pub fn history(&self) -> &LinkHistory {
        &self.history
    }

    pub fn stale_update_count(&self) -> u32 {
        self.stale_update_count
    }

    /// Whether a sample was accepted this cycle and not yet filtered
    pub fn has_pending_sample(&self) -> bool {
        self.pending_sample.is_some()
    }

    pub fn state(&self) -> LinkState {
        match (self.smoothed_distance, self.last_accepted_timestamp) {
            (Some(_), _) => LinkState::Present,
            (None, None) => LinkState::Uninitialized,
            (None, Some(_)) => LinkState::Away,
        }
    }

    /// Add a raw distance at the front of the window, keeping at most `capacity`
    pub(crate) fn push_window(&mut self, distance: f64, capacity: usize) {
        let capacity = capacity.clamp(1, MAX_SMOOTHING_SAMPLES);
        while self.smoothing_window.len() >= capacity {
            self.smoothing_window.pop_back();
        }
        // Cannot fail: at least one slot is free
        let _ = self.smoothing_window.push_front(distance);
    }

    /// Drop the oldest window entries beyond `capacity`
    pub(crate) fn trim_window(&mut self, capacity: usize) {
        let capacity = capacity.clamp(1, MAX_SMOOTHING_SAMPLES);
        while self.smoothing_window.len() > capacity {
            self.smoothing_window.pop_back();
        }
    }

    /// Apply a recalculated raw distance between cycles
    ///
    /// Used when calibration changes. Only a link that is currently present
    /// has its published estimate, newest history entry and window head
    /// overwritten, so an away link is never made to look fresh.
    pub(crate) fn recalibrate(&mut self, distance: f64) {
        self.raw_distance = Some(distance);

        if self.smoothed_distance.is_some() {
            self.smoothed_distance = Some(distance);
            self.history.rewrite_newest_distance(distance);
            if self.smoothing_window.pop_front().is_some() {
                let _ = self.smoothing_window.push_front(distance);
            }
        }
    }
}
