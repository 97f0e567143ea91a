//! Tracked devices and their links
//!
//! A [`Device`] owns one [`Link`] per receiver that has heard it, keyed by
//! receiver id so iteration order (and therefore area resolution) is
//! deterministic. The area-resolution outcome and the home/not-home
//! presence are stored here once per cycle.

use alloc::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    link::Link,
    time::Timestamp,
    types::{AreaId, DeviceId, ReceiverId, ReceiverKind},
};

/// Area a device was resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResolvedArea {
    /// The winning receiver's area
    Area(AreaId),
    /// The winning receiver has no area assigned
    NoArea,
}

impl ResolvedArea {
    pub fn area_id(&self) -> Option<&AreaId> {
        match self {
            Self::Area(id) => Some(id),
            Self::NoArea => None,
        }
    }
}

/// Whether a device has been heard recently by any receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Presence {
    Home,
    #[default]
    NotHome,
}

/// Outcome of area resolution, copied from the winning link
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Selection {
    pub receiver_id: ReceiverId,
    pub area: ResolvedArea,
    pub distance: f64,
    pub rssi: Option<f64>,
}

/// A tracked transmitter and everything the core knows about it
#[derive(Debug, Clone)]
pub struct Device {
    id: DeviceId,
    pub(crate) links: BTreeMap<ReceiverId, Link>,
    pub(crate) ref_power_override: Option<f64>,
    area: Option<ResolvedArea>,
    winning_distance: Option<f64>,
    winning_rssi: Option<f64>,
    winning_receiver_id: Option<ReceiverId>,
    last_known_area: Option<AreaId>,
    last_seen: Option<Timestamp>,
    presence: Presence,
}

impl Device {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            links: BTreeMap::new(),
            ref_power_override: None,
            area: None,
            winning_distance: None,
            winning_rssi: None,
            winning_receiver_id: None,
            last_known_area: None,
            last_seen: None,
            presence: Presence::NotHome,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, receiver: &ReceiverId) -> Option<&Link> {
        self.links.get(receiver)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn ref_power_override(&self) -> Option<f64> {
        self.ref_power_override
    }

    /// Resolved area; `None` when out of range of every receiver
    pub fn area(&self) -> Option<&ResolvedArea> {
        self.area.as_ref()
    }

    /// Resolved area id; `None` when out of range or the winner has no area
    pub fn area_id(&self) -> Option<&AreaId> {
        self.area.as_ref().and_then(ResolvedArea::area_id)
    }

    pub fn winning_distance(&self) -> Option<f64> {
        self.winning_distance
    }

    pub fn winning_rssi(&self) -> Option<f64> {
        self.winning_rssi
    }

    pub fn winning_receiver_id(&self) -> Option<&ReceiverId> {
        self.winning_receiver_id.as_ref()
    }

    /// Last area the device was resolved to, kept while out of range
    pub fn last_known_area(&self) -> Option<&AreaId> {
        self.last_known_area.as_ref()
    }

    /// Newest accepted sample timestamp over all links
    pub fn last_seen(&self) -> Option<Timestamp> {
        self.last_seen
    }

    pub fn presence(&self) -> Presence {
        self.presence
    }

    /// Whether the device was seen within `max_age_ms` of `now`
    pub fn is_active(&self, now: Timestamp, max_age_ms: u64) -> bool {
        self.last_seen
            .map(|seen| now.saturating_sub(seen) < max_age_ms)
            .unwrap_or(false)
    }

    /// Link to `receiver`, created on first sight
    pub(crate) fn ensure_link(&mut self, receiver: &ReceiverId, kind: ReceiverKind) -> &mut Link {
        let device_id = &self.id;
        self.links
            .entry(receiver.clone())
            .or_insert_with(|| Link::new(device_id.clone(), receiver.clone(), kind))
    }

    pub(crate) fn remove_link(&mut self, receiver: &ReceiverId) -> Option<Link> {
        self.links.remove(receiver)
    }

    pub(crate) fn note_seen(&mut self, timestamp: Timestamp) {
        if self.last_seen.map_or(true, |seen| timestamp > seen) {
            self.last_seen = Some(timestamp);
        }
    }

    pub(crate) fn update_presence(&mut self, now: Timestamp, timeout_ms: u64) -> Presence {
        self.presence = if self.is_active(now, timeout_ms) {
            Presence::Home
        } else {
            Presence::NotHome
        };
        self.presence
    }

    pub(crate) fn apply_selection(&mut self, selection: Selection) {
        if let ResolvedArea::Area(area) = &selection.area {
            self.last_known_area = Some(area.clone());
        }
        self.area = Some(selection.area);
        self.winning_distance = Some(selection.distance);
        self.winning_rssi = selection.rssi;
        self.winning_receiver_id = Some(selection.receiver_id);
    }

    pub(crate) fn clear_selection(&mut self) {
        self.area = None;
        self.winning_distance = None;
        self.winning_rssi = None;
        self.winning_receiver_id = None;
    }
}
