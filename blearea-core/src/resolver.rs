//! Nearest-area arbitration across a device's links
//!
//! Runs once per device per cycle, after every link of that device has been
//! filtered. Links with a published distance inside `max_radius` are
//! candidates; the first becomes the provisional winner and each later
//! candidate takes over when it is either decisively fresher or closer and
//! not decisively staler:
//!
//! ```text
//! candidate.ts >  winner.ts + margin                          -> replace
//! candidate.dist < winner.dist && candidate.ts > winner.ts - margin -> replace
//! otherwise                                                   -> keep
//! ```
//!
//! A very close reading that has stopped updating therefore cannot hold
//! the win against a fresher receiver a little farther away, and two
//! receivers of similar freshness are decided on distance.

use crate::{
    device::{Device, ResolvedArea, Selection},
    link::Link,
    receiver::ReceiverRegistry,
    time::Timestamp,
    types::{AreaId, ReceiverId},
};

/// A link that may win the device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate<'a> {
    pub receiver_id: &'a ReceiverId,
    pub distance: f64,
    pub timestamp: Timestamp,
    pub rssi: Option<f64>,
}

impl<'a> Candidate<'a> {
    /// The link as a candidate, if it is present, in range and dated
    pub fn from_link(link: &'a Link, max_radius: f64) -> Option<Self> {
        let distance = link.smoothed_distance()?;
        let timestamp = link.last_accepted_timestamp()?;

        if distance < max_radius && timestamp > 0 {
            Some(Self {
                receiver_id: link.receiver_id(),
                distance,
                timestamp,
                rssi: link.raw_rssi(),
            })
        } else {
            None
        }
    }

    /// Whether this candidate takes the win from `winner`
    pub fn beats(&self, winner: &Candidate<'_>, freshness_margin_ms: u64) -> bool {
        let decisively_fresher = self.timestamp > winner.timestamp.saturating_add(freshness_margin_ms);
        let closer_and_recent = self.distance < winner.distance
            && self.timestamp.saturating_add(freshness_margin_ms) > winner.timestamp;

        decisively_fresher || closer_and_recent
    }
}

/// Pick the winning candidate in iteration order
pub fn select_winner<'a>(
    candidates: impl IntoIterator<Item = Candidate<'a>>,
    freshness_margin_ms: u64,
) -> Option<Candidate<'a>> {
    candidates.into_iter().fold(None, |winner, candidate| match winner {
        Some(winner) if !candidate.beats(&winner, freshness_margin_ms) => Some(winner),
        _ => Some(candidate),
    })
}

/// What area resolution decided for a device
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// The winner's receiver is in an area
    InArea {
        receiver_id: ReceiverId,
        area_id: AreaId,
    },
    /// The winner's receiver has no area assigned
    NoArea { receiver_id: ReceiverId },
    /// No link is present within range
    OutOfRange,
}

/// Resolve and store the device's area
pub fn resolve_area(
    device: &mut Device,
    receivers: &ReceiverRegistry,
    max_radius: f64,
    freshness_margin_ms: u64,
) -> ResolveOutcome {
    let selection = select_winner(
        device
            .links()
            .filter_map(|link| Candidate::from_link(link, max_radius)),
        freshness_margin_ms,
    )
    .map(|winner| {
        let area = match receivers.area_of(winner.receiver_id) {
            Some(area_id) => ResolvedArea::Area(area_id.clone()),
            None => ResolvedArea::NoArea,
        };
        Selection {
            receiver_id: winner.receiver_id.clone(),
            area,
            distance: winner.distance,
            rssi: winner.rssi,
        }
    });

    match selection {
        Some(selection) => {
            let outcome = match &selection.area {
                ResolvedArea::Area(area_id) => ResolveOutcome::InArea {
                    receiver_id: selection.receiver_id.clone(),
                    area_id: area_id.clone(),
                },
                ResolvedArea::NoArea => ResolveOutcome::NoArea {
                    receiver_id: selection.receiver_id.clone(),
                },
            };
            device.apply_selection(selection);
            outcome
        }
        None => {
            device.clear_selection();
            ResolveOutcome::OutOfRange
        }
    }
}
