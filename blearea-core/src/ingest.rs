//! Staleness arbitration and raw distance for each link
//!
//! Runs once per link per cycle, before filtering. Its only job is to
//! decide whether the receiver has heard something *new* for this device
//! since the last accepted sample, and if so to record it.
//!
//! ## Deciding what is new
//!
//! ```text
//! Timestamped proxy:   reported stamp missing       -> MissingTimestamp (stale)
//!                      reported stamp <  last stamp -> OutOfOrder       (stale)
//!                      reported stamp == last stamp -> Stale
//!                      reported stamp >  last stamp -> Accepted
//!
//! Polled radio:        rssi unchanged               -> Stale
//!                      rssi changed                 -> Accepted, dated now - POLLED_AGE_OFFSET
//! ```
//!
//! Polled radios only expose the latest RSSI, so a change in RSSI is the
//! only evidence of a new packet. Their synthesized timestamps are aged a
//! little so they never look fresher than a proxy that dates its packets.
//!
//! Links that got no observation at all this cycle still pass through
//! here (as [`Link::mark_idle`]) so their stale counter moves and the
//! filter can time them out.

use crate::{
    config::TrackerConfig,
    constants::time::POLLED_AGE_OFFSET_MS,
    distance::link_distance,
    errors::TrackerError,
    history::SampleRecord,
    link::Link,
    time::Timestamp,
    types::ReceiverKind,
};

/// Everything ingest needs besides the observation itself
#[derive(Debug, Clone, Copy)]
pub struct IngestContext<'a> {
    /// Start time of the current cycle
    pub now: Timestamp,
    pub config: &'a TrackerConfig,
    /// Correction for the receiver's RSSI (dB)
    pub rssi_offset: f64,
    /// Device-specific reference power, if any
    pub ref_power_override: Option<f64>,
}

/// A receiver's report for one device in one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sighting {
    pub rssi: f64,
    pub tx_power: Option<f64>,
    pub reported_timestamp: Option<Timestamp>,
}

/// What ingest made of a link's input this cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IngestOutcome {
    /// A new sample was recorded
    Accepted {
        timestamp: Timestamp,
        distance: f64,
    },
    /// Nothing new
    Stale,
    /// Timestamped receiver reported a stamp older than the last accepted
    OutOfOrder {
        reported: Timestamp,
        last: Timestamp,
    },
    /// Timestamped receiver reported a sighting with no stamp
    MissingTimestamp,
    /// The sample was new but its distance could not be computed
    Rejected(TrackerError),
}

impl IngestOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl Link {
    /// Arbitrate a sighting from this link's receiver
    pub fn ingest(&mut self, sighting: Sighting, ctx: &IngestContext<'_>) -> IngestOutcome {
        let timestamp = match self.kind {
            ReceiverKind::Timestamped => {
                let Some(reported) = sighting.reported_timestamp else {
                    self.stale_update_count += 1;
                    return IngestOutcome::MissingTimestamp;
                };

                match self.last_accepted_timestamp {
                    Some(last) if reported < last => {
                        self.stale_update_count += 1;
                        return IngestOutcome::OutOfOrder { reported, last };
                    }
                    Some(last) if reported == last => {
                        self.stale_update_count += 1;
                        return IngestOutcome::Stale;
                    }
                    _ => reported,
                }
            }
            ReceiverKind::Polled => {
                if self.raw_rssi == Some(sighting.rssi) {
                    self.stale_update_count += 1;
                    return IngestOutcome::Stale;
                }
                ctx.now.saturating_sub(POLLED_AGE_OFFSET_MS)
            }
        };

        self.accept(timestamp, sighting, ctx)
    }

    /// Account for a cycle in which the receiver reported nothing
    pub fn mark_idle(&mut self) -> IngestOutcome {
        self.stale_update_count += 1;
        IngestOutcome::Stale
    }

    fn accept(
        &mut self,
        timestamp: Timestamp,
        sighting: Sighting,
        ctx: &IngestContext<'_>,
    ) -> IngestOutcome {
        let distance = match link_distance(
            sighting.rssi,
            ctx.rssi_offset,
            ctx.ref_power_override,
            ctx.config,
        ) {
            Ok(distance) => distance,
            Err(err) => {
                self.stale_update_count += 1;
                return IngestOutcome::Rejected(err);
            }
        };

        let interval_ms = self
            .last_accepted_timestamp
            .map(|last| timestamp.saturating_sub(last));

        self.raw_rssi = Some(sighting.rssi);
        self.raw_distance = Some(distance);
        self.tx_power = sighting.tx_power;
        self.history.record_sample(SampleRecord {
            timestamp,
            rssi: sighting.rssi,
            distance,
            interval_ms,
        });
        self.last_accepted_timestamp = Some(timestamp);
        self.pending_sample = Some(timestamp);

        IngestOutcome::Accepted {
            timestamp,
            distance,
        }
    }
}
