//! Update cycle coordinator
//!
//! [`Tracker`] owns every device, link and receiver and runs the update
//! cycle in three strictly ordered phases:
//!
//! 1. **Ingest**: each observation is arbitrated against its link; every
//!    link without an observation is marked idle.
//! 2. **Filter**: every link runs the distance filter; device presence is
//!    refreshed.
//! 3. **Resolve**: every device picks its winning receiver and area.
//!
//! Area resolution reads the filtered distance of every link of a device,
//! so a phase only starts once the previous one has finished for all
//! devices. Nothing here blocks or allocates per sample beyond map entries
//! for newly seen devices and receivers.
//!
//! ```rust
//! use blearea_core::{Observation, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
//! let observations = [
//!     Observation::timestamped("phone", "proxy-kitchen", -62.0, 10_000).with_area("kitchen"),
//!     Observation::timestamped("phone", "proxy-hall", -75.0, 10_000).with_area("hall"),
//! ];
//!
//! let report = tracker.run_cycle(10_500, &observations);
//! assert_eq!(report.accepted, 2);
//!
//! let phone = tracker.device(&"phone".into()).unwrap();
//! assert_eq!(phone.area_id().map(|a| a.as_str()), Some("kitchen"));
//! ```

use alloc::{collections::BTreeMap, format, string::String};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::TrackerConfig,
    device::Device,
    distance::link_distance,
    errors::{TrackerError, TrackerResult},
    filter::FilterTransition,
    ingest::{IngestContext, IngestOutcome, Sighting},
    log_limit::SpamGuard,
    receiver::{Receiver, ReceiverRegistry},
    resolver::{resolve_area, ResolveOutcome},
    time::{TimeSource, Timestamp},
    types::{AreaId, DeviceId, Observation, ReceiverId, ReceiverKind},
};

/// Counts from one update cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CycleReport {
    /// Time the cycle ran at
    pub now: Timestamp,
    /// Links that accepted a new sample
    pub accepted: u32,
    /// Links with no new sample, whatever the reason
    pub stale: u32,
    /// Timestamped receivers that sent a sighting without a stamp
    pub missing_timestamps: u32,
    /// Timestamped receivers that went backwards
    pub out_of_order: u32,
    /// New samples whose distance could not be computed for lack of calibration
    pub configuration_errors: u32,
    /// New samples with an unusable RSSI
    pub invalid_rssi: u32,
    pub arrivals: u32,
    pub departures: u32,
    pub velocity_rejections: u32,
    /// Devices resolved to a receiver that has an area
    pub devices_in_area: u32,
    /// Devices resolved to a receiver with no area
    pub devices_without_area: u32,
    /// Devices not within range of any receiver
    pub devices_out_of_range: u32,
}

/// Owned store of devices and receivers plus the cycle logic
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    devices: BTreeMap<DeviceId, Device>,
    receivers: ReceiverRegistry,
    spam: SpamGuard,
    cycle_count: u64,
    last_cycle: Option<Timestamp>,
}

impl Tracker {
    /// Create a tracker, rejecting an invalid configuration
    pub fn new(config: TrackerConfig) -> TrackerResult<Self> {
        config.validate()?;

        Ok(Self {
            spam: SpamGuard::new(config.log_spam_interval_ms),
            config,
            devices: BTreeMap::new(),
            receivers: ReceiverRegistry::new(),
            cycle_count: 0,
            last_cycle: None,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Swap the configuration between cycles
    ///
    /// Smoothing windows are trimmed at once if the sample count shrank.
    pub fn set_config(&mut self, config: TrackerConfig) -> TrackerResult<()> {
        config.validate()?;

        let capacity = config.smoothing_len();
        for device in self.devices.values_mut() {
            for link in device.links.values_mut() {
                link.trim_window(capacity);
            }
        }
        self.spam.set_interval(config.log_spam_interval_ms);
        self.config = config;
        Ok(())
    }

    pub fn register_receiver(
        &mut self,
        id: impl Into<ReceiverId>,
        kind: ReceiverKind,
        area_id: Option<AreaId>,
    ) -> &Receiver {
        self.receivers.register(id.into(), kind, area_id)
    }

    /// Reassign a receiver's area; false if the receiver is unknown
    pub fn set_receiver_area(&mut self, id: &ReceiverId, area_id: Option<AreaId>) -> bool {
        self.spam.forget_prefix(&receiver_key_prefix(id));
        self.receivers.set_area(id, area_id)
    }

    /// Drop a receiver and every link to it
    pub fn remove_receiver(&mut self, id: &ReceiverId) -> Option<Receiver> {
        for device in self.devices.values_mut() {
            device.remove_link(id);
        }
        self.spam.forget_prefix(&receiver_key_prefix(id));
        self.receivers.remove(id)
    }

    /// Drop a device and its links
    pub fn remove_device(&mut self, id: &DeviceId) -> Option<Device> {
        self.spam.forget_prefix(&device_key_prefix(id));
        self.devices.remove(id)
    }

    pub fn device(&self, id: &DeviceId) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn receivers(&self) -> &ReceiverRegistry {
        &self.receivers
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn last_cycle(&self) -> Option<Timestamp> {
        self.last_cycle
    }

    /// Devices with an accepted sample within `max_age_ms` of `now`
    pub fn count_active_devices(&self, now: Timestamp, max_age_ms: u64) -> usize {
        self.devices
            .values()
            .filter(|device| device.is_active(now, max_age_ms))
            .count()
    }

    /// Receivers with an accepted sample within `max_age_ms` of `now`
    pub fn count_active_receivers(&self, now: Timestamp, max_age_ms: u64) -> usize {
        self.receivers.count_active(now, max_age_ms)
    }

    /// Set or clear a device's reference power and apply it immediately
    ///
    /// Raw distances are recomputed from each link's stored RSSI without
    /// adding history. Present links also have their published distance
    /// replaced, and the device's area is resolved again. A device that is
    /// not tracked yet is created so the override applies from its first
    /// sample.
    pub fn set_device_ref_power(
        &mut self,
        id: &DeviceId,
        ref_power: Option<f64>,
    ) -> TrackerResult<()> {
        if let Some(dbm) = ref_power {
            if !dbm.is_finite() {
                return Err(TrackerError::configuration("ref_power must be finite"));
            }
        }

        let now = self.last_cycle.unwrap_or_default();
        let Self {
            config,
            devices,
            receivers,
            spam,
            ..
        } = self;

        let device = devices
            .entry(id.clone())
            .or_insert_with(|| Device::new(id.clone()));
        device.ref_power_override = ref_power;

        for link in device.links.values_mut() {
            let Some(rssi) = link.raw_rssi else {
                continue;
            };
            match link_distance(rssi, config.rssi_offset(&link.receiver_id), ref_power, config) {
                Ok(distance) => link.recalibrate(distance),
                Err(err) => {
                    let key = format!("{}config", device_key_prefix(id));
                    warn_limited!(spam, now, &key, "Cannot recalibrate {} via {}: {}", id, link.receiver_id, err);
                }
            }
        }

        log_info!("Reference power for {} set to {:?}", id, ref_power);
        resolve_device(device, receivers, config, spam, now);
        Ok(())
    }

    /// Run a cycle at the time read once from `clock`
    pub fn run_cycle_with(
        &mut self,
        clock: &dyn TimeSource,
        observations: &[Observation],
    ) -> CycleReport {
        self.run_cycle(clock.now(), observations)
    }

    /// Run one full update cycle at `now`
    ///
    /// Callers must not run cycles on the same tracker concurrently; see
    /// [`SharedTracker`](crate::sync::SharedTracker) for a serialized handle.
    pub fn run_cycle(&mut self, now: Timestamp, observations: &[Observation]) -> CycleReport {
        let mut report = CycleReport {
            now,
            ..CycleReport::default()
        };

        self.ingest_phase(now, observations, &mut report);
        self.filter_phase(now, &mut report);
        self.resolve_phase(now, &mut report);

        self.cycle_count += 1;
        self.last_cycle = Some(now);

        log_debug!(
            "Cycle {} at {}: {} accepted, {} stale, {} in area, {} out of range",
            self.cycle_count,
            now,
            report.accepted,
            report.stale,
            report.devices_in_area,
            report.devices_out_of_range
        );
        report
    }

    fn ingest_phase(&mut self, now: Timestamp, observations: &[Observation], report: &mut CycleReport) {
        // One observation per link: the newest stamp wins, ties go to the later one
        let mut selected: BTreeMap<(&DeviceId, &ReceiverId), &Observation> = BTreeMap::new();
        for obs in observations {
            let key = (&obs.device_id, &obs.receiver_id);
            let newest = selected
                .get(&key)
                .map_or(true, |current| obs.reported_timestamp >= current.reported_timestamp);
            if newest {
                selected.insert(key, obs);
            }
        }

        let Self {
            config,
            devices,
            receivers,
            spam,
            ..
        } = self;
        let config: &TrackerConfig = config;

        for (&(device_id, receiver_id), obs) in &selected {
            if receivers.get(receiver_id).is_none() {
                log_info!("New {:?} receiver {}", obs.receiver_kind, receiver_id);
            }
            let kind = receivers
                .register(receiver_id.clone(), obs.receiver_kind, obs.receiver_area_id.clone())
                .kind;

            let device = devices.entry(device_id.clone()).or_insert_with(|| {
                log_info!("Tracking new device {}", device_id);
                Device::new(device_id.clone())
            });

            let ctx = IngestContext {
                now,
                config,
                rssi_offset: config.rssi_offset(receiver_id),
                ref_power_override: device.ref_power_override,
            };
            let sighting = Sighting {
                rssi: obs.rssi,
                tx_power: obs.tx_power,
                reported_timestamp: obs.reported_timestamp,
            };

            match device.ensure_link(receiver_id, kind).ingest(sighting, &ctx) {
                IngestOutcome::Accepted { timestamp, .. } => {
                    report.accepted += 1;
                    device.note_seen(timestamp);
                    receivers.note_seen(receiver_id, timestamp);
                }
                IngestOutcome::Stale => report.stale += 1,
                IngestOutcome::MissingTimestamp => {
                    report.stale += 1;
                    report.missing_timestamps += 1;
                    let key = format!("{}missing_ts", receiver_key_prefix(receiver_id));
                    warn_limited!(
                        spam, now, &key,
                        "{} ({} for {}), treating as stale",
                        TrackerError::MissingTimestamp, receiver_id, device_id
                    );
                }
                IngestOutcome::OutOfOrder { reported, last } => {
                    report.stale += 1;
                    report.out_of_order += 1;
                    let key = format!("{}out_of_order", receiver_key_prefix(receiver_id));
                    warn_limited!(
                        spam, now, &key,
                        "Receiver {} went backwards for {}: {} < {}",
                        receiver_id, device_id, reported, last
                    );
                }
                IngestOutcome::Rejected(err) => {
                    report.stale += 1;
                    match err {
                        TrackerError::InvalidRssi { .. } => report.invalid_rssi += 1,
                        _ => report.configuration_errors += 1,
                    }
                    let key = format!("{}config", device_key_prefix(device_id));
                    warn_limited!(
                        spam, now, &key,
                        "No distance for {} via {}: {}",
                        device_id, receiver_id, err
                    );
                }
            }
        }

        for device in devices.values_mut() {
            for link in device.links.values_mut() {
                if !selected.contains_key(&(&link.device_id, &link.receiver_id)) {
                    link.mark_idle();
                    report.stale += 1;
                }
            }
        }
    }

    fn filter_phase(&mut self, now: Timestamp, report: &mut CycleReport) {
        let config = &self.config;

        for device in self.devices.values_mut() {
            for link in device.links.values_mut() {
                match link.apply_filter(now, config) {
                    FilterTransition::Arrived => {
                        report.arrivals += 1;
                        log_debug!("{} arrived at {}", link.device_id, link.receiver_id);
                    }
                    FilterTransition::Departed => {
                        report.departures += 1;
                        log_debug!("{} left {}", link.device_id, link.receiver_id);
                    }
                    FilterTransition::Updated {
                        velocity,
                        velocity_rejected: true,
                    } => {
                        report.velocity_rejections += 1;
                        log_debug!(
                            "Discarded retreat of {} from {} at {:.2} m/s",
                            link.device_id,
                            link.receiver_id,
                            velocity
                        );
                    }
                    FilterTransition::Updated { .. } | FilterTransition::Absent => {}
                }
            }
            device.update_presence(now, config.device_tracker_timeout_ms);
        }
    }

    fn resolve_phase(&mut self, now: Timestamp, report: &mut CycleReport) {
        let Self {
            config,
            devices,
            receivers,
            spam,
            ..
        } = self;

        for device in devices.values_mut() {
            match resolve_device(device, receivers, config, spam, now) {
                ResolveOutcome::InArea { .. } => report.devices_in_area += 1,
                ResolveOutcome::NoArea { .. } => report.devices_without_area += 1,
                ResolveOutcome::OutOfRange => report.devices_out_of_range += 1,
            }
        }
    }
}

impl Default for Tracker {
    fn default() -> Self {
        let config = TrackerConfig::default();
        Self {
            spam: SpamGuard::new(config.log_spam_interval_ms),
            config,
            devices: BTreeMap::new(),
            receivers: ReceiverRegistry::new(),
            cycle_count: 0,
            last_cycle: None,
        }
    }
}

fn resolve_device(
    device: &mut Device,
    receivers: &ReceiverRegistry,
    config: &TrackerConfig,
    spam: &mut SpamGuard,
    now: Timestamp,
) -> ResolveOutcome {
    let previous = device.area().cloned();
    let outcome = resolve_area(
        device,
        receivers,
        config.max_radius,
        config.freshness_margin_ms,
    );

    if let ResolveOutcome::NoArea { receiver_id } = &outcome {
        let key = format!("{}no_area", receiver_key_prefix(receiver_id));
        warn_limited!(
            spam, now, &key,
            "{} ({}); {} reported with no area",
            TrackerError::NoAreaAssigned, receiver_id, device.id()
        );
    }

    if device.area() != previous.as_ref() {
        log_debug!(
            "{} moved from {:?} to {:?}",
            device.id(),
            previous,
            device.area()
        );
    }

    outcome
}

fn receiver_key_prefix(id: &ReceiverId) -> String {
    format!("rx/{}/", id)
}

fn device_key_prefix(id: &DeviceId) -> String {
    format!("dev/{}/", id)
}
