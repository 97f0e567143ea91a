//! Outlier rejection and smoothing of link distances
//!
//! ## Why this filter is lopsided
//!
//! RSSI noise is very asymmetric. Walls, bodies and antenna orientation
//! can only weaken a signal, so a reading is either about right or too
//! far, almost never too close. The filter therefore:
//!
//! - tracks approaches immediately,
//! - lets retreats through only gradually (via a moving average that
//!   hugs the lowest recent readings),
//! - throws away retreats faster than a person can move, and
//! - never turns a missing reading into "got farther". A link that goes
//!   quiet for longer than the distance timeout becomes *away* (unknown),
//!   not distant.
//!
//! ## State machine
//!
//! ```text
//!                  new sample                 timeout, no sample
//! Uninitialized ───────────────▶ Present ─────────────────────────▶ Away
//!                                  ▲  │                              │
//!                                  │  └── steady state each cycle    │
//!                                  └─────────────────────────────────┘
//!                                              new sample
//! ```
//!
//! ## Smoothing
//!
//! Walking the window newest to oldest with a running minimum that starts
//! at the current raw distance, every entry contributes the lowest value
//! seen so far:
//!
//! ```text
//! raw = 4.0, window = [4.0, 2.0, 3.0, 5.0]
//! running min      =  4.0  2.0  2.0  2.0   total = 10.0, average = 2.5
//! published        = min(2.5, 4.0) = 2.5
//! ```

use crate::{
    config::TrackerConfig,
    constants::radio::DISTANCE_INFINITE_M,
    history::{HistoryBuffer, SampleRecord},
    link::Link,
    time::{rate_per_second, Timestamp},
};

/// What the filter did to a link this cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterTransition {
    /// First sample after being uninitialized or away; published as-is
    Arrived,
    /// Timed out; published distance cleared
    Departed,
    /// Still away (or never seen) and nothing new arrived
    Absent,
    /// Present and smoothed
    Updated {
        /// Peak velocity derived from history (m/s)
        velocity: f64,
        /// The raw distance was discarded as an implausible retreat
        velocity_rejected: bool,
    },
}

impl Link {
    /// Run this cycle's filter step
    ///
    /// Must be called once per cycle for every link, after ingest.
    pub fn apply_filter(&mut self, now: Timestamp, config: &TrackerConfig) -> FilterTransition {
        let new_sample = self.pending_sample.take();

        if self.smoothed_distance.is_none() && new_sample.is_some() {
            if let Some(raw) = self.raw_distance {
                self.smoothed_distance = Some(raw);
                self.smoothing_window.clear();
                self.push_window(raw, config.smoothing_len());
                return FilterTransition::Arrived;
            }
        }

        let timed_out = match self.last_accepted_timestamp {
            None => true,
            Some(last) => now.saturating_sub(last) > config.distance_timeout_ms,
        };

        if new_sample.is_none() && timed_out {
            let was_present = self.smoothed_distance.take().is_some();
            self.smoothing_window.clear();
            return if was_present {
                FilterTransition::Departed
            } else {
                FilterTransition::Absent
            };
        }

        let Some(raw) = self.raw_distance else {
            return FilterTransition::Absent;
        };

        let velocity = peak_velocity(self.history.samples());
        self.history.record_velocity(velocity);

        let velocity_rejected = velocity > config.max_velocity;
        let entry = if velocity_rejected {
            // Implausible retreat: repeat the last interval's reading instead
            self.smoothing_window.front().copied().unwrap_or(raw)
        } else {
            raw
        };
        self.push_window(entry, config.smoothing_len());

        let average = monotonic_min_average(self.smoothing_window.iter().copied(), Some(raw));
        self.smoothed_distance = Some(if average < raw { average } else { raw });

        FilterTransition::Updated {
            velocity,
            velocity_rejected,
        }
    }
}

/// Peak velocity of the newest sample relative to its history (m/s)
///
/// Positive is a retreat. If the step from the previous sample is an
/// approach, that approach velocity is returned as-is. Otherwise the newest
/// sample is compared against every older one and the fastest retreat wins.
/// Pairs with no positive time span between them are skipped.
pub fn peak_velocity<const N: usize>(samples: &HistoryBuffer<SampleRecord, N>) -> f64 {
    let (Some(newest), Some(previous)) = (samples.get(0), samples.get(1)) else {
        return 0.0;
    };

    let mut peak = rate_per_second(
        newest.distance - previous.distance,
        previous.timestamp,
        newest.timestamp,
    )
    .unwrap_or(0.0);

    if peak < 0.0 {
        return peak;
    }

    for older in samples.iter().skip(2) {
        let Some(velocity) = rate_per_second(
            newest.distance - older.distance,
            older.timestamp,
            newest.timestamp,
        ) else {
            continue;
        };

        if velocity > peak {
            peak = velocity;
        }
    }

    peak
}

/// Moving average that only lets a value count if it is the lowest so far
///
/// `window` is walked newest first; the running minimum starts at `raw`
/// (or effectively infinity when there is no raw reading). An empty window
/// yields the starting minimum.
pub fn monotonic_min_average(window: impl Iterator<Item = f64>, raw: Option<f64>) -> f64 {
    let mut local_min = raw.unwrap_or(DISTANCE_INFINITE_M);
    let mut total = 0.0;
    let mut count = 0usize;

    for distance in window {
        if distance <= local_min {
            local_min = distance;
        }
        total += local_min;
        count += 1;
    }

    if count == 0 {
        local_min
    } else {
        total / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ingest::{IngestContext, Sighting},
        link::LinkState,
        types::ReceiverKind,
    };

    const REF_POWER: f64 = -55.0;
    const ATTENUATION: f64 = 2.0;

    /// RSSI that converts to exactly the given distance
    fn rssi_for(distance: f64) -> f64 {
        REF_POWER - 10.0 * ATTENUATION * distance.log10()
    }

    fn config() -> TrackerConfig {
        TrackerConfig::default()
            .with_ref_power(REF_POWER)
            .with_attenuation(ATTENUATION)
            .with_smoothing_samples(5)
    }

    fn feed(link: &mut Link, config: &TrackerConfig, distance: f64, ts: Timestamp) -> FilterTransition {
        let ctx = IngestContext {
            now: ts,
            config,
            rssi_offset: 0.0,
            ref_power_override: None,
        };
        link.ingest(
            Sighting {
                rssi: rssi_for(distance),
                tx_power: None,
                reported_timestamp: Some(ts),
            },
            &ctx,
        );
        link.apply_filter(ts, config)
    }

    fn link() -> Link {
        Link::new("dev".into(), "proxy".into(), ReceiverKind::Timestamped)
    }

    fn record(timestamp: Timestamp, distance: f64) -> SampleRecord {
        SampleRecord {
            timestamp,
            rssi: -60.0,
            distance,
            interval_ms: None,
        }
    }

    #[test]
    fn arrival_publishes_raw_distance() {
        let config = config();
        let mut link = link();

        assert_eq!(feed(&mut link, &config, 3.7, 1000), FilterTransition::Arrived);
        assert_eq!(link.smoothed_distance(), link.raw_distance());
        let window: Vec<f64> = link.smoothing_window().iter().copied().collect();
        assert_eq!(window, vec![link.raw_distance().unwrap()]);
        assert_eq!(link.state(), LinkState::Present);
    }

    #[test]
    fn departure_after_timeout() {
        let config = config().with_distance_timeout_ms(30_000);
        let mut link = link();
        feed(&mut link, &config, 2.0, 1000);

        // Within the timeout the link keeps publishing
        link.mark_idle();
        assert!(matches!(
            link.apply_filter(31_000, &config),
            FilterTransition::Updated { .. }
        ));
        assert!(link.smoothed_distance().is_some());

        // One millisecond past the timeout it departs in the same cycle
        link.mark_idle();
        assert_eq!(link.apply_filter(31_001, &config), FilterTransition::Departed);
        assert_eq!(link.smoothed_distance(), None);
        assert!(link.smoothing_window().is_empty());
        assert_eq!(link.state(), LinkState::Away);

        // Staying away is not another departure
        link.mark_idle();
        assert_eq!(link.apply_filter(40_000, &config), FilterTransition::Absent);
    }

    #[test]
    fn return_after_away_is_an_arrival() {
        let config = config().with_distance_timeout_ms(5000);
        let mut link = link();
        feed(&mut link, &config, 2.0, 1000);
        link.apply_filter(10_000, &config);
        assert_eq!(link.state(), LinkState::Away);

        assert_eq!(feed(&mut link, &config, 6.0, 11_000), FilterTransition::Arrived);
        assert_eq!(link.smoothed_distance(), link.raw_distance());
    }

    #[test]
    fn uninitialized_link_stays_absent() {
        let config = config();
        let mut link = link();
        link.mark_idle();
        assert_eq!(link.apply_filter(1000, &config), FilterTransition::Absent);
        assert_eq!(link.state(), LinkState::Uninitialized);
    }

    #[test]
    fn fast_retreat_is_rejected() {
        let config = TrackerConfig::default()
            .with_ref_power(REF_POWER)
            .with_attenuation(ATTENUATION)
            .with_max_velocity(0.5);
        let mut link = link();

        feed(&mut link, &config, 1.0, 0);
        feed(&mut link, &config, 1.0, 1000);
        let before: Vec<f64> = link.smoothing_window().iter().copied().collect();
        assert_eq!(before, vec![1.0, 1.0]);

        // 4 m in 100 ms is 40 m/s
        let transition = feed(&mut link, &config, 5.0, 1100);
        match transition {
            FilterTransition::Updated {
                velocity,
                velocity_rejected,
            } => {
                assert!(velocity_rejected);
                assert!((velocity - 40.0).abs() < 1e-6);
            }
            other => panic!("unexpected transition {:?}", other),
        }

        let after: Vec<f64> = link.smoothing_window().iter().copied().collect();
        assert_eq!(after, vec![1.0, 1.0, 1.0]);
        assert_eq!(link.smoothed_distance(), Some(1.0));
    }

    #[test]
    fn approach_is_tracked_immediately() {
        let config = config();
        let mut link = link();
        feed(&mut link, &config, 8.0, 0);
        feed(&mut link, &config, 8.0, 1000);

        feed(&mut link, &config, 1.0, 2000);
        let smoothed = link.smoothed_distance().unwrap();
        assert!((smoothed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn slow_retreat_is_averaged_down() {
        let config = config();
        let mut link = link();
        feed(&mut link, &config, 2.0, 0);
        feed(&mut link, &config, 2.0, 1000);

        // 1 m/s is allowed but still only pulls the average up slowly
        feed(&mut link, &config, 3.0, 2000);
        let smoothed = link.smoothed_distance().unwrap();
        let raw = link.raw_distance().unwrap();
        assert!(smoothed < raw);
        assert!((smoothed - 7.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn idle_cycles_extend_window_with_last_reading() {
        let config = config();
        let mut link = link();
        feed(&mut link, &config, 2.0, 0);

        for now in [1000, 2000, 3000] {
            link.mark_idle();
            link.apply_filter(now, &config);
        }
        assert_eq!(link.smoothing_window().len(), 4);
        assert_eq!(link.history().velocities().len(), 3);
    }

    #[test]
    fn peak_velocity_scans_history() {
        let mut samples = HistoryBuffer::<SampleRecord, 10>::new();
        samples.push(record(0, 1.0));
        samples.push(record(1000, 2.5));
        samples.push(record(2000, 3.0));

        // Versus previous: 0.5 m/s; versus the oldest: 1.0 m/s
        assert!((peak_velocity(&samples) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn immediate_approach_short_circuits() {
        let mut samples = HistoryBuffer::<SampleRecord, 10>::new();
        samples.push(record(0, 0.5));
        samples.push(record(1000, 4.0));
        samples.push(record(2000, 2.0));

        // Versus previous: -2 m/s, so the older 0.5 m reading is never consulted
        assert!((peak_velocity(&samples) + 2.0).abs() < 1e-9);
    }

    #[test]
    fn peak_velocity_skips_non_positive_spans() {
        let mut samples = HistoryBuffer::<SampleRecord, 10>::new();
        samples.push(record(5000, 1.0));
        samples.push(record(5000, 9.0));
        assert_eq!(peak_velocity(&samples), 0.0);

        let mut single = HistoryBuffer::<SampleRecord, 10>::new();
        single.push(record(0, 1.0));
        assert_eq!(peak_velocity(&single), 0.0);
    }

    #[test]
    fn monotonic_min_average_examples() {
        let window = [4.0, 2.0, 3.0, 5.0];
        assert_eq!(monotonic_min_average(window.iter().copied(), Some(4.0)), 2.5);

        // Empty window falls back to the starting minimum
        assert_eq!(monotonic_min_average(core::iter::empty(), Some(3.0)), 3.0);
        assert_eq!(
            monotonic_min_average(core::iter::empty(), None),
            DISTANCE_INFINITE_M
        );

        // With no raw reading the first entry seeds the minimum
        assert_eq!(monotonic_min_average([6.0, 2.0].iter().copied(), None), 4.0);
    }
}
