//! Fixed-Size History Buffers for Per-Link Diagnostics and Velocity Lookback
//!
//! ## Overview
//!
//! Each link keeps a short history of what it has heard: when each sample
//! was accepted, its RSSI, the distance it converted to, the gap since the
//! sample before it, and the velocity the filter derived on each cycle.
//! The buffers are fixed-size ring buffers sized at compile time, so a link
//! costs the same memory after a minute as after a month.
//!
//! ## Ordering
//!
//! Everything here is read newest-first: index 0 is the most recent entry.
//! That matches how the filter uses history (compare the newest sample
//! against everything older) and how diagnostics are dumped.
//!
//! ```text
//! HistoryBuffer<T, 4> after pushing a, b, c, d, e:
//! ┌─────┬─────┬─────┬─────┐
//! │  e  │  b  │  c  │  d  │  ← physical slots
//! └─────┴─────┴─────┴─────┘
//!          ↑
//!          └── write_pos = 1
//!
//! Logical view (newest first): [e, d, c, b]
//! ```
//!
//! ## Why Not `heapless::HistoryBuffer`?
//!
//! We need cheap indexed access from the newest end and in-place
//! replacement of the newest entry (used when calibration changes between
//! cycles). A small purpose-built ring keeps both O(1).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{constants::buffers::HIST_KEEP_COUNT, time::Timestamp};

/// Fixed-size ring buffer that overwrites its oldest entry when full
///
/// ## Internal Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - slots `write_pos - len .. write_pos` (mod N) hold `Some`
#[derive(Clone)]
pub struct HistoryBuffer<T: Copy, const N: usize> {
    data: [Option<T>; N],
    write_pos: usize,
    len: usize,
}

impl<T: Copy, const N: usize> HistoryBuffer<T, N> {
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Add an entry as the newest, dropping the oldest when full
    pub fn push(&mut self, entry: T) {
        self.data[self.write_pos] = Some(entry);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn capacity(&self) -> usize {
        N
    }

    /// Entry by age: 0 is the newest, `len - 1` the oldest
    pub fn get(&self, age: usize) -> Option<&T> {
        if age >= self.len {
            return None;
        }

        self.data[self.slot(age)].as_ref()
    }

    pub fn newest(&self) -> Option<&T> {
        self.get(0)
    }

    /// Overwrite the newest entry, returning false when empty
    pub fn replace_newest(&mut self, entry: T) -> bool {
        if self.is_empty() {
            return false;
        }

        let idx = self.slot(0);
        self.data[idx] = Some(entry);
        true
    }

    /// Iterate from newest to oldest
    pub fn iter(&self) -> HistoryIter<'_, T, N> {
        HistoryIter {
            buffer: self,
            age: 0,
        }
    }

    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    /// Physical slot holding the entry of the given age
    fn slot(&self, age: usize) -> usize {
        (self.write_pos + N - 1 - age) % N
    }
}

impl<T: Copy, const N: usize> Default for HistoryBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + core::fmt::Debug, const N: usize> core::fmt::Debug for HistoryBuffer<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Newest-first iterator over a [`HistoryBuffer`]
pub struct HistoryIter<'a, T: Copy, const N: usize> {
    buffer: &'a HistoryBuffer<T, N>,
    age: usize,
}

impl<'a, T: Copy, const N: usize> Iterator for HistoryIter<'a, T, N> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.age)?;
        self.age += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.buffer.len().saturating_sub(self.age);
        (remaining, Some(remaining))
    }
}

/// One accepted sample as recorded by the ingest step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SampleRecord {
    /// When the sample was taken (receiver time or synthesized)
    pub timestamp: Timestamp,
    /// Raw RSSI as reported, before any offset
    pub rssi: f64,
    /// Raw distance the RSSI converted to
    pub distance: f64,
    /// Time since the previously accepted sample, `None` for the first
    pub interval_ms: Option<u64>,
}

/// Recent samples and velocities for one link
#[derive(Debug, Clone, Default)]
pub struct LinkHistory {
    samples: HistoryBuffer<SampleRecord, HIST_KEEP_COUNT>,
    velocities: HistoryBuffer<f64, HIST_KEEP_COUNT>,
}

impl LinkHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_sample(&mut self, sample: SampleRecord) {
        self.samples.push(sample);
    }

    pub fn record_velocity(&mut self, velocity: f64) {
        self.velocities.push(velocity);
    }

    pub fn samples(&self) -> &HistoryBuffer<SampleRecord, HIST_KEEP_COUNT> {
        &self.samples
    }

    pub fn velocities(&self) -> &HistoryBuffer<f64, HIST_KEEP_COUNT> {
        &self.velocities
    }

    pub fn newest_sample(&self) -> Option<&SampleRecord> {
        self.samples.newest()
    }

    /// Replace the newest sample's distance without adding an entry
    pub fn rewrite_newest_distance(&mut self, distance: f64) {
        if let Some(newest) = self.samples.newest().copied() {
            self.samples.replace_newest(SampleRecord { distance, ..newest });
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let buffer: HistoryBuffer<u32, 5> = HistoryBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert!(buffer.newest().is_none());
        assert_eq!(buffer.iter().count(), 0);
    }

    #[test]
    fn newest_first_order() {
        let mut buffer = HistoryBuffer::<u32, 4>::new();
        for i in 0..3 {
            buffer.push(i);
        }

        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![2, 1, 0]);
        assert_eq!(buffer.get(2), Some(&0));
        assert_eq!(buffer.get(3), None);
    }

    #[test]
    fn circular_overwrite() {
        let mut buffer = HistoryBuffer::<u32, 3>::new();
        for i in 0..5 {
            buffer.push(i);
        }

        assert_eq!(buffer.len(), 3);
        assert!(buffer.is_full());

        // Oldest 0 and 1 were overwritten
        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![4, 3, 2]);
    }

    #[test]
    fn replace_newest_in_place() {
        let mut buffer = HistoryBuffer::<u32, 3>::new();
        assert!(!buffer.replace_newest(9));

        for i in 0..4 {
            buffer.push(i);
        }
        assert!(buffer.replace_newest(42));

        let values: Vec<u32> = buffer.iter().copied().collect();
        assert_eq!(values, vec![42, 2, 1]);
    }

    #[test]
    fn clear_resets() {
        let mut buffer = HistoryBuffer::<u32, 3>::new();
        buffer.push(1);
        buffer.push(2);
        buffer.clear();
        assert!(buffer.is_empty());

        buffer.push(7);
        assert_eq!(buffer.newest(), Some(&7));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn link_history_is_bounded() {
        let mut history = LinkHistory::new();
        for i in 0..(HIST_KEEP_COUNT as u64 * 3) {
            history.record_sample(SampleRecord {
                timestamp: i * 1000,
                rssi: -60.0,
                distance: 1.0,
                interval_ms: Some(1000),
            });
            history.record_velocity(0.0);
        }

        assert_eq!(history.len(), HIST_KEEP_COUNT);
        assert_eq!(history.velocities().len(), HIST_KEEP_COUNT);
        assert_eq!(
            history.newest_sample().map(|s| s.timestamp),
            Some((HIST_KEEP_COUNT as u64 * 3 - 1) * 1000)
        );
    }

    #[test]
    fn rewrite_newest_distance_keeps_timestamp() {
        let mut history = LinkHistory::new();
        history.record_sample(SampleRecord {
            timestamp: 5000,
            rssi: -70.0,
            distance: 4.0,
            interval_ms: None,
        });
        history.rewrite_newest_distance(2.5);

        let newest = history.newest_sample().unwrap();
        assert_eq!(newest.distance, 2.5);
        assert_eq!(newest.timestamp, 5000);
        assert_eq!(history.len(), 1);
    }
}
