//! Registry of fixed receivers
//!
//! A receiver's capability is fixed when it is registered, either
//! explicitly by the host or implicitly by its first observation. Its area
//! assignment can change at any time.

use alloc::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    time::Timestamp,
    types::{AreaId, ReceiverId, ReceiverKind},
};

/// A fixed scanner or proxy
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Receiver {
    pub id: ReceiverId,
    pub kind: ReceiverKind,
    pub area_id: Option<AreaId>,
    /// Newest accepted sample timestamp from this receiver
    pub last_seen: Option<Timestamp>,
}

#[derive(Debug, Clone, Default)]
pub struct ReceiverRegistry {
    receivers: BTreeMap<ReceiverId, Receiver>,
}

impl ReceiverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a receiver, or update the area of a known one
    ///
    /// A known receiver keeps the kind it was first registered with. An
    /// area of `None` leaves an existing assignment alone.
    pub fn register(
        &mut self,
        id: ReceiverId,
        kind: ReceiverKind,
        area_id: Option<AreaId>,
    ) -> &mut Receiver {
        let receiver = self.receivers.entry(id.clone()).or_insert(Receiver {
            id,
            kind,
            area_id: None,
            last_seen: None,
        });
        if area_id.is_some() {
            receiver.area_id = area_id;
        }
        receiver
    }

    /// Replace a receiver's area assignment, returning false if unknown
    pub fn set_area(&mut self, id: &ReceiverId, area_id: Option<AreaId>) -> bool {
        match self.receivers.get_mut(id) {
            Some(receiver) => {
                receiver.area_id = area_id;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ReceiverId) -> Option<&Receiver> {
        self.receivers.get(id)
    }

    pub fn area_of(&self, id: &ReceiverId) -> Option<&AreaId> {
        self.receivers.get(id).and_then(|r| r.area_id.as_ref())
    }

    pub fn kind_of(&self, id: &ReceiverId) -> Option<ReceiverKind> {
        self.receivers.get(id).map(|r| r.kind)
    }

    pub(crate) fn note_seen(&mut self, id: &ReceiverId, timestamp: Timestamp) {
        if let Some(receiver) = self.receivers.get_mut(id) {
            if receiver.last_seen.map_or(true, |seen| timestamp > seen) {
                receiver.last_seen = Some(timestamp);
            }
        }
    }

    /// Receivers that accepted a sample within `max_age_ms` of `now`
    pub fn count_active(&self, now: Timestamp, max_age_ms: u64) -> usize {
        self.receivers
            .values()
            .filter(|r| {
                r.last_seen
                    .map(|seen| now.saturating_sub(seen) < max_age_ms)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn remove(&mut self, id: &ReceiverId) -> Option<Receiver> {
        self.receivers.remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Receiver> {
        self.receivers.values()
    }

    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_fixed_at_registration() {
        let mut registry = ReceiverRegistry::new();
        registry.register("hci0".into(), ReceiverKind::Polled, None);
        registry.register("hci0".into(), ReceiverKind::Timestamped, Some("hall".into()));

        assert_eq!(registry.kind_of(&"hci0".into()), Some(ReceiverKind::Polled));
        assert_eq!(registry.area_of(&"hci0".into()).map(AreaId::as_str), Some("hall"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_area_keeps_assignment() {
        let mut registry = ReceiverRegistry::new();
        registry.register("proxy".into(), ReceiverKind::Timestamped, Some("lounge".into()));
        registry.register("proxy".into(), ReceiverKind::Timestamped, None);
        assert_eq!(registry.area_of(&"proxy".into()).map(AreaId::as_str), Some("lounge"));

        assert!(registry.set_area(&"proxy".into(), None));
        assert_eq!(registry.area_of(&"proxy".into()), None);
        assert!(!registry.set_area(&"ghost".into(), Some("attic".into())));
    }

    #[test]
    fn active_count_uses_last_seen() {
        let mut registry = ReceiverRegistry::new();
        registry.register("a".into(), ReceiverKind::Timestamped, None);
        registry.register("b".into(), ReceiverKind::Timestamped, None);
        registry.register("c".into(), ReceiverKind::Polled, None);

        registry.note_seen(&"a".into(), 10_000);
        registry.note_seen(&"b".into(), 1_000);
        registry.note_seen(&"b".into(), 500);

        assert_eq!(registry.get(&"b".into()).and_then(|r| r.last_seen), Some(1_000));
        assert_eq!(registry.count_active(12_000, 5_000), 1);
        assert_eq!(registry.count_active(12_000, 60_000), 2);

        assert!(registry.remove(&"a".into()).is_some());
        assert_eq!(registry.count_active(12_000, 5_000), 0);
    }
}
