//! Identifiers and raw observations
//!
//! Devices, receivers and areas are identified by opaque strings handed
//! in by the host (usually MAC addresses for devices and receivers, and
//! the host's area slug for areas). Newtypes keep them from being mixed up.

use alloc::string::String;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(String::from(id))
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Stable identity of a tracked transmitter
    DeviceId
);

string_id!(
    /// Stable identity of a fixed receiver (scanner or proxy)
    ReceiverId
);

string_id!(
    /// Identity of a physical area a receiver is placed in
    AreaId
);

/// How a receiver dates the advertisements it hears
///
/// Resolved once when the receiver is registered and never re-probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReceiverKind {
    /// Networked proxy that reports a hardware timestamp per sample
    Timestamped,
    /// Local radio that is only polled; samples carry no timestamp
    Polled,
}

impl ReceiverKind {
    pub fn sends_timestamps(self) -> bool {
        matches!(self, Self::Timestamped)
    }
}

/// One receiver's view of one device, as supplied for an update cycle
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    pub device_id: DeviceId,
    pub receiver_id: ReceiverId,
    /// Signal strength in dBm
    pub rssi: f64,
    /// Transmit power advertised by the device, if any
    pub tx_power: Option<f64>,
    /// Capability of the receiver, used if it is not registered yet
    pub receiver_kind: ReceiverKind,
    /// Latest timestamp the receiver recorded for this device
    pub reported_timestamp: Option<Timestamp>,
    /// Area the receiver is placed in, if the host knows it
    pub receiver_area_id: Option<AreaId>,
}

impl Observation {
    /// Observation from a timestamped proxy
    pub fn timestamped(
        device_id: impl Into<DeviceId>,
        receiver_id: impl Into<ReceiverId>,
        rssi: f64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            receiver_id: receiver_id.into(),
            rssi,
            tx_power: None,
            receiver_kind: ReceiverKind::Timestamped,
            reported_timestamp: Some(timestamp),
            receiver_area_id: None,
        }
    }

    /// Observation from a polled local radio
    pub fn polled(
        device_id: impl Into<DeviceId>,
        receiver_id: impl Into<ReceiverId>,
        rssi: f64,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            receiver_id: receiver_id.into(),
            rssi,
            tx_power: None,
            receiver_kind: ReceiverKind::Polled,
            reported_timestamp: None,
            receiver_area_id: None,
        }
    }

    pub fn with_area(mut self, area_id: impl Into<AreaId>) -> Self {
        self.receiver_area_id = Some(area_id.into());
        self
    }

    pub fn with_tx_power(mut self, tx_power: f64) -> Self {
        self.tx_power = Some(tx_power);
        self
    }
}
