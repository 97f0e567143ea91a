//! Rate limiting for repetitive log messages
//!
//! Some warnings fire on every cycle for as long as a condition lasts (a
//! receiver with no area, a proxy that keeps sending undated sightings).
//! [`SpamGuard`] lets the first message for a key through, swallows repeats
//! for an interval, and then lets the next one through along with a count
//! of how many were swallowed.

use alloc::{collections::BTreeMap, string::String};

use crate::time::Timestamp;

#[derive(Debug, Clone, Copy)]
struct KeyState {
    last_emitted: Timestamp,
    suppressed: u32,
}

/// Keyed suppression cache for log messages
#[derive(Debug, Clone)]
pub struct SpamGuard {
    interval_ms: u64,
    keys: BTreeMap<String, KeyState>,
}

impl SpamGuard {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            keys: BTreeMap::new(),
        }
    }

    pub fn set_interval(&mut self, interval_ms: u64) {
        self.interval_ms = interval_ms;
    }

    /// Decide whether a message for `key` should be emitted now
    ///
    /// Returns `Some(n)` to emit, where `n` is how many messages were
    /// suppressed since the last emission, or `None` to suppress.
    pub fn check(&mut self, key: &str, now: Timestamp) -> Option<u32> {
        match self.keys.get_mut(key) {
            Some(state) => {
                if now.saturating_sub(state.last_emitted) > self.interval_ms {
                    let suppressed = state.suppressed;
                    state.suppressed = 0;
                    state.last_emitted = now;
                    Some(suppressed)
                } else {
                    state.suppressed = state.suppressed.saturating_add(1);
                    None
                }
            }
            None => {
                self.keys.insert(
                    String::from(key),
                    KeyState {
                        last_emitted: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }

    /// Forget every key that starts with `prefix`
    pub fn forget_prefix(&mut self, prefix: &str) {
        self.keys.retain(|key, _| !key.starts_with(prefix));
    }

    pub fn tracked_keys(&self) -> usize {
        self.keys.len()
    }
}

/// Emit a warning through a [`SpamGuard`]
macro_rules! warn_limited {
    ($guard:expr, $now:expr, $key:expr, $($arg:tt)*) => {
        match $guard.check($key, $now) {
            Some(0) => log_warn!($($arg)*),
            Some(suppressed) => log_warn!(
                "{} ({} previous messages suppressed)",
                format_args!($($arg)*),
                suppressed
            ),
            None => {}
        }
    };
}
