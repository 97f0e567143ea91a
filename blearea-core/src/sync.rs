//! Serialized access to a tracker from several threads (requires std)
//!
//! Cycles mutate every link, so two must never run at once on the same
//! tracker. Scheduled cycles use [`SharedTracker::run_cycle`] and wait
//! their turn; event-driven triggers use [`SharedTracker::try_run_cycle`]
//! and simply skip when a cycle is already running.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Mutex, MutexGuard, PoisonError, TryLockError,
};

use crate::{
    time::Timestamp,
    tracker::{CycleReport, Tracker},
    types::Observation,
};

/// A [`Tracker`] behind a mutex
#[derive(Debug)]
pub struct SharedTracker {
    inner: Mutex<Tracker>,
    skipped: AtomicU32,
}

impl SharedTracker {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            inner: Mutex::new(tracker),
            skipped: AtomicU32::new(0),
        }
    }

    /// Run a cycle, waiting for any cycle in progress to finish
    pub fn run_cycle(&self, now: Timestamp, observations: &[Observation]) -> CycleReport {
        self.lock().run_cycle(now, observations)
    }

    /// Run a cycle unless one is already in progress
    pub fn try_run_cycle(&self, now: Timestamp, observations: &[Observation]) -> Option<CycleReport> {
        let mut tracker = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                let skipped = self.skipped.fetch_add(1, Ordering::Relaxed) + 1;
                log_warn!(
                    "Previous update cycle still running, skipping this one ({} skipped so far)",
                    skipped
                );
                return None;
            }
        };

        Some(tracker.run_cycle(now, observations))
    }

    /// Exclusive access for configuration and queries
    ///
    /// A panic during an earlier cycle does not lock the tracker out; the
    /// state it left behind is used as is.
    pub fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cycles dropped by `try_run_cycle` so far
    pub fn skipped_cycles(&self) -> u32 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> Tracker {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Tracker> for SharedTracker {
    fn from(tracker: Tracker) -> Self {
        Self::new(tracker)
    }
}
