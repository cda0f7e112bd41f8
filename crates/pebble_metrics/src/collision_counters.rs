//! Lock-free collision tallies shared by resolver workers

use crate::CollisionSnapshot;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct CollisionCounters {
    frames: AtomicU64,
    pairs_tested: AtomicU64,
    contacts: AtomicU64,
}

impl CollisionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one worker's tallies. Callable from any thread.
    pub fn add(&self, pairs_tested: u64, contacts: u64) {
        self.pairs_tested.fetch_add(pairs_tested, Ordering::Relaxed);
        self.contacts.fetch_add(contacts, Ordering::Relaxed);
    }

    pub fn end_frame(&self) {
        self.frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollisionSnapshot {
        CollisionSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            pairs_tested: self.pairs_tested.load(Ordering::Relaxed),
            contacts: self.contacts.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.frames.store(0, Ordering::Relaxed);
        self.pairs_tested.store(0, Ordering::Relaxed);
        self.contacts.store(0, Ordering::Relaxed);
    }
}
