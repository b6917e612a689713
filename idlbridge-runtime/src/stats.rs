//! Boundary statistics for monitoring
//!
//! Plain relaxed counters; a snapshot is not a consistent cut across fields.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Counters {
    pub calls_made: AtomicU64,
    pub failed_calls: AtomicU64,
    pub handles_issued: AtomicU64,
    pub handles_released: AtomicU64,
    pub objects_created: AtomicU64,
    pub objects_destroyed: AtomicU64,
    pub double_releases: AtomicU64,
    pub panics_caught: AtomicU64,
}

impl Counters {
    const fn new() -> Self {
        Self {
            calls_made: AtomicU64::new(0),
            failed_calls: AtomicU64::new(0),
            handles_issued: AtomicU64::new(0),
            handles_released: AtomicU64::new(0),
            objects_created: AtomicU64::new(0),
            objects_destroyed: AtomicU64::new(0),
            double_releases: AtomicU64::new(0),
            panics_caught: AtomicU64::new(0),
        }
    }
}

pub(crate) static COUNTERS: Counters = Counters::new();

#[inline]
pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InteropStats {
    pub calls_made: u64,
    pub failed_calls: u64,
    pub handles_issued: u64,
    pub handles_released: u64,
    pub objects_created: u64,
    pub objects_destroyed: u64,
    pub double_releases: u64,
    pub panics_caught: u64,
}

/// Get boundary statistics
pub fn stats() -> InteropStats {
    let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
    InteropStats {
        calls_made: load(&COUNTERS.calls_made),
        failed_calls: load(&COUNTERS.failed_calls),
        handles_issued: load(&COUNTERS.handles_issued),
        handles_released: load(&COUNTERS.handles_released),
        objects_created: load(&COUNTERS.objects_created),
        objects_destroyed: load(&COUNTERS.objects_destroyed),
        double_releases: load(&COUNTERS.double_releases),
        panics_caught: load(&COUNTERS.panics_caught),
    }
}
