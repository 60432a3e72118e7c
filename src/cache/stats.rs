//! Cache Statistics Module
//!
//! Tracks memoization outcomes: hits, misses, stale entries and failed writes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Memo Stats ==
/// Snapshot of memoization counters for one [`MemoCache`](crate::MemoCache).
///
/// Counters are per cache value and reset with it; they are not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    /// Calls answered from a fresh stored entry
    pub hits: u64,
    /// Calls that found no usable entry (stale ones included)
    pub misses: u64,
    /// Misses caused by an entry older than the validity window
    pub stale: u64,
    /// Fresh results that could not be written back
    pub write_failures: u64,
}

impl MemoStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no calls have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Lock-free counters shared by concurrent `obtain` calls.
#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    stale: AtomicU64,
    write_failures: AtomicU64,
}

impl StatsRecorder {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A stale entry is also a miss.
    pub fn record_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
        self.record_miss();
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
