//! Cache counters

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub(crate) struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub coalesced: AtomicU64,
    pub failures: AtomicU64,
    pub evictions: AtomicU64,
    pub rejected_oversize: AtomicU64,
}

impl CacheStats {
    pub fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, bytes: u64) -> CacheStatSnapshot {
        CacheStatSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rejected_oversize: self.rejected_oversize.load(Ordering::Relaxed),
            entries,
            bytes,
        }
    }
}

/// Point-in-time view of cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatSnapshot {
    /// Served from a retained result
    pub hits: u64,
    /// Started a new execution
    pub misses: u64,
    /// Joined an execution already in flight
    pub coalesced: u64,
    /// Executions that failed and were not retained
    pub failures: u64,
    /// Entries dropped by the count or byte bound
    pub evictions: u64,
    /// Successful results too large to retain
    pub rejected_oversize: u64,
    /// Retained entries
    pub entries: usize,
    /// Retained bytes
    pub bytes: u64,
}

impl CacheStatSnapshot {
    /// Fraction of requests that avoided a new execution
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.coalesced;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.coalesced) as f64 / total as f64
        }
    }
}
