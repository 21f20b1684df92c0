//! Cache Statistics Module
//!
//! Tracks read outcomes for the expiring cache facade.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Snapshot of cache read metrics and store occupancy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a live value
    pub hits: u64,
    /// Reads for keys the store did not hold
    pub misses: u64,
    /// Reads that found a stale entry not yet swept by the monitor
    pub expired_reads: u64,
    /// Occupied slot indices
    pub filled_slots: usize,
    /// Total stored entries, including stale ones
    pub entries: usize,
    /// Current slot count
    pub capacity: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Stale reads count as misses. Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expired_reads;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Read Counters ==
/// Lock-free read counters shared by clones of a cache.
#[derive(Debug, Default)]
pub(crate) struct ReadCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_reads: AtomicU64,
}

impl ReadCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_read(&self) {
        self.expired_reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Builds a snapshot with the given occupancy figures.
    pub(crate) fn snapshot(&self, filled_slots: usize, entries: usize, capacity: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_reads: self.expired_reads.load(Ordering::Relaxed),
            filled_slots,
            entries,
            capacity,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = ReadCounters::default();
        counters.record_hit();
        counters.record_miss();
        counters.record_expired_read();
        counters.record_hit();

        let stats = counters.snapshot(3, 4, 16);
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired_reads, 1);
        assert_eq!(stats.hit_rate(), 0.5);
        assert_eq!(stats.filled_slots, 3);
        assert_eq!(stats.entries, 4);
        assert_eq!(stats.capacity, 16);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats {
            hits: 1,
            ..CacheStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["expired_reads"], 0);
    }
}
