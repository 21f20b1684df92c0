//! Expiring Cache Facade
//!
//! `set`/`get` over one shared hash store, hiding entries that have gone
//! stale but have not been swept yet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::TimeDelta;

use crate::cache::stats::ReadCounters;
use crate::cache::{CacheStats, HashStore, SharedStore};
use crate::config::{Config, MonitorConfig};
use crate::error::Result;
use crate::tasks::TtlMonitor;

// == Expiring Cache ==
/// Key/value cache whose entries expire after a per-entry TTL.
///
/// Clones share the same store and counters.
pub struct ExpiringCache<V> {
    store: SharedStore<V>,
    counters: Arc<ReadCounters>,
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            counters: Arc::clone(&self.counters),
        }
    }
}

impl<V> ExpiringCache<V> {
    // == Constructors ==
    /// Creates a cache over a fresh store.
    ///
    /// # Arguments
    /// * `initial_capacity` - Initial slot count of the store
    /// * `load_factor_percent` - Occupied-slot percentage that triggers growth
    pub fn new(initial_capacity: usize, load_factor_percent: usize) -> Result<Self> {
        Ok(Self::with_store(
            HashStore::new(initial_capacity, load_factor_percent)?.into_shared(),
        ))
    }

    /// Creates a cache sized from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.initial_capacity, config.load_factor_percent)
    }

    /// Creates a cache over an existing shared store.
    pub fn with_store(store: SharedStore<V>) -> Self {
        Self {
            store,
            counters: Arc::new(ReadCounters::default()),
        }
    }

    /// Returns a handle to the underlying store.
    pub fn store(&self) -> SharedStore<V> {
        Arc::clone(&self.store)
    }

    /// Creates a TTL monitor that sweeps this cache's store.
    pub fn monitor(&self, config: MonitorConfig) -> TtlMonitor<V> {
        TtlMonitor::new(self.store(), config)
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Re-setting a key replaces its value and restarts its TTL.
    pub fn set(&self, key: impl AsRef<[u8]>, value: V, ttl: Duration) -> Result<()> {
        self.store.lock().set(key.as_ref(), value, ttl)
    }

    // == Get ==
    /// Returns the value for `key` and its remaining TTL.
    ///
    /// Entries whose TTL has run out are reported as absent even while the
    /// store still holds them.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<(V, Duration)>
    where
        V: Clone,
    {
        let store = self.store.lock();
        let Some(entry) = store.find(key.as_ref()) else {
            self.counters.record_miss();
            return None;
        };

        let remaining = entry.remaining_ttl_at(Instant::now());
        if remaining <= TimeDelta::zero() {
            self.counters.record_expired_read();
            return None;
        }

        self.counters.record_hit();
        let remaining = remaining.to_std().unwrap_or(Duration::ZERO);
        Some((entry.value.clone(), remaining))
    }

    // == Remove ==
    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: impl AsRef<[u8]>) -> bool {
        self.store.lock().remove(key.as_ref())
    }

    /// Returns the number of occupied slot indices in the store.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    // == Stats ==
    /// Returns read counters and current store occupancy.
    pub fn stats(&self) -> CacheStats {
        let store = self.store.lock();
        self.counters
            .snapshot(store.len(), store.entry_count(), store.capacity())
    }
}
