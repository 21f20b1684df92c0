//! Hash Store Module
//!
//! Slot-array hash table with double hashing, a cubic-perturbed probe
//! sequence and doubling growth. Entries carry an expiration instant but the
//! store never filters on it; expiring entries is the monitor's job.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::TimeDelta;
use parking_lot::Mutex;
use rand::Rng;
use tracing::debug;

use crate::cache::entry::expiration_after;
use crate::cache::hasher::{byte_sum_hash, HashFn};
use crate::cache::Entry;
use crate::config::validate_store_params;
use crate::error::{CacheError, Result};

/// A store shared between the cache facade and its TTL monitor.
///
/// Every read, write, removal and growth goes through the one lock.
pub type SharedStore<V> = Arc<Mutex<HashStore<V>>>;

// == Slot ==
/// Entries sharing one array index.
///
/// Holds at most one entry unless probing hit its bound and had to append to
/// an occupied index. `vacated` marks an index emptied by a removal: lookups
/// keep probing past it, inserts may reuse it.
#[derive(Debug)]
struct Slot<V> {
    entries: Vec<Entry<V>>,
    vacated: bool,
}

impl<V> Slot<V> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            vacated: false,
        }
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_headed_by(&self, key: &[u8]) -> bool {
        self.entries.first().is_some_and(|entry| entry.key() == key)
    }

    fn position(&self, key: &[u8]) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == key)
    }
}

/// Where a probe for a key ended.
struct Probe {
    /// Index the probe stopped at: an unused slot, a slot headed by the key,
    /// or the last index computed before the probe bound.
    index: usize,
    /// First vacated index passed on the way, if any.
    vacancy: Option<usize>,
}

// == Hash Store ==
/// Hash table mapping byte-string keys to values with an expiration.
///
/// Occupancy is counted per index, not per entry: an index holding several
/// colliding entries counts once toward the load factor.
pub struct HashStore<V> {
    slots: Vec<Slot<V>>,
    /// Non-empty indices
    filled: usize,
    /// Indices emptied by a removal since the last rebuild
    vacated: usize,
    /// Total entries across all slots
    entries: usize,
    load_factor_percent: usize,
    hasher: HashFn,
}

impl<V: fmt::Debug> fmt::Debug for HashStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashStore")
            .field("capacity", &self.slots.len())
            .field("filled", &self.filled)
            .field("vacated", &self.vacated)
            .field("entries", &self.entries)
            .field("load_factor_percent", &self.load_factor_percent)
            .finish_non_exhaustive()
    }
}

impl<V> HashStore<V> {
    // == Constructor ==
    /// Creates an empty store using the byte-sum hash.
    ///
    /// # Arguments
    /// * `capacity` - Initial number of slots, must be positive
    /// * `load_factor_percent` - Occupied-slot percentage (1..=100) that triggers doubling
    pub fn new(capacity: usize, load_factor_percent: usize) -> Result<Self> {
        Self::with_hasher(capacity, load_factor_percent, byte_sum_hash)
    }

    /// Creates an empty store using a caller-chosen hash function.
    pub fn with_hasher(capacity: usize, load_factor_percent: usize, hasher: HashFn) -> Result<Self> {
        validate_store_params(capacity, load_factor_percent)?;
        Ok(Self {
            slots: new_slots(capacity),
            filled: 0,
            vacated: 0,
            entries: 0,
            load_factor_percent,
            hasher,
        })
    }

    /// Wraps the store for sharing between a facade and a monitor.
    pub fn into_shared(self) -> SharedStore<V> {
        Arc::new(Mutex::new(self))
    }

    // == Set ==
    /// Inserts or updates `key`, expiring `ttl` from now.
    pub fn set(&mut self, key: &[u8], value: V, ttl: Duration) -> Result<()> {
        self.set_with_expiration(key, value, expiration_after(Instant::now(), ttl))
    }

    /// Inserts or updates `key` with an explicit expiration instant.
    ///
    /// Doubles the table first when the occupied indices reach the load
    /// factor, or rehashes in place when vacated markers push it there. An
    /// existing entry for the key keeps its position and has its value and
    /// expiration overwritten.
    pub fn set_with_expiration(&mut self, key: &[u8], value: V, expiration: Instant) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }

        let capacity = self.slots.len();
        if self.filled * 100 / capacity >= self.load_factor_percent {
            self.rebuild(capacity * 2);
        } else if (self.filled + self.vacated) * 100 / capacity >= self.load_factor_percent {
            // Too many vacated markers; clear them without growing
            self.rebuild(capacity);
        }

        let probe = self.probe(key);
        if let Some(pos) = self.slots[probe.index].position(key) {
            let entry = &mut self.slots[probe.index].entries[pos];
            entry.value = value;
            entry.expiration = expiration;
            return Ok(());
        }

        let target = probe.vacancy.unwrap_or(probe.index);
        self.place(target, Entry::new(key.to_vec(), value, expiration));
        Ok(())
    }

    // == Get ==
    /// Looks up `key`, returning its value and `expiration - now`.
    ///
    /// The remaining TTL is negative for entries that are stale but not yet
    /// removed.
    pub fn get(&self, key: &[u8]) -> Option<(&V, TimeDelta)> {
        self.find(key)
            .map(|entry| (&entry.value, entry.remaining_ttl_at(Instant::now())))
    }

    /// Looks up the full entry for `key`.
    pub fn find(&self, key: &[u8]) -> Option<&Entry<V>> {
        if key.is_empty() {
            return None;
        }
        let slot = &self.slots[self.probe(key).index];
        slot.position(key).map(|pos| &slot.entries[pos])
    }

    // == Remove ==
    /// Removes `key`, returning whether an entry was removed.
    ///
    /// Other entries sharing the slot keep their relative order.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        if key.is_empty() {
            return false;
        }
        let index = self.probe(key).index;
        let slot = &mut self.slots[index];
        let Some(pos) = slot.position(key) else {
            return false;
        };

        slot.entries.remove(pos);
        self.entries -= 1;
        if slot.is_empty() {
            slot.vacated = true;
            self.filled -= 1;
            self.vacated += 1;
        }
        true
    }

    // == Length ==
    /// Returns the number of occupied slot indices.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Returns the total number of stored entries.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Returns the current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load_factor_percent(&self) -> usize {
        self.load_factor_percent
    }

    // == Iteration ==
    /// Iterates over every stored entry in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> {
        self.slots.iter().flat_map(|slot| slot.entries.iter())
    }

    /// Returns a snapshot of every stored entry.
    pub fn to_vec(&self) -> Vec<Entry<V>>
    where
        V: Clone,
    {
        self.iter().cloned().collect()
    }

    // == Random Sample ==
    /// Draws `n` entries uniformly with replacement.
    ///
    /// Returns every entry when `n` is not smaller than the entry count, and
    /// an empty sample from an empty store.
    pub fn sample_random(&self, n: usize) -> Vec<&Entry<V>> {
        let all: Vec<&Entry<V>> = self.iter().collect();
        if n >= all.len() {
            return all;
        }

        let mut rng = rand::thread_rng();
        let mut sample = Vec::with_capacity(n);
        for _ in 0..n {
            sample.push(all[rng.gen_range(0..all.len())]);
        }
        sample
    }

    // == Internals ==
    /// Replaces the slot array with `capacity` fresh slots and re-places
    /// every entry, dropping all vacated markers.
    fn rebuild(&mut self, capacity: usize) {
        let old = std::mem::replace(&mut self.slots, new_slots(capacity));
        self.filled = 0;
        self.vacated = 0;
        self.entries = 0;

        for entry in old.into_iter().flat_map(|slot| slot.entries) {
            let probe = self.probe(entry.key());
            self.place(probe.vacancy.unwrap_or(probe.index), entry);
        }

        debug!(
            capacity,
            filled = self.filled,
            entries = self.entries,
            "Store rebuilt"
        );
    }

    fn place(&mut self, index: usize, entry: Entry<V>) {
        let slot = &mut self.slots[index];
        if slot.is_empty() {
            self.filled += 1;
            if slot.vacated {
                slot.vacated = false;
                self.vacated -= 1;
            }
        }
        slot.entries.push(entry);
        self.entries += 1;
    }

    /// Walks the probe sequence for `key`.
    ///
    /// Starting at `h1 = hash % capacity` with step `h2 = hash % capacity`,
    /// probe `i` moves to `(h1 + i*h2 + (i^3 - i)/6) % capacity`. The walk stops
    /// at an unused slot, at a slot headed by `key`, or after `capacity` slots
    /// have been inspected.
    fn probe(&self, key: &[u8]) -> Probe {
        let capacity = self.slots.len();
        let hash = (self.hasher)(key) as usize;
        let mut index = hash % capacity;
        let step = (hash % capacity) as u128;
        let mut vacancy = None;

        let mut count = 0usize;
        loop {
            let slot = &self.slots[index];
            if slot.is_empty() {
                if !slot.vacated {
                    return Probe { index, vacancy };
                }
                vacancy.get_or_insert(index);
            } else if slot.is_headed_by(key) {
                return Probe { index, vacancy };
            }

            count += 1;
            if count >= capacity {
                return Probe { index, vacancy };
            }
            index = next_probe(index, count, step, capacity);
        }
    }
}

fn new_slots<V>(capacity: usize) -> Vec<Slot<V>> {
    (0..capacity).map(|_| Slot::new()).collect()
}

fn next_probe(index: usize, count: usize, step: u128, capacity: usize) -> usize {
    let i = count as u128;
    let cubic = i.wrapping_mul(i).wrapping_mul(i).wrapping_sub(i) / 6;
    let offset = i.wrapping_mul(step).wrapping_add(cubic);
    ((index as u128).wrapping_add(offset) % capacity as u128) as usize
}
