//! Cache Entry Module
//!
//! Defines a stored key/value pair together with its expiration instant.

use std::time::{Duration, Instant};

use chrono::TimeDelta;

/// Longest TTL honoured before `now + ttl` is clamped (roughly 100 years).
const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Entry ==
/// A single stored key with its value and expiration.
///
/// The key never changes once the entry exists; value and expiration are
/// overwritten in place when the same key is set again.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    key: Vec<u8>,
    /// The stored value
    pub value: V,
    /// Instant at which the entry becomes stale
    pub expiration: Instant,
}

impl<V> Entry<V> {
    // == Constructor ==
    pub fn new(key: Vec<u8>, value: V, expiration: Instant) -> Self {
        Self {
            key,
            value,
            expiration,
        }
    }

    /// Returns the entry's key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    // == Is Expired ==
    /// Checks whether the entry is stale at `now`.
    ///
    /// Boundary condition: an entry whose expiration equals `now` is already
    /// expired, so a zero TTL never yields a readable entry.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expiration <= now
    }

    // == Remaining TTL ==
    /// Returns `expiration - now`, negative once the entry has gone stale.
    pub fn remaining_ttl_at(&self, now: Instant) -> TimeDelta {
        signed_delta(self.expiration, now)
    }
}

// == Utility Functions ==
/// Computes the expiration instant for a TTL starting at `now`.
///
/// TTLs too large to represent are clamped to a far-future instant.
pub fn expiration_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(MAX_TTL))
        .unwrap_or(now)
}

/// Signed difference `to - from` as a chrono delta.
fn signed_delta(to: Instant, from: Instant) -> TimeDelta {
    if to >= from {
        TimeDelta::from_std(to - from).unwrap_or(TimeDelta::MAX)
    } else {
        -TimeDelta::from_std(from - to).unwrap_or(TimeDelta::MAX)
    }
}
