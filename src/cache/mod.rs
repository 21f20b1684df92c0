//! Cache Module
//!
//! Provides the double-hashed store, its entries and the expiring cache facade.

mod entry;
mod facade;
mod hasher;
mod stats;
mod store;


// Re-export public types
pub use entry::{expiration_after, Entry};
pub use facade::ExpiringCache;
pub use hasher::{byte_sum_hash, fnv1a_hash, HashFn};
pub use stats::CacheStats;
pub use store::{HashStore, SharedStore};
