//! Expiring Cache - an in-process key/value cache with per-entry TTLs
//!
//! A double-hashed store holds the entries; a background monitor samples it
//! and removes expired ones, while reads treat stale entries as absent.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, Entry, ExpiringCache, HashStore, SharedStore};
pub use config::{Config, MonitorConfig};
pub use error::{CacheError, Result};
pub use tasks::{MonitorHandle, SweepReport, TtlMonitor};
