//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - TTL Monitor: samples the store and removes expired entries at a fixed interval

mod monitor;

pub use monitor::{
    expire_sample, run_expiration_cycle, CycleOutcome, MonitorHandle, PassOutcome, SweepReport,
    TtlMonitor,
};
