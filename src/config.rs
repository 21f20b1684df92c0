//! Configuration Module
//!
//! Handles loading cache, monitor and demo workload settings from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{CacheError, Result};

// == Defaults ==
const DEFAULT_INITIAL_CAPACITY: usize = 1024;
const DEFAULT_LOAD_FACTOR_PERCENT: usize = 50;
const DEFAULT_SAMPLE_SIZE: usize = 20;
const DEFAULT_EXPIRED_THRESHOLD_PERCENT: usize = 25;
const DEFAULT_CHECK_INTERVAL_MS: u64 = 100;
const DEFAULT_WORKLOAD_KEY_SPACE: usize = 10_000;
const DEFAULT_WORKLOAD_MAX_TTL_MS: u64 = 2_000;
const DEFAULT_RUN_SECS: u64 = 10;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Number of slots the store starts with
    pub initial_capacity: usize,
    /// Occupied-slot percentage at which the store doubles
    pub load_factor_percent: usize,
    /// Entries inspected per monitor pass
    pub sample_size: usize,
    /// Expired percentage of a sample above which the monitor repeats immediately
    pub expired_threshold_percent: usize,
    /// Monitor sleep between cycles in milliseconds
    pub check_interval_ms: u64,
    /// Distinct keys the demo workload writes
    pub workload_key_space: usize,
    /// Upper bound of the random TTL the demo workload assigns, in milliseconds
    pub workload_max_ttl_ms: u64,
    /// Demo run time in seconds, 0 runs until a shutdown signal
    pub run_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_INITIAL_CAPACITY` - Initial slot count (default: 1024)
    /// - `CACHE_LOAD_FACTOR` - Growth threshold in percent (default: 50)
    /// - `MONITOR_SAMPLE_SIZE` - Entries sampled per pass (default: 20)
    /// - `MONITOR_EXPIRED_THRESHOLD` - Repeat threshold in percent (default: 25)
    /// - `MONITOR_INTERVAL_MS` - Sleep between sweep cycles (default: 100)
    /// - `WORKLOAD_KEY_SPACE` - Demo key space (default: 10000)
    /// - `WORKLOAD_MAX_TTL_MS` - Demo max TTL (default: 2000)
    /// - `RUN_SECS` - Demo duration, 0 = until signal (default: 10)
    pub fn from_env() -> Self {
        Self {
            initial_capacity: env_or("CACHE_INITIAL_CAPACITY", DEFAULT_INITIAL_CAPACITY),
            load_factor_percent: env_or("CACHE_LOAD_FACTOR", DEFAULT_LOAD_FACTOR_PERCENT),
            sample_size: env_or("MONITOR_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE),
            expired_threshold_percent: env_or(
                "MONITOR_EXPIRED_THRESHOLD",
                DEFAULT_EXPIRED_THRESHOLD_PERCENT,
            ),
            check_interval_ms: env_or("MONITOR_INTERVAL_MS", DEFAULT_CHECK_INTERVAL_MS),
            workload_key_space: env_or("WORKLOAD_KEY_SPACE", DEFAULT_WORKLOAD_KEY_SPACE),
            workload_max_ttl_ms: env_or("WORKLOAD_MAX_TTL_MS", DEFAULT_WORKLOAD_MAX_TTL_MS),
            run_secs: env_or("RUN_SECS", DEFAULT_RUN_SECS),
        }
    }

    /// Checks that every parameter is within its allowed range.
    pub fn validate(&self) -> Result<()> {
        validate_store_params(self.initial_capacity, self.load_factor_percent)?;
        self.monitor().validate()?;
        if self.workload_key_space == 0 {
            return Err(CacheError::InvalidConfig(
                "workload key space must be positive".to_string(),
            ));
        }
        if self.workload_max_ttl_ms == 0 {
            return Err(CacheError::InvalidConfig(
                "workload max TTL must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the monitor settings.
    pub fn monitor(&self) -> MonitorConfig {
        MonitorConfig {
            sample_size: self.sample_size,
            expired_threshold_percent: self.expired_threshold_percent,
            check_interval: Duration::from_millis(self.check_interval_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor_percent: DEFAULT_LOAD_FACTOR_PERCENT,
            sample_size: DEFAULT_SAMPLE_SIZE,
            expired_threshold_percent: DEFAULT_EXPIRED_THRESHOLD_PERCENT,
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            workload_key_space: DEFAULT_WORKLOAD_KEY_SPACE,
            workload_max_ttl_ms: DEFAULT_WORKLOAD_MAX_TTL_MS,
            run_secs: DEFAULT_RUN_SECS,
        }
    }
}

// == Monitor Config ==
/// Tuning for the TTL monitor's adaptive sweep.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorConfig {
    /// Entries inspected per pass
    pub sample_size: usize,
    /// A pass whose expired share exceeds this percentage is repeated without sleeping
    pub expired_threshold_percent: usize,
    /// Sleep between cycles
    pub check_interval: Duration,
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            return Err(CacheError::InvalidConfig(
                "monitor sample size must be positive".to_string(),
            ));
        }
        if self.expired_threshold_percent > 100 {
            return Err(CacheError::InvalidConfig(format!(
                "monitor expired threshold must be at most 100, got {}",
                self.expired_threshold_percent
            )));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            expired_threshold_percent: DEFAULT_EXPIRED_THRESHOLD_PERCENT,
            check_interval: Duration::from_millis(DEFAULT_CHECK_INTERVAL_MS),
        }
    }
}

/// Validates the store constructor arguments.
pub(crate) fn validate_store_params(capacity: usize, load_factor_percent: usize) -> Result<()> {
    if capacity == 0 {
        return Err(CacheError::InvalidConfig(
            "initial capacity must be positive".to_string(),
        ));
    }
    if !(1..=100).contains(&load_factor_percent) {
        return Err(CacheError::InvalidConfig(format!(
            "load factor must be within 1..=100, got {}",
            load_factor_percent
        )));
    }
    Ok(())
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
