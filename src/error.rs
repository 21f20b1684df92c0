//! Error types for the expiring cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache, its store and its TTL monitor.
///
/// Lookup misses are not errors: `get` returns `None` and `remove` returns
/// `false` for absent keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key was empty
    #[error("Invalid key: keys must be non-empty")]
    InvalidKey,

    /// `start_monitoring` called while a sweep task is already running
    #[error("TTL monitor is already running")]
    AlreadyMonitoring,

    /// `stop_monitoring` called while no sweep task is running
    #[error("TTL monitor is not running")]
    NotMonitoring,

    /// Store or monitor parameters out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No tokio runtime to spawn the sweep task on
    #[error("No async runtime available: {0}")]
    NoRuntime(String),

    /// The sweep task panicked or was aborted
    #[error("Monitor task failed: {0}")]
    TaskFailed(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
