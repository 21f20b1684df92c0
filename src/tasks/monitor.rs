//! TTL Monitor
//!
//! Background task that samples the store, removes expired entries, and
//! repeats immediately while the sampled expired share stays high.

use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::cache::{HashStore, SharedStore};
use crate::config::MonitorConfig;
use crate::error::{CacheError, Result};

// == Reports ==
/// Outcome of one sample-and-remove pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Entries inspected
    pub sampled: usize,
    /// Sampled entries found expired, counting a key drawn twice twice
    pub stale: usize,
    /// Entries removed because they had expired
    pub expired: usize,
}

/// Outcome of one adaptive expiration cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleOutcome {
    /// Passes run before the expired share fell to the threshold
    pub passes: usize,
    pub sampled: usize,
    pub expired: usize,
}

/// Totals over the lifetime of a sweep task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub cycles: u64,
    pub passes: u64,
    pub sampled: u64,
    pub expired: u64,
}

impl SweepReport {
    fn record(&mut self, cycle: &CycleOutcome) {
        self.cycles += 1;
        self.passes += cycle.passes as u64;
        self.sampled += cycle.sampled as u64;
        self.expired += cycle.expired as u64;
    }
}

// == Monitor Handle ==
/// Handle to a running sweep task, owned by whoever started it.
#[derive(Debug)]
pub struct MonitorHandle {
    token: CancellationToken,
    join: JoinHandle<SweepReport>,
}

impl MonitorHandle {
    /// Requests the sweep task to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the sweep task to stop and returns its totals.
    pub async fn join(self) -> Result<SweepReport> {
        self.join
            .await
            .map_err(|e| CacheError::TaskFailed(e.to_string()))
    }
}

// == TTL Monitor ==
/// Actively expires entries of one shared store.
///
/// Idle until `start_monitoring`, running until `stop_monitoring` or until the
/// token passed at start is cancelled. At most one sweep task runs per monitor.
pub struct TtlMonitor<V> {
    store: SharedStore<V>,
    config: MonitorConfig,
    active: Option<CancellationToken>,
}

impl<V> TtlMonitor<V> {
    // == Constructor ==
    pub fn new(store: SharedStore<V>, config: MonitorConfig) -> Self {
        Self {
            store,
            config,
            active: None,
        }
    }

    /// Returns true while a sweep task started by this monitor has not been cancelled.
    pub fn is_monitoring(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    // == Stop ==
    /// Cancels the running sweep task.
    ///
    /// The task observes the cancellation before its next pass or during its
    /// sleep; use the handle's `join` to wait for it.
    pub fn stop_monitoring(&mut self) -> Result<()> {
        match self.active.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                Ok(())
            }
            _ => Err(CacheError::NotMonitoring),
        }
    }
}

impl<V: Send + 'static> TtlMonitor<V> {
    // == Start ==
    /// Spawns the sweep task on the current tokio runtime.
    ///
    /// The task stops when `stop_monitoring` is called, when the returned
    /// handle is cancelled, or when `parent` is cancelled.
    ///
    /// # Errors
    /// * `AlreadyMonitoring` - a sweep task is already running
    /// * `InvalidConfig` - the monitor config is out of range
    /// * `NoRuntime` - called outside a tokio runtime
    pub fn start_monitoring(&mut self, parent: &CancellationToken) -> Result<MonitorHandle> {
        if self.is_monitoring() {
            return Err(CacheError::AlreadyMonitoring);
        }
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CacheError::NoRuntime(e.to_string()))?;

        let token = parent.child_token();
        let join = runtime.spawn(sweep_loop(
            self.store.clone(),
            self.config.clone(),
            token.clone(),
        ));
        self.active = Some(token.clone());

        Ok(MonitorHandle { token, join })
    }
}

/// Runs expiration cycles separated by the check interval until cancelled.
async fn sweep_loop<V>(
    store: SharedStore<V>,
    config: MonitorConfig,
    token: CancellationToken,
) -> SweepReport {
    info!(
        "Starting TTL monitor: sample_size={}, threshold={}%, interval={:?}",
        config.sample_size, config.expired_threshold_percent, config.check_interval
    );

    let mut report = SweepReport::default();
    while !token.is_cancelled() {
        let cycle = run_expiration_cycle(&store, &config, &token);
        report.record(&cycle);
        if cycle.expired > 0 {
            debug!(
                "TTL sweep: removed {} expired entries in {} passes",
                cycle.expired, cycle.passes
            );
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(config.check_interval) => {}
        }
    }

    info!(
        "TTL monitor stopped after {} cycles, {} entries expired",
        report.cycles, report.expired
    );
    report
}

// == Expiration Cycle ==
/// Runs sample-and-remove passes until one finds an expired share at or
/// below the threshold, or `token` is cancelled.
///
/// The expired share is measured against the configured sample size, so a
/// store smaller than one sample ends the cycle once its stale entries are gone.
pub fn run_expiration_cycle<V>(
    store: &Mutex<HashStore<V>>,
    config: &MonitorConfig,
    token: &CancellationToken,
) -> CycleOutcome {
    let mut cycle = CycleOutcome::default();
    while !token.is_cancelled() {
        let pass = expire_sample(&mut store.lock(), config.sample_size, Instant::now());
        cycle.passes += 1;
        cycle.sampled += pass.sampled;
        cycle.expired += pass.expired;
        trace!(sampled = pass.sampled, expired = pass.expired, "TTL pass");

        if pass.stale * 100 <= config.expired_threshold_percent * config.sample_size {
            break;
        }
    }
    cycle
}

/// Samples up to `sample_size` entries and removes the ones expired at `now`.
///
/// The whole store is inspected when it holds no more than `sample_size`
/// entries. A stale key drawn twice counts twice toward `stale`, which drives
/// the repeat decision, but is removed and counted in `expired` once.
pub fn expire_sample<V>(store: &mut HashStore<V>, sample_size: usize, now: Instant) -> PassOutcome {
    let sample = if store.entry_count() <= sample_size {
        store.iter().collect::<Vec<_>>()
    } else {
        store.sample_random(sample_size)
    };
    let sampled = sample.len();
    let stale_keys: Vec<Vec<u8>> = sample
        .into_iter()
        .filter(|entry| entry.is_expired_at(now))
        .map(|entry| entry.key().to_vec())
        .collect();

    let mut expired = 0;
    for key in &stale_keys {
        if store.remove(key) {
            expired += 1;
        }
    }
    PassOutcome {
        sampled,
        stale: stale_keys.len(),
        expired,
    }
}
