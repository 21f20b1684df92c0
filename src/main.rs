//! Expiring Cache demo driver
//!
//! Runs a synthetic set/get workload against a cache with an active TTL
//! monitor and logs statistics until the run time elapses or a shutdown
//! signal arrives.

use std::time::Duration;

use anyhow::Context;
use rand::Rng;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use expiring_cache::{Config, ExpiringCache};

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Create the cache and start its TTL monitor
/// 4. Drive the workload, logging stats once per second
/// 5. Stop on run-time expiry, SIGINT or SIGTERM and report sweep totals
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expiring_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Expiring Cache demo");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!("Configuration loaded: {}", serde_json::to_string(&config)?);

    let cache: ExpiringCache<Vec<u8>> = ExpiringCache::from_config(&config)?;
    let shutdown = CancellationToken::new();

    let mut monitor = cache.monitor(config.monitor());
    let monitor_handle = monitor.start_monitoring(&shutdown)?;
    info!("TTL monitor started");

    let workload = tokio::spawn(run_workload(cache.clone(), config.clone(), shutdown.clone()));

    wait_for_shutdown(config.run_secs).await;

    monitor.stop_monitoring()?;
    shutdown.cancel();

    let report = monitor_handle.join().await?;
    workload.await.context("workload task failed")?;

    info!("Sweep report: {}", serde_json::to_string(&report)?);
    info!("Final stats: {}", serde_json::to_string(&cache.stats())?);
    info!("Demo shutdown complete");
    Ok(())
}

/// Writes and reads random keys with random TTLs until cancelled.
async fn run_workload(cache: ExpiringCache<Vec<u8>>, config: Config, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(Duration::from_millis(1));
    let mut report = tokio::time::interval(Duration::from_secs(1));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => drive_batch(&cache, &config),
            _ = report.tick() => {
                match serde_json::to_string(&cache.stats()) {
                    Ok(stats) => info!("Stats: {}", stats),
                    Err(e) => warn!("Failed to serialize stats: {}", e),
                }
            }
        }
    }
}

/// Issues one batch of random sets and gets.
fn drive_batch(cache: &ExpiringCache<Vec<u8>>, config: &Config) {
    let mut rng = rand::thread_rng();
    for _ in 0..64 {
        let key = format!("key-{}", rng.gen_range(0..config.workload_key_space));
        if rng.gen_bool(0.5) {
            let ttl = Duration::from_millis(rng.gen_range(1..=config.workload_max_ttl_ms));
            if let Err(e) = cache.set(&key, key.clone().into_bytes(), ttl) {
                warn!("Set failed for {}: {}", key, e);
            }
        } else {
            let _ = cache.get(&key);
        }
    }
}

/// Waits for the configured run time, Ctrl+C or SIGTERM.
async fn wait_for_shutdown(run_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let deadline = async {
        if run_secs == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(run_secs)).await;
        }
    };

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
        _ = deadline => {
            info!("Run time of {}s elapsed, initiating shutdown...", run_secs);
        }
    }
}
