//! Integration Tests for the Expiring Cache
//!
//! Exercises the public API end to end: facade reads and writes, store growth,
//! and the TTL monitor running against a shared store.

use std::thread::sleep;
use std::time::Duration;

use expiring_cache::cache::fnv1a_hash;
use expiring_cache::{CacheError, Config, ExpiringCache, HashStore, MonitorConfig};
use tokio_util::sync::CancellationToken;

const HOUR: Duration = Duration::from_secs(3600);

// == Helper Functions ==

fn approximately_equals(actual: Duration, expected: Duration, margin: Duration) -> bool {
    let drift = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    drift <= margin
}

fn fast_monitor() -> MonitorConfig {
    MonitorConfig {
        check_interval: Duration::from_millis(20),
        ..MonitorConfig::default()
    }
}

// == Facade Tests ==

#[test]
fn test_set_then_get_hello_world() {
    let cache = ExpiringCache::new(1000, 50).unwrap();
    cache.set(b"hello", b"world".to_vec(), HOUR).unwrap();

    let (value, ttl) = cache.get(b"hello").unwrap();
    assert_eq!(value, b"world");
    assert!(approximately_equals(ttl, HOUR, Duration::from_millis(20)));
}

#[test]
fn test_get_never_inserted_key() {
    let cache: ExpiringCache<Vec<u8>> = ExpiringCache::from_config(&Config::default()).unwrap();
    assert!(cache.get("missing").is_none());
}

#[test]
fn test_set_empty_key_fails() {
    let cache = ExpiringCache::new(16, 50).unwrap();
    assert_eq!(cache.set(b"", 1, HOUR), Err(CacheError::InvalidKey));
}

#[test]
fn test_invalid_store_params() {
    assert!(matches!(
        ExpiringCache::<u8>::new(0, 50),
        Err(CacheError::InvalidConfig(_))
    ));
    assert!(matches!(
        ExpiringCache::<u8>::new(16, 101),
        Err(CacheError::InvalidConfig(_))
    ));
}

#[test]
fn test_short_ttl_expires_lazily() {
    let cache = ExpiringCache::new(16, 50).unwrap();
    cache.set("a", 1, Duration::from_millis(10)).unwrap();

    sleep(Duration::from_millis(20));

    assert!(cache.get("a").is_none());
    assert_eq!(cache.stats().expired_reads, 1);
}

#[test]
fn test_reset_updates_value_and_ttl() {
    let cache = ExpiringCache::new(16, 50).unwrap();
    cache.set("key", "old", Duration::from_secs(1)).unwrap();
    let length = cache.len();

    cache.set("key", "new", HOUR).unwrap();

    let (value, ttl) = cache.get("key").unwrap();
    assert_eq!(value, "new");
    assert!(ttl > Duration::from_secs(60));
    assert_eq!(cache.len(), length);
}

#[test]
fn test_growth_keeps_every_key() {
    let cache = ExpiringCache::new(4, 50).unwrap();
    for i in 0..500u32 {
        cache.set(format!("key-{i}"), i, HOUR).unwrap();
    }

    let stats = cache.stats();
    assert!(stats.capacity > 4);
    assert_eq!(stats.entries, 500);
    for i in 0..500u32 {
        assert_eq!(cache.get(format!("key-{i}")).map(|(v, _)| v), Some(i));
    }
}

#[test]
fn test_remove_sole_occupant_decrements_length() {
    let store = HashStore::with_hasher(64, 50, fnv1a_hash).unwrap().into_shared();
    let cache = ExpiringCache::with_store(store);
    cache.set("one", 1, HOUR).unwrap();
    cache.set("two", 2, HOUR).unwrap();
    assert_eq!(cache.len(), 2);

    assert!(cache.remove("one"));
    assert_eq!(cache.len(), 1);
    assert!(cache.get("one").is_none());
    assert!(!cache.remove("one"));
    assert_eq!(cache.get("two").map(|(v, _)| v), Some(2));
}

#[test]
fn test_stats_track_reads() {
    let cache = ExpiringCache::new(16, 50).unwrap();
    cache.set("live", 1, HOUR).unwrap();
    cache.set("stale", 2, Duration::ZERO).unwrap();

    cache.get("live");
    cache.get("live");
    cache.get("stale");
    cache.get("missing");

    let stats = cache.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.expired_reads, 1);
    assert_eq!(stats.entries, 2);
    assert_eq!(stats.hit_rate(), 0.5);
}

// == Monitor Tests ==

#[tokio::test]
async fn test_monitor_sweeps_expired_entries() {
    let cache = ExpiringCache::new(64, 50).unwrap();
    for i in 0..10 {
        cache.set(format!("live-{i}"), i, HOUR).unwrap();
    }
    for i in 0..50 {
        cache.set(format!("stale-{i}"), i, Duration::from_millis(10)).unwrap();
    }

    let mut monitor = cache.monitor(fast_monitor());
    let handle = monitor.start_monitoring(&CancellationToken::new()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stats = cache.stats();
    assert_eq!(stats.entries, 10);
    for i in 0..10 {
        assert!(cache.get(format!("live-{i}")).is_some());
    }

    monitor.stop_monitoring().unwrap();
    let report = handle.join().await.unwrap();
    assert_eq!(report.expired, 50);
}

#[tokio::test]
async fn test_monitor_lifecycle_errors() {
    let cache: ExpiringCache<u8> = ExpiringCache::new(16, 50).unwrap();
    let mut monitor = cache.monitor(fast_monitor());

    assert_eq!(monitor.stop_monitoring(), Err(CacheError::NotMonitoring));

    let handle = monitor.start_monitoring(&CancellationToken::new()).unwrap();
    assert!(matches!(
        monitor.start_monitoring(&CancellationToken::new()),
        Err(CacheError::AlreadyMonitoring)
    ));

    monitor.stop_monitoring().unwrap();
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_stopped_monitor_leaves_stale_entries() {
    let cache = ExpiringCache::new(16, 50).unwrap();
    let config = fast_monitor();
    let mut monitor = cache.monitor(config.clone());
    let handle = monitor.start_monitoring(&CancellationToken::new()).unwrap();

    monitor.stop_monitoring().unwrap();
    tokio::time::sleep(config.check_interval).await;

    cache.set("stale", 1, Duration::ZERO).unwrap();
    tokio::time::sleep(config.check_interval * 3).await;

    // Still stored, only hidden by the read path
    assert_eq!(cache.stats().entries, 1);
    assert!(cache.get("stale").is_none());
    assert!(handle.is_finished());
}
