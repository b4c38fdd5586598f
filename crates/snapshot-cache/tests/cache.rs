use common::{Clock, HouseId};
use leaderboard::LeaderboardEntry;
use snapshot_cache::{DEFAULT_TTL, LeaderboardSnapshot, SnapshotCache};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const TTL_MS: i64 = DEFAULT_TTL.as_millis() as i64;
const T0: i64 = 1_700_000_000_000;

#[derive(Clone, Copy)]
struct ManualClock(i64);

impl Clock for ManualClock {
    fn now_unix_ms(&self) -> i64 {
        self.0
    }
}

fn temp_cache_path(suffix: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("houseboard-snapshot-{suffix}-{now}.json"))
}

fn entry(house: &str, score: f64) -> LeaderboardEntry {
    LeaderboardEntry {
        house: HouseId::new(house),
        display_name: house.to_owned(),
        member_count: 1,
        score,
        total_staked: 100,
        last_updated_unix_ms: T0,
    }
}

fn snapshot_at(computed_at_unix_ms: i64) -> LeaderboardSnapshot {
    LeaderboardSnapshot {
        rankings: vec![entry("honoo", 70.0), entry("mizu", 20.0)],
        computed_at_unix_ms,
    }
}

#[test]
fn snapshot_round_trips_through_the_store() {
    let path = temp_cache_path("round-trip");
    let cache = SnapshotCache::new(&path);
    let snapshot = snapshot_at(T0);
    cache.write(&snapshot);

    // A second instance at the same path sees the durable record.
    let reread = SnapshotCache::new(&path).read().expect("stored snapshot");
    assert_eq!(reread, snapshot);

    let _ = std::fs::remove_file(path);
}

#[test]
fn freshness_is_strict_at_the_ttl_boundary() {
    let path = temp_cache_path("freshness");
    let cache = SnapshotCache::new(&path);
    cache.write(&snapshot_at(T0));

    assert!(cache.is_fresh_at(T0 + TTL_MS - 1));
    assert!(!cache.is_fresh_at(T0 + TTL_MS));
    assert!(!cache.is_fresh_at(T0 + TTL_MS + 1));

    let _ = std::fs::remove_file(path);
}

#[test]
fn missing_and_corrupted_records_read_as_misses() {
    let missing = SnapshotCache::new(temp_cache_path("missing"));
    assert!(missing.read().is_none());
    assert!(!missing.is_fresh_at(T0));

    let path = temp_cache_path("corrupted");
    std::fs::write(&path, b"{not json").expect("seed corrupt record");
    let corrupted = SnapshotCache::new(&path);
    assert!(corrupted.read().is_none());
    assert!(!corrupted.is_fresh_at(T0));

    let _ = std::fs::remove_file(path);
}

#[test]
fn failed_writes_are_swallowed() {
    // The target path is a directory, so the write cannot land.
    let cache = SnapshotCache::new(std::env::temp_dir());
    cache.write(&snapshot_at(T0));
    assert!(!cache.is_fresh_at(T0));
}

#[tokio::test]
async fn fresh_snapshot_skips_recomputation() {
    let path = temp_cache_path("read-through-hit");
    let cache = SnapshotCache::new(&path).with_clock(ManualClock(T0 + 1));
    cache.write(&snapshot_at(T0));

    let computes = AtomicU32::new(0);
    let served = cache
        .read_through(|| async {
            computes.fetch_add(1, Ordering::SeqCst);
            Ok(vec![entry("kaze", 1.0)])
        })
        .await
        .expect("read through");

    assert_eq!(computes.load(Ordering::SeqCst), 0);
    assert_eq!(served, snapshot_at(T0));

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn expired_snapshot_recomputes_and_stores() {
    let path = temp_cache_path("read-through-expiry");
    let now = T0 + TTL_MS + 1;
    let cache = SnapshotCache::new(&path).with_clock(ManualClock(now));
    cache.write(&snapshot_at(T0));

    let computes = AtomicU32::new(0);
    let served = cache
        .read_through(|| async {
            computes.fetch_add(1, Ordering::SeqCst);
            Ok(vec![entry("kaze", 42.0)])
        })
        .await
        .expect("read through");

    assert_eq!(computes.load(Ordering::SeqCst), 1);
    assert_eq!(served.computed_at_unix_ms, now);
    assert_eq!(served.rankings[0].house, HouseId::new("kaze"));

    // The replacement snapshot is durable.
    let reread = SnapshotCache::new(&path).read().expect("stored snapshot");
    assert_eq!(reread, served);

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn compute_failure_propagates_without_poisoning_the_store() {
    let path = temp_cache_path("read-through-error");
    let cache = SnapshotCache::new(&path).with_clock(ManualClock(T0));

    let result = cache
        .read_through(|| async { anyhow::bail!("pipeline unavailable") })
        .await;
    assert!(result.is_err());
    assert!(cache.read().is_none());

    let _ = std::fs::remove_file(path);
}

#[test]
fn ttl_override_is_respected() {
    let path = temp_cache_path("ttl-override");
    let cache = SnapshotCache::with_ttl(&path, Duration::from_secs(60));
    cache.write(&snapshot_at(T0));
    assert!(cache.is_fresh_at(T0 + 59_999));
    assert!(!cache.is_fresh_at(T0 + 60_000));

    let _ = std::fs::remove_file(path);
}
