//! Durable, time-boxed cache in front of the leaderboard pipeline.
//!
//! A snapshot is one complete ranked board; it is replaced wholesale,
//! never mutated. An unreadable or malformed record is a cache miss,
//! and writes are best-effort: a lost write only means the next read
//! recomputes.

use anyhow::{Context as _, Result};
use common::{Clock, SystemClock};
use leaderboard::LeaderboardEntry;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

/// Recompute window for a served board.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub rankings: Vec<LeaderboardEntry>,
    pub computed_at_unix_ms: i64,
}

pub struct SnapshotCache<C = SystemClock> {
    path: PathBuf,
    ttl_ms: i64,
    clock: C,
    // In-process mirror of the durable record; replaced wholesale,
    // last writer wins.
    mirror: RwLock<Option<LeaderboardSnapshot>>,
}

impl SnapshotCache<SystemClock> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_ttl(path, DEFAULT_TTL)
    }

    pub fn with_ttl(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl_ms: ttl.as_millis() as i64,
            clock: SystemClock,
            mirror: RwLock::new(None),
        }
    }
}

impl<C: Clock> SnapshotCache<C> {
    pub fn with_clock<C2: Clock>(self, clock: C2) -> SnapshotCache<C2> {
        SnapshotCache {
            path: self.path,
            ttl_ms: self.ttl_ms,
            clock,
            mirror: self.mirror,
        }
    }

    /// Last stored snapshot, fresh or not. Missing, unreadable, and
    /// malformed records all read as `None`.
    pub fn read(&self) -> Option<LeaderboardSnapshot> {
        if let Some(snapshot) = self.mirror.read().clone() {
            return Some(snapshot);
        }
        let snapshot = self.read_disk()?;
        *self.mirror.write() = Some(snapshot.clone());
        Some(snapshot)
    }

    /// Best-effort store. Failures are logged and swallowed; the mirror
    /// only advances when the durable write lands, so cached state never
    /// claims more than the store holds.
    pub fn write(&self, snapshot: &LeaderboardSnapshot) {
        if let Err(err) = self.write_disk(snapshot) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "snapshot write failed; next read recomputes",
            );
            return;
        }
        *self.mirror.write() = Some(snapshot.clone());
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(self.clock.now_unix_ms())
    }

    /// A snapshot is fresh strictly within the TTL; at exactly the TTL
    /// boundary it is already stale.
    pub fn is_fresh_at(&self, now_unix_ms: i64) -> bool {
        match self.read() {
            Some(snapshot) => self.snapshot_is_fresh_at(&snapshot, now_unix_ms),
            None => false,
        }
    }

    /// Serves the cached rankings while fresh; otherwise runs `compute`,
    /// stores its result best-effort, and returns it. The computation is
    /// only awaited on miss or expiry.
    pub async fn read_through<F, Fut>(&self, compute: F) -> Result<LeaderboardSnapshot>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<LeaderboardEntry>>>,
    {
        let now = self.clock.now_unix_ms();
        if let Some(snapshot) = self.read()
            && self.snapshot_is_fresh_at(&snapshot, now)
        {
            return Ok(snapshot);
        }

        let rankings = compute().await?;
        let snapshot = LeaderboardSnapshot {
            rankings,
            computed_at_unix_ms: now,
        };
        self.write(&snapshot);
        Ok(snapshot)
    }

    fn snapshot_is_fresh_at(&self, snapshot: &LeaderboardSnapshot, now_unix_ms: i64) -> bool {
        now_unix_ms.saturating_sub(snapshot.computed_at_unix_ms) < self.ttl_ms
    }

    fn read_disk(&self) -> Option<LeaderboardSnapshot> {
        let raw = fs::read(&self.path).ok()?;
        serde_json::from_slice(&raw).ok()
    }

    fn write_disk(&self, snapshot: &LeaderboardSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache directory {}", parent.display()))?;
        }
        let encoded = serde_json::to_vec(snapshot).context("serialize snapshot")?;
        fs::write(&self.path, encoded)
            .with_context(|| format!("write snapshot to {}", self.path.display()))?;
        Ok(())
    }
}
