//! Sync counters.
//!
//! Tracks how many entities were synced, how many archives the passes
//! produced and what happened to their demos.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the score sync and the demo workers.
///
/// Uses atomics for lock-free access across tasks.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    /// Completed sync passes
    passes: AtomicU64,

    /// Entities whose board was fetched and committed
    entities_synced: AtomicU64,

    /// Entities skipped because fetching or committing failed
    entities_failed: AtomicU64,

    archives_created: AtomicU64,

    players_created: AtomicU64,

    /// Demos downloaded, validated and stored
    demos_stored: AtomicU64,

    /// Demos the remote service no longer has
    demos_expired: AtomicU64,

    /// Download attempts that ended in an error
    demos_failed: AtomicU64,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a committed board and what the commit created.
    pub fn record_entity(&self, new_archives: usize, new_players: usize) {
        self.entities_synced.fetch_add(1, Ordering::Relaxed);
        self.archives_created
            .fetch_add(new_archives as u64, Ordering::Relaxed);
        self.players_created
            .fetch_add(new_players as u64, Ordering::Relaxed);
    }

    pub fn record_entity_failure(&self) {
        self.entities_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_demo_stored(&self) {
        self.demos_stored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_demo_expired(&self) {
        self.demos_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_demo_failure(&self) {
        self.demos_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn entities_synced(&self) -> u64 {
        self.entities_synced.load(Ordering::Relaxed)
    }

    pub fn entities_failed(&self) -> u64 {
        self.entities_failed.load(Ordering::Relaxed)
    }

    pub fn archives_created(&self) -> u64 {
        self.archives_created.load(Ordering::Relaxed)
    }

    pub fn demos_stored(&self) -> u64 {
        self.demos_stored.load(Ordering::Relaxed)
    }

    /// Gets a snapshot of all counters.
    ///
    /// Individual fields are read atomically; the snapshot as a whole may
    /// straddle a concurrent update.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            passes: self.passes(),
            entities_synced: self.entities_synced(),
            entities_failed: self.entities_failed(),
            archives_created: self.archives_created(),
            players_created: self.players_created.load(Ordering::Relaxed),
            demos_stored: self.demos_stored(),
            demos_expired: self.demos_expired.load(Ordering::Relaxed),
            demos_failed: self.demos_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of the sync counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub passes: u64,
    pub entities_synced: u64,
    pub entities_failed: u64,
    pub archives_created: u64,
    pub players_created: u64,
    pub demos_stored: u64,
    pub demos_expired: u64,
    pub demos_failed: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passes, {} entities synced ({} failed), {} archives, {} players, demos {} stored / {} expired / {} failed",
            self.passes,
            self.entities_synced,
            self.entities_failed,
            self.archives_created,
            self.players_created,
            self.demos_stored,
            self.demos_expired,
            self.demos_failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_records() {
        let metrics = SyncMetrics::new();
        metrics.record_pass();
        metrics.record_entity(3, 2);
        metrics.record_entity(0, 0);
        metrics.record_entity_failure();
        metrics.record_demo_stored();
        metrics.record_demo_expired();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.passes, 1);
        assert_eq!(snapshot.entities_synced, 2);
        assert_eq!(snapshot.entities_failed, 1);
        assert_eq!(snapshot.archives_created, 3);
        assert_eq!(snapshot.players_created, 2);
        assert_eq!(snapshot.demos_stored, 1);
        assert_eq!(snapshot.demos_expired, 1);
        assert_eq!(snapshot.demos_failed, 0);
    }
}
