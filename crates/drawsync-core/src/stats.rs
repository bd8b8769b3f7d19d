//! Process-lifetime counters for reconciliation outcomes

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

/// Counters shared by every concurrent reconciliation.
#[derive(Debug, Default)]
pub struct SyncStats {
    files_processed: AtomicU64,
    backups_created: AtomicU64,
    errors: AtomicU64,
}

/// Snapshot of the counters at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub files_processed: u64,
    pub backups_created: u64,
    pub errors: u64,
}

impl SyncStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_file_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backup_created(&self) {
        self.backups_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            files_processed: self.files_processed.load(Ordering::Relaxed),
            backups_created: self.backups_created.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Log the current counters.
    pub fn flush(&self) -> StatsSnapshot {
        let snapshot = self.snapshot();
        info!(
            files_processed = snapshot.files_processed,
            backups_created = snapshot.backups_created,
            errors = snapshot.errors,
            "Stats: {} files processed, {} backups created, {} errors",
            snapshot.files_processed,
            snapshot.backups_created,
            snapshot.errors
        );
        snapshot
    }

    /// Flush every `period` until the returned handle is aborted.
    ///
    /// The first flush happens one full period after spawning.
    pub fn spawn_periodic_flush(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let stats = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                ticker.tick().await;
                stats.flush();
            }
        })
    }
}
