//! Per-base-name debouncing of change events
//!
//! Editors write a file several times in quick succession. Each relevant
//! event restarts a timer for its base name; only when a base name stays
//! quiet for the whole window is it reconciled.
//!
//! A firing timer hands the reconciliation to its own task, so a later event
//! that aborts the timer can never cancel work already in flight. Overlapping
//! reconciliations of one base name are serialized through [`BaseLocks`].

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use drawsync_fs::{NameResolver, list_documents};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::sync::{BaseLocks, Reconcile, ReconcileReport};
use crate::{Error, Result};

struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Shared {
    reconciler: Arc<dyn Reconcile>,
    locks: Arc<BaseLocks>,
    delay: Duration,
    pending: Mutex<HashMap<String, PendingTimer>>,
    generation: AtomicU64,
}

impl Shared {
    fn pending(&self) -> MutexGuard<'_, HashMap<String, PendingTimer>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn reconcile_exclusive(&self, base: &str) -> Result<ReconcileReport> {
        let _guard = self.locks.lock(base).await;
        self.reconciler.reconcile(base).await
    }
}

/// Outcome of a full pass over the watched folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Distinct base names found
    pub bases: usize,
    /// Reconciliations that returned an error
    pub failed: usize,
}

impl ScanSummary {
    /// Turn a pass with failures into [`Error::ScanFailed`].
    pub fn into_result(self) -> Result<Self> {
        if self.failed == 0 {
            Ok(self)
        } else {
            Err(Error::ScanFailed {
                failed: self.failed,
                total: self.bases,
            })
        }
    }
}

/// Coalesces change events per base name and drives reconciliation.
#[derive(Clone)]
pub struct DebounceAggregator {
    shared: Arc<Shared>,
}

impl DebounceAggregator {
    /// Create an aggregator that waits `delay` after the last event.
    pub fn new(reconciler: Arc<dyn Reconcile>, delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                reconciler,
                locks: Arc::new(BaseLocks::new()),
                delay,
                pending: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Quiet period applied to each base name.
    pub fn delay(&self) -> Duration {
        self.shared.delay
    }

    /// Number of base names with a timer that has not fired yet.
    pub fn pending_count(&self) -> usize {
        self.shared.pending().len()
    }

    /// Restart the timer for `base`, superseding any timer already pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, base: &str) {
        let generation = self.shared.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let shared = Arc::clone(&self.shared);
        let key = base.to_string();

        // Held across spawn and insert so the timer cannot look itself up early.
        let mut pending = self.shared.pending();
        if let Some(previous) = pending.remove(base) {
            previous.handle.abort();
            debug!(base, "Superseded pending reconciliation");
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(shared.delay).await;
            {
                let mut pending = shared.pending();
                match pending.get(&key) {
                    Some(timer) if timer.generation == generation => {
                        pending.remove(&key);
                    }
                    _ => return,
                }
            }
            tokio::spawn(async move {
                if let Err(e) = shared.reconcile_exclusive(&key).await {
                    warn!(base = %key, "Debounced reconciliation failed, waiting for next change: {}", e);
                }
            });
        });

        pending.insert(base.to_string(), PendingTimer { generation, handle });
    }

    /// Reconcile `base` immediately, waiting for any reconciliation of the
    /// same base name already in flight.
    pub async fn reconcile_now(&self, base: &str) -> Result<ReconcileReport> {
        self.shared.reconcile_exclusive(base).await
    }

    /// Reconcile every base name present in `folder`, concurrently.
    ///
    /// Fails only if the folder cannot be listed; individual reconciliation
    /// failures are counted in the summary.
    pub async fn scan(&self, folder: &Path, resolver: &NameResolver) -> Result<ScanSummary> {
        let bases: BTreeSet<String> = list_documents(folder, resolver)
            .await?
            .into_iter()
            .map(|(_, name)| name.base)
            .collect();

        let mut summary = ScanSummary {
            bases: bases.len(),
            failed: 0,
        };

        let mut tasks = JoinSet::new();
        for base in bases {
            let shared = Arc::clone(&self.shared);
            tasks.spawn(async move { shared.reconcile_exclusive(&base).await.is_ok() });
        }
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => {}
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    error!("Scan task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            folder = %folder.display(),
            bases = summary.bases,
            failed = summary.failed,
            "Full scan complete"
        );
        Ok(summary)
    }

    /// Abort every timer that has not fired yet.
    pub fn cancel_all(&self) {
        for (_, timer) in self.shared.pending().drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Reconcile for Counting {
        async fn reconcile(&self, base: &str) -> Result<ReconcileReport> {
            self.calls.lock().unwrap().push(base.to_string());
            Ok(ReconcileReport::new(base))
        }
    }

    impl Counting {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_reconciles_once() {
        let reconciler = Arc::new(Counting::default());
        let aggregator = DebounceAggregator::new(reconciler.clone(), Duration::from_millis(1000));

        for _ in 0..5 {
            aggregator.schedule("plan");
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        assert!(reconciler.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(reconciler.calls(), vec!["plan".to_string()]);
        assert_eq!(aggregator.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_bases_have_independent_timers() {
        let reconciler = Arc::new(Counting::default());
        let aggregator = DebounceAggregator::new(reconciler.clone(), Duration::from_millis(1000));

        aggregator.schedule("a");
        tokio::time::sleep(Duration::from_millis(500)).await;
        aggregator.schedule("b");
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(reconciler.calls(), vec!["a".to_string()]);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(reconciler.calls(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_all_drops_pending_timers() {
        let reconciler = Arc::new(Counting::default());
        let aggregator = DebounceAggregator::new(reconciler.clone(), Duration::from_millis(1000));

        aggregator.schedule("a");
        aggregator.schedule("b");
        assert_eq!(aggregator.pending_count(), 2);
        aggregator.cancel_all();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(reconciler.calls().is_empty());
    }

    struct Slow {
        active: AtomicUsize,
        max_active: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl Reconcile for Slow {
        async fn reconcile(&self, base: &str) -> Result<ReconcileReport> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(3000)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(ReconcileReport::new(base))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn new_event_never_cancels_inflight_reconciliation() {
        let reconciler = Arc::new(Slow {
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        });
        let aggregator = DebounceAggregator::new(reconciler.clone(), Duration::from_millis(1000));

        aggregator.schedule("plan");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(reconciler.active.load(Ordering::SeqCst), 1);

        // Fires while the first reconciliation is still running.
        aggregator.schedule("plan");
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(reconciler.finished.load(Ordering::SeqCst), 2);
        assert_eq!(reconciler.max_active.load(Ordering::SeqCst), 1);
    }
}
