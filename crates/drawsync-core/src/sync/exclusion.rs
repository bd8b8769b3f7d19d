//! Per-base-name mutual exclusion
//!
//! Two reconciliations of the same base name must never interleave: both
//! would archive and delete the same variants. Each base name gets an async
//! mutex on first use; the entry is dropped again once nobody holds or
//! awaits it, so the map only grows with concurrently active names.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-base-name locks.
#[derive(Debug, Default)]
pub struct BaseLocks {
    slots: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Exclusive hold on one base name, released on drop.
#[derive(Debug)]
pub struct BaseGuard {
    locks: Arc<BaseLocks>,
    base: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BaseLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Arc<AsyncMutex<()>>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until `base` is free, then hold it until the guard is dropped.
    pub async fn lock(self: &Arc<Self>, base: &str) -> BaseGuard {
        let slot = Arc::clone(self.slots().entry(base.to_string()).or_default());
        let guard = slot.lock_owned().await;
        BaseGuard {
            locks: Arc::clone(self),
            base: base.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of base names currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots().len()
    }
}

impl BaseGuard {
    /// Base name this guard holds.
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Drop for BaseGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.locks.slots();
        // Only the map itself still references the mutex: no holder, no waiter.
        if slots
            .get(&self.base)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.base);
        }
    }
}
