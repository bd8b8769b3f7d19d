//! Reconciliation of one document's variants into its canonical file
//!
//! This module provides:
//! - **engine**: the [`SyncEngine`] that promotes the newest variant and archives the rest
//! - **exclusion**: per-base-name mutual exclusion shared by every caller of the engine

mod engine;
mod exclusion;

pub use engine::{Reconcile, ReconcileReport, SyncEngine};
pub use exclusion::{BaseGuard, BaseLocks};
