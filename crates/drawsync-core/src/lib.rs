//! Core orchestration layer for drawsync
//!
//! This crate ties the filesystem layer together into a running sync service:
//!
//! - **Configuration**: layered merge of command line, config file and defaults
//! - **SyncEngine**: promotes the newest variant of a document to its canonical file
//! - **Backups**: never-overwriting archive of every displaced file
//! - **Watching**: debounced, restartable change notification over the downloads folder
//! - **Stats**: process-lifetime counters flushed to the log
//!
//! # Architecture
//!
//! `drawsync-core` sits above `drawsync-fs` and below the CLI:
//!
//! ```text
//!                  drawsync (CLI)
//!                        |
//!                  drawsync-core
//!      +---------+-------+--------+---------+
//!      |         |       |        |         |
//!    config    watch   sync    backup     stats
//!                        |
//!                   drawsync-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use drawsync_core::{CliOverrides, ConfigResolver, DebounceAggregator, FolderWatcher, SyncEngine, SyncStats};
//!
//! let config = Arc::new(ConfigResolver::new("/etc/drawsync/config.json")
//!     .resolve(&CliOverrides::default())?
//!     .validate()?);
//! let stats = Arc::new(SyncStats::new());
//! let engine = Arc::new(SyncEngine::new(config.clone(), stats)?);
//! let aggregator = DebounceAggregator::new(engine, config.debounce);
//! FolderWatcher::new(&config, aggregator)?.run().await?;
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod stats;
pub mod sync;
pub mod watch;

pub use backup::BackupArchive;
pub use config::{CliOverrides, ConfigResolver, DEFAULT_CONFIG_PATH, FileConfig, SyncConfig};
pub use error::{Error, Result};
pub use stats::{StatsSnapshot, SyncStats};
pub use sync::{BaseLocks, Reconcile, ReconcileReport, SyncEngine};
pub use watch::{DebounceAggregator, FolderWatcher, ScanSummary};
