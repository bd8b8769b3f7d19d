//! Command implementations
//!
//! Both commands run under the single-instance lock and share the same
//! pipeline: configuration, stats, engine, debounce layer and watcher.

mod scan;
mod watch;

use std::sync::Arc;

use drawsync_core::{ConfigResolver, DebounceAggregator, FolderWatcher, SyncConfig, SyncEngine, SyncStats};
use drawsync_fs::PidLock;

use crate::cli::{Cli, Commands};
use crate::error::Result;

pub use scan::run_scan;
pub use watch::run_watch;

/// Everything a command needs once configuration is resolved.
pub struct Pipeline {
    pub config: Arc<SyncConfig>,
    pub stats: Arc<SyncStats>,
    pub watcher: FolderWatcher,
}

impl Pipeline {
    /// Resolve and validate configuration, then wire up the engine.
    pub fn build(cli: &Cli) -> Result<Self> {
        let config = ConfigResolver::new(&cli.config_path)
            .resolve(&cli.overrides())?
            .validate()?;
        let config = Arc::new(config);
        let stats = Arc::new(SyncStats::new());
        let engine = Arc::new(SyncEngine::new(Arc::clone(&config), Arc::clone(&stats))?);
        let aggregator = DebounceAggregator::new(engine, config.debounce);
        let watcher = FolderWatcher::new(&config, aggregator)?;
        Ok(Self {
            config,
            stats,
            watcher,
        })
    }
}

/// Run the selected command while holding the lock.
///
/// The lock is released on every exit path, including errors.
pub async fn execute(cli: &Cli) -> Result<()> {
    let lock = PidLock::acquire(cli.lock_path())?;
    tracing::debug!(path = %lock.path().display(), "Acquired instance lock");

    let outcome = match cli.command() {
        Commands::Watch => run_watch(cli).await,
        Commands::Scan => run_scan(cli).await,
    };

    lock.release();
    outcome
}
