//! SyncEngine implementation
//!
//! The SyncEngine reconciles one base name at a time: the most recently
//! modified variant in the watched folder becomes the canonical file in the
//! sync folder, and everything it displaces is archived first.
//!
//! Moves are copy-then-delete because the folders may sit on different
//! filesystems. A crash between the copy and the delete leaves both files in
//! place; the next reconciliation archives the canonical copy and promotes
//! the source again, so nothing is lost.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use drawsync_fs::{NameResolver, io, list_variants, pick_most_recent};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::Result;
use crate::backup::BackupArchive;
use crate::config::SyncConfig;
use crate::stats::SyncStats;

/// Anything that can reconcile a base name.
///
/// Implemented by [`SyncEngine`]; the debounce layer only depends on this.
#[async_trait]
pub trait Reconcile: Send + Sync {
    /// Reconcile every variant of `base`.
    async fn reconcile(&self, base: &str) -> Result<ReconcileReport>;
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Base name that was reconciled
    pub base: String,
    /// Canonical path written, if a variant was promoted
    pub promoted: Option<PathBuf>,
    /// Backup entries created, in completion order
    pub backups: Vec<PathBuf>,
    /// Variants left alone because they were inaccessible or vanished
    pub skipped: usize,
}

impl ReconcileReport {
    /// Create an empty report for `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Default::default()
        }
    }

    /// Whether the reconciliation changed nothing.
    pub fn is_noop(&self) -> bool {
        self.promoted.is_none() && self.backups.is_empty()
    }
}

/// Engine that moves the newest variant of a document into the sync folder.
pub struct SyncEngine {
    config: Arc<SyncConfig>,
    resolver: NameResolver,
    archive: BackupArchive,
    stats: Arc<SyncStats>,
}

impl SyncEngine {
    /// Create a new SyncEngine
    ///
    /// # Errors
    ///
    /// Returns an error if the configured extension is invalid.
    pub fn new(config: Arc<SyncConfig>, stats: Arc<SyncStats>) -> Result<Self> {
        let resolver = config.name_resolver()?;
        let archive = BackupArchive::new(&config.backups_folder, resolver.extension());
        Ok(Self {
            config,
            resolver,
            archive,
            stats,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn stats(&self) -> &Arc<SyncStats> {
        &self.stats
    }

    /// Path of the canonical file for `base`.
    pub fn canonical_path(&self, base: &str) -> PathBuf {
        self.config
            .sync_folder
            .join(self.resolver.canonical_file_name(base))
    }

    async fn run(&self, base: &str) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::new(base);

        let paths = list_variants(&self.config.watched_folder, &self.resolver, base).await?;
        if paths.is_empty() {
            debug!(base, "No variants to reconcile");
            return Ok(report);
        }

        let mut accessible = Vec::with_capacity(paths.len());
        for path in paths {
            match io::probe_read_write(&path).await {
                Ok(()) => accessible.push(path),
                Err(e) => {
                    warn!(base, path = %path.display(), "Skipping inaccessible variant: {}", e);
                    report.skipped += 1;
                }
            }
        }
        if accessible.is_empty() {
            return Ok(report);
        }

        let Some(winner) = pick_most_recent(&accessible, &self.resolver).await else {
            warn!(base, "All variants vanished before selection");
            report.skipped += accessible.len();
            return Ok(report);
        };
        if !io::exists(&winner.path).await? {
            warn!(base, path = %winner.path.display(), "Winning variant vanished before promotion");
            report.skipped += accessible.len();
            return Ok(report);
        }

        let canonical = self.canonical_path(base);
        if io::exists(&canonical).await? {
            match self.archive.archive(&canonical, base).await {
                Ok(entry) => {
                    self.stats.record_backup_created();
                    report.backups.push(entry);
                }
                Err(e) if e.is_not_found() && !io::exists(&canonical).await? => {
                    warn!(base, path = %canonical.display(), "Canonical file vanished before archival");
                }
                Err(e) => return Err(e),
            }
        }

        match io::copy_file(&winner.path, &canonical).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() && !io::exists(&winner.path).await? => {
                warn!(base, path = %winner.path.display(), "Winning variant vanished during promotion");
                report.skipped += 1;
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        }
        remove_source(&winner.path).await?;
        self.stats.record_file_processed();
        info!(
            base,
            winner = %winner.path.display(),
            canonical = %canonical.display(),
            "Promoted newest variant"
        );
        report.promoted = Some(canonical);

        let mut retirements = JoinSet::new();
        for loser in accessible.into_iter().filter(|p| *p != winner.path) {
            let archive = self.archive.clone();
            let base = base.to_string();
            retirements.spawn(async move { retire(&archive, &loser, &base).await });
        }

        let mut first_error = None;
        while let Some(joined) = retirements.join_next().await {
            match joined.map_err(crate::Error::from).and_then(|outcome| outcome) {
                Ok(Some(entry)) => {
                    self.stats.record_backup_created();
                    report.backups.push(entry);
                }
                Ok(None) => report.skipped += 1,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => error!(base, "Additional failure retiring variant: {}", e),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }
}

#[async_trait]
impl Reconcile for SyncEngine {
    async fn reconcile(&self, base: &str) -> Result<ReconcileReport> {
        match self.run(base).await {
            Ok(report) => {
                if !report.is_noop() {
                    debug!(
                        base,
                        backups = report.backups.len(),
                        skipped = report.skipped,
                        "Reconciliation complete"
                    );
                }
                Ok(report)
            }
            Err(e) => {
                self.stats.record_error();
                error!(base, "Reconciliation failed: {}", e);
                Err(e)
            }
        }
    }
}

/// Archive a losing variant, then delete it.
///
/// Returns `None` if the variant vanished before it could be archived.
async fn retire(archive: &BackupArchive, path: &Path, base: &str) -> Result<Option<PathBuf>> {
    let entry = match archive.archive(path, base).await {
        Ok(entry) => entry,
        Err(e) if e.is_not_found() && !io::exists(path).await? => {
            warn!(base, path = %path.display(), "Variant vanished before archival");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    remove_source(path).await?;
    Ok(Some(entry))
}

async fn remove_source(path: &Path) -> Result<()> {
    match io::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(path = %path.display(), "Source already removed");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
