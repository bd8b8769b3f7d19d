//! The effective settings of one drawsync process

use std::path::{Path, PathBuf};
use std::time::Duration;

use drawsync_fs::{FolderRole, NameResolver};

/// Fully merged configuration.
///
/// Immutable after startup; shared by the engine and the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Folder where editors drop new saves
    pub watched_folder: PathBuf,
    /// Folder holding one canonical file per document
    pub sync_folder: PathBuf,
    /// Root of the backup archive
    pub backups_folder: PathBuf,
    /// Recognized file extension, without the leading dot
    pub extension: String,
    /// Quiet period before a base name is reconciled
    pub debounce: Duration,
    /// First delay before a failed watch is restarted
    pub watch_retry: Duration,
    /// Interval between periodic stats flushes
    pub stats_interval: Duration,
}

impl SyncConfig {
    /// Path configured for a folder role.
    pub fn folder(&self, role: FolderRole) -> &Path {
        match role {
            FolderRole::Watched => &self.watched_folder,
            FolderRole::Sync => &self.sync_folder,
            FolderRole::Backups => &self.backups_folder,
        }
    }

    fn folder_mut(&mut self, role: FolderRole) -> &mut PathBuf {
        match role {
            FolderRole::Watched => &mut self.watched_folder,
            FolderRole::Sync => &mut self.sync_folder,
            FolderRole::Backups => &mut self.backups_folder,
        }
    }

    /// Replace the path configured for a folder role.
    pub fn set_folder(&mut self, role: FolderRole, path: PathBuf) {
        *self.folder_mut(role) = path;
    }

    /// Name resolver for the configured extension.
    pub fn name_resolver(&self) -> drawsync_fs::Result<NameResolver> {
        NameResolver::new(&self.extension)
    }
}
