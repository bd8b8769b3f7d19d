//! Constants and enums for the folders drawsync operates on.

use std::path::Path;
use std::time::Duration;

/// Extension recognized when none is configured.
pub const DEFAULT_EXTENSION: &str = "excalidraw";

/// File name of the single-instance lock, placed in the system temp directory.
pub const LOCK_FILE_NAME: &str = "drawsync.lock";

/// Quiet period after the last change event before a base name is reconciled.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// First delay before restarting a failed watch.
pub const DEFAULT_WATCH_RETRY: Duration = Duration::from_millis(5000);

/// Upper bound for the escalating watch restart delay.
pub const MAX_WATCH_RETRY: Duration = Duration::from_secs(300);

/// Interval between periodic statistics flushes.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(3600);

/// The three folders involved in a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderRole {
    /// Folder where editors drop versioned saves
    Watched,
    /// Folder holding one canonical file per document
    Sync,
    /// Root of the backup archive
    Backups,
}

impl FolderRole {
    /// All roles, in validation order.
    pub const ALL: [FolderRole; 3] = [Self::Watched, Self::Sync, Self::Backups];

    /// Get the string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Watched => "watched",
            Self::Sync => "sync",
            Self::Backups => "backups",
        }
    }
}

impl std::fmt::Display for FolderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default lock file location.
pub fn default_lock_path() -> std::path::PathBuf {
    std::env::temp_dir().join(Path::new(LOCK_FILE_NAME))
}
