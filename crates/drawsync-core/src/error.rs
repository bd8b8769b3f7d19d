//! Error types for drawsync-core

use std::path::PathBuf;

use drawsync_fs::FolderRole;

/// Result type for drawsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drawsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured folder could not be created or resolved
    #[error("Failed to prepare {role} folder {path}: {source}")]
    FolderUnavailable {
        role: FolderRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured folder rejected the write probe
    #[error("No write permission for {role} folder {path}: {source}")]
    FolderNotWritable {
        role: FolderRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Home directory needed for default folders could not be determined
    #[error("Could not determine home directory for default folders")]
    NoHomeDirectory,

    /// No unused backup path could be reserved
    #[error("Could not reserve a unique backup path in {dir} after {attempts} attempts")]
    BackupPathExhausted { dir: PathBuf, attempts: u32 },

    /// The watched folder itself was removed
    #[error("Watched folder {path} was removed")]
    WatchTargetRemoved { path: PathBuf },

    /// The change notification stream ended
    #[error("Change notification stream for {path} closed")]
    WatchStreamClosed { path: PathBuf },

    /// One or more reconciliations of a pass failed
    #[error("{failed} of {total} reconciliations failed")]
    ScanFailed { failed: usize, total: usize },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from drawsync-fs
    #[error(transparent)]
    Fs(#[from] drawsync_fs::Error),

    /// Change notification error
    #[error(transparent)]
    Notify(#[from] notify::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A spawned task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether this error reports a file that no longer exists.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_not_found(),
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
