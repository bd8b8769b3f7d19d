//! Error types for drawsync-fs

use std::path::PathBuf;

/// Result type for drawsync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in drawsync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid extension {extension:?}: {message}")]
    InvalidExtension { extension: String, message: String },

    #[error("Another instance is already running (PID: {pid}, lock file {path})")]
    LockHeld { path: PathBuf, pid: u32 },

    #[error("Could not acquire lock at {path} after {attempts} attempts")]
    LockContention { path: PathBuf, attempts: u32 },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error reports a file that no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
