//! Error types for drawsync-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from drawsync-core
    #[error(transparent)]
    Core(#[from] drawsync_core::Error),

    /// Error from drawsync-fs
    #[error(transparent)]
    Fs(#[from] drawsync_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Logging could not be initialized
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}
