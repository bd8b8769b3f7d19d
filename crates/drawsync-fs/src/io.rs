//! File operations with path-carrying errors
//!
//! Folders may live on different filesystems, so moves are always
//! copy-then-delete; nothing here relies on `rename`.

use std::fs;
use std::path::Path;

use tokio::fs::OpenOptions;

use crate::{Error, Result};

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Check that `path` can currently be opened for reading and writing.
///
/// Opens without truncating; nothing is written. Fails if the file vanished,
/// lacks permissions, or is held exclusively by another process.
pub async fn probe_read_write(path: &Path) -> Result<()> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .await
        .map(|_| ())
        .map_err(|e| Error::io(path, e))
}

/// Copy `from` over `to`, returning the number of bytes copied.
///
/// Errors are reported against the source path.
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    tokio::fs::copy(from, to)
        .await
        .map_err(|e| Error::io(from, e))
}

/// Remove a file.
pub async fn remove_file(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| Error::io(path, e))
}

/// Whether `path` currently exists.
pub async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| Error::io(path, e))
}
