//! Variant enumeration and most-recent selection
//!
//! A variant is one on-disk file of a logical document. Variants are recomputed
//! from the filesystem on every pass; the listing may already be stale when it
//! is acted upon, so every stat tolerates files that vanished in between.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::name::{DocumentName, NameResolver};
use crate::{Error, Result};

/// One on-disk file instance of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub path: PathBuf,
    pub name: DocumentName,
    pub modified: SystemTime,
}

/// Non-recursive listing of the files in `folder` whose base name is `base`.
///
/// Order is whatever the directory listing yields.
pub async fn list_variants(
    folder: &Path,
    resolver: &NameResolver,
    base: &str,
) -> Result<Vec<PathBuf>> {
    let mut variants = Vec::new();
    for (path, name) in list_documents(folder, resolver).await? {
        if name.base == base {
            variants.push(path);
        }
    }
    Ok(variants)
}

/// Every file in `folder` carrying the recognized extension, with its parsed name.
///
/// Directories are skipped; entries that disappear while listing are ignored.
/// Files whose base name is `.` or `..` are skipped with a warning.
pub async fn list_documents(
    folder: &Path,
    resolver: &NameResolver,
) -> Result<Vec<(PathBuf, DocumentName)>> {
    let mut entries = tokio::fs::read_dir(folder)
        .await
        .map_err(|e| Error::io(folder, e))?;

    let mut documents = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io(folder, e))?
    {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !resolver.matches(file_name) {
            continue;
        }
        match entry.file_type().await {
            Ok(kind) if kind.is_dir() => continue,
            Ok(_) => {}
            Err(e) => {
                debug!(path = %entry.path().display(), error = %e, "Entry vanished while listing");
                continue;
            }
        }
        let name = resolver.parse(file_name);
        if !name.is_reconcilable() {
            warn!(path = %entry.path().display(), "Ignoring file with unusable base name");
            continue;
        }
        documents.push((entry.path(), name));
    }

    Ok(documents)
}

/// Pick the most recently modified of `paths`.
///
/// Paths that can no longer be statted are dropped. Equal modification times
/// resolve to the lexicographically smallest path. Empty input yields `None`.
pub async fn pick_most_recent(paths: &[PathBuf], resolver: &NameResolver) -> Option<Variant> {
    let mut best: Option<Variant> = None;

    for path in paths {
        let modified = match modified_time(path).await {
            Ok(modified) => modified,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Dropping variant that could not be statted");
                continue;
            }
        };

        let newer = match &best {
            None => true,
            Some(current) => {
                modified > current.modified
                    || (modified == current.modified && *path < current.path)
            }
        };

        if newer {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| resolver.parse(n))
                .unwrap_or_else(|| DocumentName::new(path.to_string_lossy(), None));
            best = Some(Variant {
                path: path.clone(),
                name,
                modified,
            });
        }
    }

    best
}

/// Last-modified time of `path`.
pub async fn modified_time(path: &Path) -> Result<SystemTime> {
    tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::io(path, e))
}

/// Modification time as whole milliseconds since the Unix epoch (floored).
///
/// Times before the epoch clamp to zero.
pub fn millis_since_epoch(time: SystemTime) -> u128 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}
