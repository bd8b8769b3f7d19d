//! Backup entry reservation and copy

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use drawsync_fs::io;
use drawsync_fs::variant::{millis_since_epoch, modified_time};
use tokio::fs::OpenOptions;

use crate::{Error, Result};

/// Upper bound on disambiguated names tried before giving up.
pub const MAX_RESERVE_ATTEMPTS: u32 = 8;

const DISAMBIGUATOR_SPACE: u128 = 1_000_000_000_000;

/// Archive rooted at the configured backups folder.
#[derive(Debug, Clone)]
pub struct BackupArchive {
    root: PathBuf,
    extension: String,
}

impl BackupArchive {
    /// Create an archive under `root` for files carrying `extension`.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// Folder holding the entries of one base name.
    pub fn entry_dir(&self, base: &str) -> PathBuf {
        self.root.join(base)
    }

    fn entry_name(&self, base: &str, millis: u128, disambiguator: Option<u128>) -> String {
        match disambiguator {
            Some(n) => format!("{}-{}-{:012}.{}", base, millis, n, self.extension),
            None => format!("{}-{}.{}", base, millis, self.extension),
        }
    }

    /// Copy `source` into the archive as an entry of `base`.
    ///
    /// The entry name is keyed by the source's own modification time. Returns
    /// the path of the new entry. Existing entries are never touched.
    pub async fn archive(&self, source: &Path, base: &str) -> Result<PathBuf> {
        let millis = millis_since_epoch(modified_time(source).await?);
        let dir = self.entry_dir(base);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| drawsync_fs::Error::io(&dir, e))?;

        let entry = self.reserve(&dir, base, millis).await?;
        if let Err(e) = io::copy_file(source, &entry).await {
            if let Err(cleanup) = tokio::fs::remove_file(&entry).await {
                tracing::warn!(
                    path = %entry.display(),
                    "Failed to remove unused backup placeholder: {}",
                    cleanup
                );
            }
            return Err(e.into());
        }

        tracing::debug!(
            source = %source.display(),
            backup = %entry.display(),
            "Archived file"
        );
        Ok(entry)
    }

    /// Exclusively create an empty file at an unused entry path.
    async fn reserve(&self, dir: &Path, base: &str, millis: u128) -> Result<PathBuf> {
        let mut disambiguator = None;
        for _ in 0..MAX_RESERVE_ATTEMPTS {
            let candidate = dir.join(self.entry_name(base, millis, disambiguator));
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(_) => return Ok(candidate),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(path = %candidate.display(), "Backup name taken, disambiguating");
                    disambiguator = Some(uuid::Uuid::new_v4().as_u128() % DISAMBIGUATOR_SPACE);
                }
                Err(e) => return Err(drawsync_fs::Error::io(&candidate, e).into()),
            }
        }
        Err(Error::BackupPathExhausted {
            dir: dir.to_path_buf(),
            attempts: MAX_RESERVE_ATTEMPTS,
        })
    }
}
