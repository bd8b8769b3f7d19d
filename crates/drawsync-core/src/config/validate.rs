//! Startup validation of the configured folders

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use drawsync_fs::FolderRole;

use super::settings::SyncConfig;
use crate::{Error, Result};

impl SyncConfig {
    /// Create every folder if missing, verify write access, and canonicalize.
    ///
    /// Failures name the folder's role.
    pub fn validate(mut self) -> Result<Self> {
        for role in FolderRole::ALL {
            let prepared = prepare_folder(role, self.folder(role))?;
            tracing::debug!(role = %role, path = %prepared.display(), "Folder ready");
            self.set_folder(role, prepared);
        }
        Ok(self)
    }
}

fn prepare_folder(role: FolderRole, path: &Path) -> Result<PathBuf> {
    let unavailable = |source| Error::FolderUnavailable {
        role,
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(path).map_err(unavailable)?;
    probe_writable(path).map_err(|source| Error::FolderNotWritable {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    dunce::canonicalize(path).map_err(unavailable)
}

/// Create and delete a uniquely named hidden file inside `dir`.
fn probe_writable(dir: &Path) -> std::io::Result<()> {
    let probe = dir.join(format!(".drawsync-probe-{}", uuid::Uuid::new_v4()));
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe)?;
    fs::remove_file(&probe)
}
