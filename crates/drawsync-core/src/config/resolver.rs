//! Layered configuration merge
//!
//! The `ConfigResolver` combines command-line overrides, an optional config
//! file and built-in defaults into a [`SyncConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use drawsync_fs::constants::{DEFAULT_DEBOUNCE, DEFAULT_EXTENSION, DEFAULT_STATS_INTERVAL, DEFAULT_WATCH_RETRY};
use drawsync_fs::{ConfigStore, FolderRole, NameResolver};
use serde::Deserialize;

use super::settings::SyncConfig;
use crate::{Error, Result};

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/drawsync/config.json";

/// Contents of the optional config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub downloads_folder: Option<PathBuf>,
    pub sync_folder: Option<PathBuf>,
    pub backups_folder: Option<PathBuf>,
    pub extension: Option<String>,
    pub debounce_ms: Option<u64>,
    pub watch_retry_ms: Option<u64>,
    pub stats_interval_secs: Option<u64>,
}

impl FileConfig {
    fn folder(&self, role: FolderRole) -> Option<&PathBuf> {
        match role {
            FolderRole::Watched => self.downloads_folder.as_ref(),
            FolderRole::Sync => self.sync_folder.as_ref(),
            FolderRole::Backups => self.backups_folder.as_ref(),
        }
    }
}

/// Folder overrides taken from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub downloads_folder: Option<PathBuf>,
    pub sync_folder: Option<PathBuf>,
    pub backups_folder: Option<PathBuf>,
}

impl CliOverrides {
    fn folder(&self, role: FolderRole) -> Option<&PathBuf> {
        match role {
            FolderRole::Watched => self.downloads_folder.as_ref(),
            FolderRole::Sync => self.sync_folder.as_ref(),
            FolderRole::Backups => self.backups_folder.as_ref(),
        }
    }

    /// Whether every folder was given, which makes the config file irrelevant.
    pub fn is_complete(&self) -> bool {
        FolderRole::ALL.iter().all(|role| self.folder(*role).is_some())
    }
}

/// Resolves configuration by merging command line, config file and defaults.
pub struct ConfigResolver {
    config_path: PathBuf,

    /// Override for the home directory (used for testing).
    /// When `None`, `dirs::home_dir()` is used.
    home_dir_override: Option<PathBuf>,

    /// Override for the directory relative paths resolve against (used for testing).
    working_dir_override: Option<PathBuf>,
}

impl ConfigResolver {
    /// Create a resolver reading the config file at `config_path`.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            home_dir_override: None,
            working_dir_override: None,
        }
    }

    /// Use `home` instead of the user's home directory for defaults.
    pub fn with_home_dir(mut self, home: impl Into<PathBuf>) -> Self {
        self.home_dir_override = Some(home.into());
        self
    }

    /// Resolve relative paths against `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir_override = Some(dir.into());
        self
    }

    /// Path of the config file this resolver reads.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn home_dir(&self) -> Option<PathBuf> {
        if let Some(ref home) = self.home_dir_override {
            return Some(home.clone());
        }
        dirs::home_dir()
    }

    fn working_dir(&self) -> Result<PathBuf> {
        match self.working_dir_override {
            Some(ref dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    fn default_folder(&self, role: FolderRole) -> Result<PathBuf> {
        let home = self.home_dir().ok_or(Error::NoHomeDirectory)?;
        Ok(match role {
            FolderRole::Watched => home.join("Downloads"),
            FolderRole::Sync => home.join("ExcalidrawSync"),
            FolderRole::Backups => home.join("ExcalidrawSync").join("backups"),
        })
    }

    fn absolutize(&self, path: PathBuf) -> Result<PathBuf> {
        if path.is_absolute() {
            Ok(path)
        } else {
            Ok(self.working_dir()?.join(path))
        }
    }

    fn folder_for(&self, role: FolderRole, cli: &CliOverrides, file: &FileConfig) -> Result<PathBuf> {
        let path = match cli.folder(role).or_else(|| file.folder(role)) {
            Some(path) => path.clone(),
            None => self.default_folder(role)?,
        };
        self.absolutize(path)
    }

    /// Read the config file layer.
    ///
    /// A missing file is an empty layer. A file that cannot be read or parsed
    /// is logged and also treated as empty.
    pub fn load_file(&self) -> FileConfig {
        match ConfigStore::new().load_optional::<FileConfig>(&self.config_path) {
            Ok(Some(file)) => {
                tracing::debug!(path = %self.config_path.display(), "Loaded config file");
                file
            }
            Ok(None) => {
                tracing::debug!(path = %self.config_path.display(), "No config file found, skipping");
                FileConfig::default()
            }
            Err(e) => {
                tracing::error!(
                    path = %self.config_path.display(),
                    "Ignoring unreadable config file: {}",
                    e
                );
                FileConfig::default()
            }
        }
    }

    /// Merge all layers into a [`SyncConfig`].
    ///
    /// No filesystem changes happen here; see [`SyncConfig::validate`].
    pub fn resolve(&self, cli: &CliOverrides) -> Result<SyncConfig> {
        let file = if cli.is_complete() {
            tracing::debug!("All folders given on the command line, config file not read");
            FileConfig::default()
        } else {
            self.load_file()
        };

        let watched_folder = self.folder_for(FolderRole::Watched, cli, &file)?;
        let sync_folder = self.folder_for(FolderRole::Sync, cli, &file)?;
        let backups_folder = self.folder_for(FolderRole::Backups, cli, &file)?;

        let extension = file.extension.as_deref().unwrap_or(DEFAULT_EXTENSION);
        let extension = NameResolver::new(extension)?.extension().to_string();

        let config = SyncConfig {
            watched_folder,
            sync_folder,
            backups_folder,
            extension,
            debounce: file
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_DEBOUNCE),
            watch_retry: nonzero_or(
                "watchRetryMs",
                file.watch_retry_ms.map(Duration::from_millis),
                DEFAULT_WATCH_RETRY,
            ),
            stats_interval: nonzero_or(
                "statsIntervalSecs",
                file.stats_interval_secs.map(Duration::from_secs),
                DEFAULT_STATS_INTERVAL,
            ),
        };

        tracing::info!(
            watched = %config.watched_folder.display(),
            sync = %config.sync_folder.display(),
            backups = %config.backups_folder.display(),
            extension = %config.extension,
            "Resolved configuration"
        );
        Ok(config)
    }
}

fn nonzero_or(key: &str, value: Option<Duration>, default: Duration) -> Duration {
    match value {
        Some(d) if d.is_zero() => {
            tracing::warn!("{} must be greater than zero, using {:?}", key, default);
            default
        }
        Some(d) => d,
        None => default,
    }
}
