//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use drawsync_core::{CliOverrides, DEFAULT_CONFIG_PATH};
use drawsync_fs::constants::default_lock_path;

/// drawsync - Keep one canonical copy of every drawing saved to your downloads
#[derive(Parser, Debug)]
#[command(name = "drawsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Folder where new saves appear
    #[arg(short = 'd', long, global = true, value_name = "DIR")]
    pub downloads_folder: Option<PathBuf>,

    /// Folder holding one canonical file per drawing
    #[arg(short = 's', long, global = true, value_name = "DIR")]
    pub sync_folder: Option<PathBuf>,

    /// Folder receiving backups of replaced files
    #[arg(short = 'b', long, global = true, value_name = "DIR")]
    pub backups_folder: Option<PathBuf>,

    /// Config file (JSON, TOML or YAML)
    #[arg(
        short = 'c',
        long,
        global = true,
        value_name = "FILE",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config_path: PathBuf,

    /// Single-instance lock file [default: <temp dir>/drawsync.lock]
    #[arg(long, global = true, value_name = "FILE", env = "DRAWSYNC_LOCK_FILE")]
    pub lock_file: Option<PathBuf>,

    /// The command to run (defaults to `watch`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Reconcile existing files, then watch for new saves until interrupted
    Watch,

    /// Reconcile existing files once and exit
    ///
    /// Exits with a non-zero status if any drawing could not be reconciled.
    Scan,
}

impl Cli {
    /// Folder overrides given on the command line.
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            downloads_folder: self.downloads_folder.clone(),
            sync_folder: self.sync_folder.clone(),
            backups_folder: self.backups_folder.clone(),
        }
    }

    /// Lock file path, falling back to the temp directory.
    pub fn lock_path(&self) -> PathBuf {
        self.lock_file.clone().unwrap_or_else(default_lock_path)
    }

    /// Command to run; `watch` when none was given.
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Watch)
    }
}
