//! Configuration resolution and folder validation
//!
//! Settings are merged from three layers, highest precedence first:
//!
//! 1. **Command line** - folder overrides passed to the binary
//! 2. **Config file** - `/etc/drawsync/config.json` unless another path is given;
//!    JSON, TOML and YAML are accepted
//! 3. **Built-in defaults** - `~/Downloads`, `~/ExcalidrawSync`, `~/ExcalidrawSync/backups`
//!
//! The merged [`SyncConfig`] is then validated: every folder is created if
//! missing, probed for write access, and canonicalized.
//!
//! # Example
//!
//! ```ignore
//! use drawsync_core::config::{CliOverrides, ConfigResolver};
//!
//! let resolver = ConfigResolver::new("/etc/drawsync/config.json");
//! let config = resolver.resolve(&CliOverrides::default())?.validate()?;
//! println!("Watching {}", config.watched_folder.display());
//! ```

mod resolver;
mod settings;
mod validate;

pub use resolver::{CliOverrides, ConfigResolver, DEFAULT_CONFIG_PATH, FileConfig};
pub use settings::SyncConfig;
