//! Filesystem layer for drawsync
//!
//! Provides document-name parsing, variant resolution over a watched folder,
//! the single-instance PID lock, and path-aware I/O helpers.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod name;
pub mod variant;

pub use config::ConfigStore;
pub use constants::FolderRole;
pub use error::{Error, Result};
pub use lock::PidLock;
pub use name::{DocumentName, NameResolver};
pub use variant::{Variant, list_documents, list_variants, pick_most_recent};
