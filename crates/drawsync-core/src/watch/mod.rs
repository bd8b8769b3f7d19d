//! Event-driven reconciliation
//!
//! - **debounce**: coalesces bursts of change events per base name
//! - **watcher**: the restartable watch loop over the downloads folder

mod debounce;
mod watcher;

pub use debounce::{DebounceAggregator, ScanSummary};
pub use watcher::FolderWatcher;
