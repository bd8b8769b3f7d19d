//! Never-overwriting archive of superseded files
//!
//! Every file displaced by a reconciliation is copied here before it is
//! removed or overwritten. Entries are grouped per base name:
//!
//! ```text
//! <backups>/<base>/<base>-<mtime millis>.<ext>
//! <backups>/<base>/<base>-<mtime millis>-<12 digits>.<ext>   (on collision)
//! ```
//!
//! The timestamp is the archived file's own modification time, floored to
//! milliseconds. A path is reserved by exclusive creation before any bytes are
//! copied, so concurrent archivals never share a destination.

mod archive;

pub use archive::{BackupArchive, MAX_RESERVE_ATTEMPTS};
