//! Single-instance lock backed by a PID file
//!
//! The lock file holds the decimal PID of its owner. A lock left behind by a
//! process that is no longer alive is stale and gets reclaimed. There is an
//! inherent check-then-act window between reading a stale PID and removing the
//! file; this is a single-host guard, not a distributed lock.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Attempts at creating the lock file before giving up.
pub const MAX_ACQUIRE_ATTEMPTS: u32 = 3;

/// A held single-instance lock.
///
/// Released explicitly with [`PidLock::release`], or on drop.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    released: bool,
}

impl PidLock {
    /// Acquire the lock at `path` for the current process.
    ///
    /// Fails with [`Error::LockHeld`] if a live process owns the lock and with
    /// [`Error::LockContention`] if the file keeps reappearing.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let own_pid = std::process::id();

        for attempt in 1..=MAX_ACQUIRE_ATTEMPTS {
            match create_exclusive(&path, own_pid) {
                Ok(()) => {
                    debug!(path = %path.display(), pid = own_pid, "Lock acquired");
                    return Ok(Self {
                        path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => return Err(Error::io(&path, e)),
            }

            match read_owner(&path)? {
                Some(pid) if pid != own_pid && is_process_alive(pid) => {
                    return Err(Error::LockHeld { path, pid });
                }
                owner => {
                    info!(
                        path = %path.display(),
                        owner = ?owner,
                        attempt,
                        "Removing stale lock file"
                    );
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == ErrorKind::NotFound => {}
                        Err(e) => return Err(Error::io(&path, e)),
                    }
                }
            }
        }

        Err(Error::LockContention {
            path,
            attempts: MAX_ACQUIRE_ATTEMPTS,
        })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the lock file. Failure is logged, not returned.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Lock released"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove lock file"),
        }
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Create the lock file, failing if it already exists.
fn create_exclusive(path: &Path, pid: u32) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(pid.to_string().as_bytes())?;
    file.sync_all()
}

/// PID recorded in the lock file, or `None` if the content is not a PID.
///
/// A file that vanished since the failed create reads as `None` too.
fn read_owner(path: &Path) -> Result<Option<u32>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.trim().parse::<u32>().ok().filter(|pid| *pid != 0)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Check if a process is still alive by PID
pub fn is_process_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        let Ok(pid) = libc::pid_t::try_from(pid) else {
            return false;
        };
        if pid <= 0 {
            return false;
        }
        // Signal 0 performs the permission and existence checks only
        let res = unsafe { libc::kill(pid, 0) };
        if res == 0 {
            return true;
        }
        // EPERM: the process exists but belongs to someone else
        std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
    }
    #[cfg(windows)]
    {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|o| {
                let out = String::from_utf8_lossy(&o.stdout);
                out.contains(&pid.to_string())
            })
            .unwrap_or(false)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = pid;
        false
    }
}
