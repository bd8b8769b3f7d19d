//! Single-instance lock behaviour against real lock files

use drawsync_fs::{Error, PidLock};
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::tempdir;

/// A PID above any kernel `pid_max`, so no such process can exist.
const DEAD_PID: u32 = i32::MAX as u32;

#[test]
fn stale_lock_is_reclaimed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drawsync.lock");
    fs::write(&path, DEAD_PID.to_string()).unwrap();

    let lock = PidLock::acquire(&path).expect("stale lock should be reclaimed");

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, std::process::id().to_string());
    lock.release();
    assert!(!path.exists());
}

#[cfg(unix)]
#[test]
fn live_owner_refuses_acquisition() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drawsync.lock");
    // PID 1 is always alive
    fs::write(&path, "1").unwrap();

    let err = PidLock::acquire(&path).unwrap_err();
    assert!(
        matches!(err, Error::LockHeld { pid: 1, .. }),
        "expected LockHeld, got: {err}"
    );
    // The foreign lock must be left untouched
    assert_eq!(fs::read_to_string(&path).unwrap(), "1");
}

#[cfg(unix)]
#[test]
fn live_child_process_holds_lock() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drawsync.lock");

    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("sleep should spawn");
    fs::write(&path, child.id().to_string()).unwrap();

    let held = PidLock::acquire(&path);
    assert!(matches!(held, Err(Error::LockHeld { .. })));

    child.kill().unwrap();
    child.wait().unwrap();

    // Once the owner is gone (and reaped), the lock is stale
    let lock = PidLock::acquire(&path).expect("lock of exited process is stale");
    lock.release();
}

#[test]
fn second_acquire_in_same_process_reclaims_own_pid() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("drawsync.lock");

    let first = PidLock::acquire(&path).unwrap();
    // A lock naming our own PID is never "another instance"
    let second = PidLock::acquire(&path).unwrap();

    std::mem::forget(first);
    second.release();
}

#[test]
fn concurrent_acquirers_never_error_unexpectedly() {
    let dir = tempdir().unwrap();
    let path = Arc::new(dir.path().join("drawsync.lock"));
    fs::write(path.as_ref(), DEAD_PID.to_string()).unwrap();

    let num_threads = 4;
    let barrier = Arc::new(Barrier::new(num_threads));

    let handles: Vec<_> = (0..num_threads)
        .map(|_| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                PidLock::acquire(path.as_ref()).map(std::mem::forget)
            })
        })
        .collect();

    for handle in handles {
        let result = handle.join().expect("Thread should not panic");
        // Threads share one PID, so every outcome is either success or bounded contention
        assert!(matches!(result, Ok(()) | Err(Error::LockContention { .. })));
    }

    // The dead owner's PID never survives reclamation
    if let Ok(content) = fs::read_to_string(path.as_ref()) {
        assert_ne!(content, DEAD_PID.to_string());
    }
}
