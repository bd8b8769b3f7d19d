//! Reconciliation scenarios against real folders

use std::fs;
use std::sync::Arc;

use drawsync_core::{Reconcile, StatsSnapshot, SyncConfig, SyncEngine, SyncStats};
use drawsync_fs::constants::{DEFAULT_DEBOUNCE, DEFAULT_STATS_INTERVAL, DEFAULT_WATCH_RETRY};
use drawsync_test_utils::TestFolders;
use pretty_assertions::assert_eq;

fn engine(folders: &TestFolders) -> SyncEngine {
    let config = SyncConfig {
        watched_folder: folders.downloads(),
        sync_folder: folders.sync(),
        backups_folder: folders.backups(),
        extension: "excalidraw".into(),
        debounce: DEFAULT_DEBOUNCE,
        watch_retry: DEFAULT_WATCH_RETRY,
        stats_interval: DEFAULT_STATS_INTERVAL,
    }
    .validate()
    .unwrap();
    SyncEngine::new(Arc::new(config), Arc::new(SyncStats::new())).unwrap()
}

#[tokio::test]
async fn newest_variant_wins_and_others_are_archived() {
    let folders = TestFolders::new();
    folders.write_download("board.excalidraw", "v10", 10);
    folders.write_download("board(1).excalidraw", "v20", 20);
    folders.write_download("board(2).excalidraw", "v15", 15);
    let engine = engine(&folders);

    let report = engine.reconcile("board").await.unwrap();

    assert!(report.promoted.is_some());
    assert_eq!(folders.read_canonical("board.excalidraw"), "v20");
    assert_eq!(
        folders.backup_names("board"),
        vec!["board-10000.excalidraw", "board-15000.excalidraw"]
    );
    assert_eq!(folders.backup_contents("board"), vec!["v10", "v15"]);
    folders.assert_downloads_empty();
    assert_eq!(
        engine.stats().snapshot(),
        StatsSnapshot {
            files_processed: 1,
            backups_created: 2,
            errors: 0,
        }
    );
}

#[tokio::test]
async fn replaced_canonical_file_is_archived_first() {
    let folders = TestFolders::new();
    folders.write_canonical("plan.excalidraw", "old", 5);
    folders.write_download("plan(1).excalidraw", "new", 30);
    let engine = engine(&folders);

    let report = engine.reconcile("plan").await.unwrap();

    assert_eq!(report.backups.len(), 1);
    assert_eq!(folders.read_canonical("plan.excalidraw"), "new");
    assert_eq!(folders.backup_names("plan"), vec!["plan-5000.excalidraw"]);
    assert_eq!(folders.backup_contents("plan"), vec!["old"]);
    folders.assert_download_missing("plan(1).excalidraw");
}

#[tokio::test]
async fn no_variants_changes_nothing() {
    let folders = TestFolders::new();
    folders.write_canonical("ghost.excalidraw", "keep", 5);
    let engine = engine(&folders);

    let report = engine.reconcile("ghost").await.unwrap();

    assert!(report.is_noop());
    assert_eq!(folders.read_canonical("ghost.excalidraw"), "keep");
    assert!(folders.backup_names("ghost").is_empty());
    assert_eq!(engine.stats().snapshot(), StatsSnapshot::default());
}

#[tokio::test]
async fn at_most_one_canonical_file_per_base() {
    let folders = TestFolders::new();
    for (name, mtime) in [
        ("a.excalidraw", 1),
        ("a(1).excalidraw", 2),
        ("a(7).excalidraw", 3),
        ("b(2).excalidraw", 4),
        ("b(3).excalidraw", 5),
    ] {
        folders.write_download(name, name, mtime);
    }
    let engine = engine(&folders);

    engine.reconcile("a").await.unwrap();
    engine.reconcile("b").await.unwrap();
    engine.reconcile("a").await.unwrap();

    assert_eq!(
        TestFolders::file_names(&folders.sync()),
        vec!["a.excalidraw", "b.excalidraw"]
    );
    assert_eq!(folders.read_canonical("a.excalidraw"), "a(7).excalidraw");
    assert_eq!(folders.read_canonical("b.excalidraw"), "b(3).excalidraw");
}

#[tokio::test]
async fn equal_mtimes_get_distinct_backup_entries() {
    let folders = TestFolders::new();
    folders.write_canonical("doc.excalidraw", "canonical", 100);
    folders.write_download("doc(2).excalidraw", "loser", 100);
    folders.write_download("doc(1).excalidraw", "winner", 200);
    let engine = engine(&folders);

    engine.reconcile("doc").await.unwrap();

    let names = folders.backup_names("doc");
    assert_eq!(names.len(), 2, "got {:?}", names);
    assert!(names.contains(&"doc-100000.excalidraw".to_string()));
    assert!(names.iter().any(|n| n.starts_with("doc-100000-")));
    assert_eq!(folders.backup_contents("doc"), vec!["canonical", "loser"]);
    assert_eq!(folders.read_canonical("doc.excalidraw"), "winner");
}

#[tokio::test]
async fn interrupted_promotion_is_completed_on_retry() {
    let folders = TestFolders::new();
    // Copy succeeded but the source was never deleted.
    folders.write_canonical("sketch.excalidraw", "same", 50);
    folders.write_download("sketch.excalidraw", "same", 50);
    let engine = engine(&folders);

    let report = engine.reconcile("sketch").await.unwrap();

    assert!(report.promoted.is_some());
    assert_eq!(folders.read_canonical("sketch.excalidraw"), "same");
    assert_eq!(folders.backup_contents("sketch"), vec!["same"]);
    folders.assert_downloads_empty();
}

#[tokio::test]
async fn failure_is_counted_and_leaves_sources_in_place() {
    let folders = TestFolders::new();
    folders.write_canonical("plan.excalidraw", "old", 5);
    folders.write_download("plan(1).excalidraw", "new", 30);
    let engine = engine(&folders);

    // Archive root replaced by a plain file: the backup cannot be written.
    fs::remove_dir_all(folders.backups()).unwrap();
    fs::write(folders.backups(), "blocker").unwrap();

    let result = engine.reconcile("plan").await;

    assert!(result.is_err());
    assert_eq!(engine.stats().snapshot().errors, 1);
    assert_eq!(folders.read_canonical("plan.excalidraw"), "old");
    assert!(folders.downloads().join("plan(1).excalidraw").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn inaccessible_variant_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    // Permission bits do not restrict root.
    if unsafe { libc::geteuid() } == 0 {
        return;
    }

    let folders = TestFolders::new();
    folders.write_download("locked.excalidraw", "older", 10);
    let newest = folders.write_download("locked(1).excalidraw", "newest", 99);
    fs::set_permissions(&newest, fs::Permissions::from_mode(0o000)).unwrap();
    let engine = engine(&folders);

    let report = engine.reconcile("locked").await.unwrap();
    fs::set_permissions(&newest, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(folders.read_canonical("locked.excalidraw"), "older");
    assert!(newest.exists());
}

#[tokio::test]
async fn dot_base_names_never_leave_the_backups_folder() {
    let folders = TestFolders::new();
    folders.write_download("...excalidraw", "dotdot", 10);
    folders.write_download("..(1).excalidraw", "dotdot-1", 20);
    folders.write_download("..excalidraw", "dot", 30);
    let engine = engine(&folders);

    for base in ["..", "."] {
        let report = engine.reconcile(base).await.unwrap();
        assert!(report.is_noop(), "{:?} must not be reconciled", base);
    }

    assert_eq!(
        TestFolders::file_names(&folders.downloads()),
        vec!["..(1).excalidraw", "...excalidraw", "..excalidraw"]
    );
    assert!(TestFolders::file_names(&folders.sync()).is_empty());
    assert!(TestFolders::file_names(&folders.backups()).is_empty());
    assert!(TestFolders::file_names(&folders.root()).is_empty());
}
