//! End-to-end integration test for the full pipeline
//!
//! This test exercises the complete flow: config resolution -> folder
//! validation -> initial scan -> live watching -> debounced reconciliation.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use drawsync_core::{
    CliOverrides, ConfigResolver, DebounceAggregator, FolderWatcher, SyncConfig, SyncEngine,
    SyncStats,
};
use drawsync_test_utils::TestFolders;
use pretty_assertions::assert_eq;

/// Resolve configuration the way the binary does, with a config file
/// supplying the backups folder and fast timings.
fn resolve_config(folders: &TestFolders) -> SyncConfig {
    let config_path = folders.root().join("drawsync.json");
    fs::write(
        &config_path,
        format!(
            r#"{{"backupsFolder": {:?}, "debounceMs": 100, "watchRetryMs": 100}}"#,
            folders.backups()
        ),
    )
    .unwrap();

    let overrides = CliOverrides {
        downloads_folder: Some(folders.downloads()),
        sync_folder: Some(folders.sync()),
        backups_folder: None,
    };
    ConfigResolver::new(config_path)
        .with_home_dir(folders.root().join("home"))
        .resolve(&overrides)
        .unwrap()
        .validate()
        .unwrap()
}

fn start(folders: &TestFolders) -> (Arc<FolderWatcher>, Arc<SyncStats>) {
    let config = Arc::new(resolve_config(folders));
    assert_eq!(config.debounce, Duration::from_millis(100));

    let stats = Arc::new(SyncStats::new());
    let engine = Arc::new(SyncEngine::new(Arc::clone(&config), Arc::clone(&stats)).unwrap());
    let aggregator = DebounceAggregator::new(engine, config.debounce);
    let watcher = FolderWatcher::new(&config, aggregator)
        .unwrap()
        .with_max_retry(Duration::from_millis(400));
    (Arc::new(watcher), stats)
}

async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// Keep re-saving `name` until its canonical file shows up. Saves made before
/// the watch is established produce no event, so one write is not enough.
async fn save_until_synced(folders: &TestFolders, name: &str, content: &str, canonical: &str) {
    let target = folders.sync().join(canonical);
    let deadline = Instant::now() + Duration::from_secs(15);
    while !target.exists() && Instant::now() < deadline {
        folders.write_download(name, content, 1_000);
        wait_for(&target, Duration::from_secs(1)).await;
    }
    assert_eq!(folders.read_canonical(canonical), content);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_initial_scan_then_live_sync() {
    let folders = TestFolders::new();
    folders.write_download("roadmap.excalidraw", "r-old", 10);
    folders.write_download("roadmap(1).excalidraw", "r-new", 20);
    folders.write_canonical("roadmap.excalidraw", "r-canonical", 5);

    let (watcher, stats) = start(&folders);
    let running = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    // Initial scan: newest variant wins, previous canonical is archived.
    let deadline = Instant::now() + Duration::from_secs(10);
    while folders.read_canonical("roadmap.excalidraw") != "r-new" && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(folders.read_canonical("roadmap.excalidraw"), "r-new");
    assert_eq!(folders.backup_contents("roadmap"), vec!["r-canonical", "r-old"]);

    // Live: a brand new document saved while watching.
    save_until_synced(&folders, "sketch(4).excalidraw", "s4", "sketch.excalidraw").await;

    // Unrelated files are never touched.
    fs::write(folders.downloads().join("photo.png"), "png").unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(folders.downloads().join("photo.png").exists());

    assert!(!running.is_finished());
    running.abort();

    let snapshot = stats.flush();
    assert!(snapshot.files_processed >= 2);
    assert_eq!(snapshot.errors, 0);
}

#[cfg(target_os = "linux")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_recovers_after_folder_removal() {
    let folders = TestFolders::new();
    let (watcher, _stats) = start(&folders);
    let running = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    save_until_synced(&folders, "before(1).excalidraw", "b", "before.excalidraw").await;

    // Removing the watched folder kills the watch; it is retried until the
    // folder comes back.
    fs::remove_dir_all(folders.downloads()).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::create_dir_all(folders.downloads()).unwrap();
    // Written while no watch is active: only the rescan after restart sees it.
    folders.write_download("during(2).excalidraw", "d", 2_000);

    assert!(
        wait_for(&folders.sync().join("during.excalidraw"), Duration::from_secs(10)).await,
        "file written while the watch was down was never reconciled"
    );
    assert_eq!(folders.read_canonical("during.excalidraw"), "d");

    assert!(!running.is_finished());
    running.abort();
}
