//! [`TestFolders`] fixture for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_mtime};
use tempfile::TempDir;

/// A temporary root holding `downloads/`, `sync/` and `backups/` folders.
///
/// # Example
///
/// ```rust,no_run
/// use drawsync_test_utils::TestFolders;
///
/// let folders = TestFolders::new();
/// folders.write_download("plan(1).excalidraw", "v1", 20);
/// folders.assert_download_missing("plan(1).excalidraw");
/// ```
pub struct TestFolders {
    temp_dir: TempDir,
}

impl Default for TestFolders {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFolders {
    /// Create the three folders under a fresh temporary directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for name in ["downloads", "sync", "backups"] {
            fs::create_dir_all(temp_dir.path().join(name)).unwrap();
        }
        Self { temp_dir }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn downloads(&self) -> PathBuf {
        self.root().join("downloads")
    }

    pub fn sync(&self) -> PathBuf {
        self.root().join("sync")
    }

    pub fn backups(&self) -> PathBuf {
        self.root().join("backups")
    }

    /// Write `content` to `dir/name` and set its modification time to
    /// `mtime_secs` seconds after the epoch.
    pub fn write_with_mtime(dir: &Path, name: &str, content: &str, mtime_secs: i64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
        path
    }

    /// Write a file into the downloads folder.
    pub fn write_download(&self, name: &str, content: &str, mtime_secs: i64) -> PathBuf {
        Self::write_with_mtime(&self.downloads(), name, content, mtime_secs)
    }

    /// Write a canonical file into the sync folder.
    pub fn write_canonical(&self, name: &str, content: &str, mtime_secs: i64) -> PathBuf {
        Self::write_with_mtime(&self.sync(), name, content, mtime_secs)
    }

    /// Read a file from the sync folder.
    pub fn read_canonical(&self, name: &str) -> String {
        fs::read_to_string(self.sync().join(name))
            .unwrap_or_else(|e| panic!("canonical file {} unreadable: {}", name, e))
    }

    /// Sorted file names directly inside `dir`.
    pub fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Sorted names of the backup entries for `base`.
    pub fn backup_names(&self, base: &str) -> Vec<String> {
        Self::file_names(&self.backups().join(base))
    }

    /// Contents of every backup entry for `base`, sorted.
    pub fn backup_contents(&self, base: &str) -> Vec<String> {
        let dir = self.backups().join(base);
        let mut contents: Vec<String> = Self::file_names(&dir)
            .iter()
            .map(|name| fs::read_to_string(dir.join(name)).unwrap())
            .collect();
        contents.sort();
        contents
    }

    /// Assert the downloads folder holds no file called `name`.
    pub fn assert_download_missing(&self, name: &str) {
        let path = self.downloads().join(name);
        assert!(!path.exists(), "Expected download {} to be gone", path.display());
    }

    /// Assert the downloads folder holds no files at all.
    pub fn assert_downloads_empty(&self) {
        let names = Self::file_names(&self.downloads());
        assert!(names.is_empty(), "Expected empty downloads, found {:?}", names);
    }
}
