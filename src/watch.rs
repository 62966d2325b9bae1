//! Data-file watching
//!
//! Poll-based change detection for the CLI `watch` command. Mutations made
//! by other processes land in the snapshot file; the watcher polls its
//! modification time and reports "something changed" so the caller can
//! re-fetch and recompute. Coarse by design, like the in-process feed.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Poll interval (recommended: 1-2 seconds)
    pub poll_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Polls a file's modification time.
#[derive(Debug)]
pub struct FileWatcher {
    path: PathBuf,
    config: WatcherConfig,
    last_modified: Option<SystemTime>,
}

impl FileWatcher {
    /// Create a watcher; the current state of the file is the baseline.
    pub fn new(path: impl Into<PathBuf>, config: WatcherConfig) -> Self {
        let path = path.into();
        let last_modified = modified_time(&path);
        Self {
            path,
            config,
            last_modified,
        }
    }

    /// Check once whether the file changed since the previous check.
    ///
    /// A file appearing or disappearing counts as a change.
    pub fn poll(&mut self) -> bool {
        let modified = modified_time(&self.path);
        let changed = modified != self.last_modified;
        self.last_modified = modified;
        changed
    }

    /// Poll until `stop` is set, invoking `on_change` for every observed
    /// change. Sleeps `poll_interval` between checks.
    pub fn run_until<F>(&mut self, stop: &AtomicBool, mut on_change: F)
    where
        F: FnMut(),
    {
        while !stop.load(Ordering::SeqCst) {
            if self.poll() {
                on_change();
            }
            std::thread::sleep(self.config.poll_interval);
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_change_no_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();

        let mut watcher = FileWatcher::new(&path, WatcherConfig::default());
        assert!(!watcher.poll());
        assert!(!watcher.poll());
    }

    #[test]
    fn test_mtime_change_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();

        let mut watcher = FileWatcher::new(&path, WatcherConfig::default());

        // Force a distinct mtime regardless of filesystem granularity
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"{\"jobs\":[]}").unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(2))
            .unwrap();

        assert!(watcher.poll());
        assert!(!watcher.poll());
    }

    #[test]
    fn test_file_appearing_is_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let mut watcher = FileWatcher::new(&path, WatcherConfig::default());
        assert!(!watcher.poll());

        fs::write(&path, "{}").unwrap();
        assert!(watcher.poll());
    }

    #[test]
    fn test_file_disappearing_is_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{}").unwrap();

        let mut watcher = FileWatcher::new(&path, WatcherConfig::default());
        fs::remove_file(&path).unwrap();
        assert!(watcher.poll());
    }
}
