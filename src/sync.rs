//! Periodic reconciliation between the filesystem and the indexes.
//!
//! Each tick walks the tree, diffs it against the file-path index, and
//! repairs the drift: missing files are ingested, stale entries dropped,
//! and files with changed modification times re-ingested. Timestamps are
//! compared with strict equality; the periodic reindex is the backstop for
//! filesystems with coarse timestamp granularity.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::index::{ContentIndex, FileIndex};
use crate::indexing::{index_single_file, relative_to};
use crate::matcher::IgnoreMatcher;

/// Outcome of a single sync verification run.
#[derive(Debug, Default)]
pub struct SyncResult {
    /// Files on disk but not in the index.
    pub missing_files: usize,
    /// Files in the index but not on disk.
    pub stale_files: usize,
    /// Files whose modification time differs.
    pub modified_files: usize,
    pub duration: Duration,
}

impl SyncResult {
    pub fn total_discrepancies(&self) -> usize {
        self.missing_files + self.stale_files + self.modified_files
    }
}

/// Run a sync verification every `interval_seconds` until the stop channel
/// is signalled or dropped. An interval of 0 disables the loop entirely.
pub fn run_periodic(
    interval_seconds: u64,
    root_dir: PathBuf,
    file_index: Arc<FileIndex>,
    content_index: Arc<ContentIndex>,
    matcher: Arc<IgnoreMatcher>,
    stop: Receiver<()>,
) {
    if interval_seconds == 0 {
        return;
    }
    let interval = Duration::from_secs(interval_seconds);
    info!(interval_seconds, "periodic sync started");

    loop {
        match stop.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                info!("periodic sync stopped");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {
                let result =
                    perform_sync_verification(&root_dir, &file_index, &content_index, &matcher);
                if result.total_discrepancies() > 0 {
                    info!(
                        missing = result.missing_files,
                        stale = result.stale_files,
                        modified = result.modified_files,
                        duration_ms = result.duration.as_millis() as u64,
                        "sync verification complete"
                    );
                } else {
                    debug!(
                        duration_ms = result.duration.as_millis() as u64,
                        "sync verification complete, index is in sync"
                    );
                }
            }
        }
    }
}

/// Compare the filesystem with the current index state and repair any
/// out-of-sync files.
pub fn perform_sync_verification(
    root_dir: &Path,
    file_index: &FileIndex,
    content_index: &ContentIndex,
    matcher: &IgnoreMatcher,
) -> SyncResult {
    let start = Instant::now();
    let mut result = SyncResult::default();

    // Snapshot of every file on disk that survives the filter chain.
    let mut disk_files: HashMap<String, fs::Metadata> = HashMap::new();
    let walker = WalkDir::new(root_dir).into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !matcher.should_ignore_dir(entry.path())
    });
    for entry in walker.flatten() {
        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if matcher.should_ignore(path) {
            continue;
        }
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if matcher.is_file_too_large(metadata.len()) {
            continue;
        }
        disk_files.insert(relative_to(root_dir, path), metadata);
    }

    // Snapshot of the current index.
    let indexed: HashMap<String, std::time::SystemTime> = file_index
        .all_files()
        .into_iter()
        .map(|f| (f.relative_path, f.mod_time))
        .collect();

    // Missing: on disk but not in the index.
    for (rel_path, metadata) in &disk_files {
        if indexed.contains_key(rel_path) {
            continue;
        }
        let abs_path = root_dir.join(rel_path);
        match index_single_file(&abs_path, rel_path, metadata, file_index, content_index) {
            Ok(()) => {
                info!(path = %rel_path, "sync: indexed missing file");
                result.missing_files += 1;
            }
            Err(e) => debug!(path = %rel_path, error = %e, "sync: skipped missing file"),
        }
    }

    // Stale: in the index but gone from disk.
    for rel_path in indexed.keys() {
        if disk_files.contains_key(rel_path) {
            continue;
        }
        file_index.remove_file(rel_path);
        content_index.remove_file(rel_path);
        info!(path = %rel_path, "sync: removed stale file");
        result.stale_files += 1;
    }

    // Modified: present in both, modification time differs.
    for (rel_path, metadata) in &disk_files {
        let indexed_mod_time = match indexed.get(rel_path) {
            Some(t) => t,
            None => continue, // already handled as missing
        };
        let disk_mod_time = match metadata.modified() {
            Ok(t) => t,
            Err(_) => continue,
        };
        if disk_mod_time == *indexed_mod_time {
            continue;
        }
        let abs_path = root_dir.join(rel_path);
        match index_single_file(&abs_path, rel_path, metadata, file_index, content_index) {
            Ok(()) => {
                info!(path = %rel_path, "sync: re-indexed modified file");
                result.modified_files += 1;
            }
            Err(e) => debug!(path = %rel_path, error = %e, "sync: skipped modified file"),
        }
    }

    result.duration = start.elapsed();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::MatcherOptions;
    use std::sync::mpsc;
    use std::thread;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        file_index: Arc<FileIndex>,
        content_index: Arc<ContentIndex>,
        matcher: Arc<IgnoreMatcher>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let matcher = IgnoreMatcher::new(MatcherOptions {
                root_dir: tmp.path().to_path_buf(),
                custom_patterns: vec![],
                force_include_patterns: vec![],
                max_file_size_bytes: 200,
            })
            .unwrap();
            Self {
                tmp,
                file_index: Arc::new(FileIndex::new()),
                content_index: Arc::new(ContentIndex::new()),
                matcher: Arc::new(matcher),
            }
        }

        fn verify(&self) -> SyncResult {
            perform_sync_verification(
                self.tmp.path(),
                &self.file_index,
                &self.content_index,
                &self.matcher,
            )
        }
    }

    #[test]
    fn test_missing_file_is_indexed() {
        let fx = Fixture::new();
        fs::write(fx.tmp.path().join("new.go"), "package new\n").unwrap();

        let result = fx.verify();
        assert_eq!(result.missing_files, 1);
        assert_eq!(result.stale_files, 0);
        assert_eq!(result.modified_files, 0);
        assert!(fx.file_index.get_file("new.go").is_some());
        assert!(fx.content_index.get_file_content("new.go").is_some());

        // A second run finds nothing to repair.
        let again = fx.verify();
        assert_eq!(again.total_discrepancies(), 0);
    }

    #[test]
    fn test_stale_entry_is_removed() {
        let fx = Fixture::new();
        let path = fx.tmp.path().join("gone.go");
        fs::write(&path, "package gone\n").unwrap();
        fx.verify();
        assert!(fx.file_index.get_file("gone.go").is_some());

        fs::remove_file(&path).unwrap();
        let result = fx.verify();
        assert_eq!(result.stale_files, 1);
        assert!(fx.file_index.get_file("gone.go").is_none());
        assert!(fx.content_index.get_file_content("gone.go").is_none());
    }

    #[test]
    fn test_modified_file_is_reindexed() {
        let fx = Fixture::new();
        let path = fx.tmp.path().join("edit.go");
        fs::write(&path, "package old\n").unwrap();
        fx.verify();

        // Make sure the rewrite lands on a different timestamp even on
        // filesystems with coarse granularity.
        thread::sleep(Duration::from_millis(50));
        fs::write(&path, "package updated\n").unwrap();

        let result = fx.verify();
        assert_eq!(result.modified_files, 1);
        assert_eq!(
            fx.content_index.get_file_content("edit.go").as_deref(),
            Some("package updated\n")
        );
    }

    #[test]
    fn test_filter_chain_applies_during_verification() {
        let fx = Fixture::new();
        fs::write(fx.tmp.path().join("blob.dat"), [0u8, 1, 2]).unwrap();
        fs::write(fx.tmp.path().join("big.txt"), "x".repeat(500)).unwrap();
        fs::create_dir(fx.tmp.path().join("node_modules")).unwrap();
        fs::write(fx.tmp.path().join("node_modules/dep.js"), "x\n").unwrap();
        fs::write(fx.tmp.path().join("ok.go"), "package ok\n").unwrap();

        fx.verify();

        assert!(fx.file_index.get_file("ok.go").is_some());
        assert!(fx.file_index.get_file("blob.dat").is_none());
        assert!(fx.file_index.get_file("big.txt").is_none());
        assert!(fx.file_index.get_file("node_modules/dep.js").is_none());
    }

    #[test]
    fn test_stop_signal_ends_loop_promptly() {
        let fx = Fixture::new();
        let (stop_tx, stop_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        let root = fx.tmp.path().to_path_buf();
        let file_index = Arc::clone(&fx.file_index);
        let content_index = Arc::clone(&fx.content_index);
        let matcher = Arc::clone(&fx.matcher);
        thread::spawn(move || {
            run_periodic(3600, root, file_index, content_index, matcher, stop_rx);
            let _ = done_tx.send(());
        });

        stop_tx.send(()).unwrap();
        done_rx
            .recv_timeout(Duration::from_secs(2))
            .expect("reconciler did not stop within the grace period");
    }

    #[test]
    fn test_zero_interval_disables_loop() {
        let fx = Fixture::new();
        let (_stop_tx, stop_rx) = mpsc::channel();
        // Returns immediately instead of ticking.
        run_periodic(
            0,
            fx.tmp.path().to_path_buf(),
            Arc::clone(&fx.file_index),
            Arc::clone(&fx.content_index),
            Arc::clone(&fx.matcher),
            stop_rx,
        );
    }
}
