//! File ingestion: the startup scan over a bounded worker pool, the single
//! file ingest path, and the apply step that consumes debounced watcher
//! events.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crossbeam_channel::bounded;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{IndexError, Result};
use crate::index::{ContentIndex, FileIndex, IndexedFile};
use crate::language;
use crate::matcher::IgnoreMatcher;
use crate::watcher::{DebouncedEvent, EventOp};

const WORKER_COUNT: usize = 8;
const JOB_QUEUE_CAPACITY: usize = 100;
const READ_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Path relative to the root, normalized to forward slashes.
pub(crate) fn relative_to(root_dir: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root_dir).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}

/// Walk the tree once and ingest every eligible file through a pool of
/// 8 workers. Returns `(files_indexed, total_size_bytes)`.
pub fn perform_indexing(
    root_dir: &Path,
    file_index: &FileIndex,
    content_index: &ContentIndex,
    matcher: &IgnoreMatcher,
) -> (usize, u64) {
    struct IndexJob {
        path: PathBuf,
        relative_path: String,
        metadata: fs::Metadata,
    }

    let totals: Mutex<(usize, u64)> = Mutex::new((0, 0));
    let (jobs_tx, jobs_rx) = bounded::<IndexJob>(JOB_QUEUE_CAPACITY);

    thread::scope(|scope| {
        for _ in 0..WORKER_COUNT {
            let jobs = jobs_rx.clone();
            let totals = &totals;
            scope.spawn(move || {
                for job in jobs.iter() {
                    match index_single_file(
                        &job.path,
                        &job.relative_path,
                        &job.metadata,
                        file_index,
                        content_index,
                    ) {
                        Ok(()) => {
                            let mut t = match totals.lock() {
                                Ok(guard) => guard,
                                Err(poisoned) => poisoned.into_inner(),
                            };
                            t.0 += 1;
                            t.1 += job.metadata.len();
                        }
                        Err(e) => debug!(path = %job.relative_path, error = %e, "skipped file"),
                    }
                }
            });
        }

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
            let job = IndexJob {
                path: path.to_path_buf(),
                relative_path: relative_to(root_dir, path),
                metadata,
            };
            // Blocks when the queue is full; workers drain it.
            let _ = jobs_tx.send(job);
        }
        drop(jobs_tx);
    });

    match totals.into_inner() {
        Ok(t) => t,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Read and ingest one file into both indexes.
///
/// Binary files are rejected with [`IndexError::BinaryFile`]; content-index
/// failures surface as [`IndexError::IndexingFailed`].
pub fn index_single_file(
    absolute_path: &Path,
    relative_path: &str,
    metadata: &fs::Metadata,
    file_index: &FileIndex,
    content_index: &ContentIndex,
) -> Result<()> {
    let bytes = read_file_with_retry(absolute_path)?;

    if language::is_binary_content(&bytes) {
        return Err(IndexError::BinaryFile);
    }

    let content = String::from_utf8_lossy(&bytes);
    let line_count = content.matches('\n').count() + 1;
    let lang = language::detect_language(absolute_path);

    file_index.add_file(IndexedFile {
        path: absolute_path.to_path_buf(),
        relative_path: relative_path.to_string(),
        language: lang.to_string(),
        size_bytes: metadata.len(),
        mod_time: metadata.modified()?,
        line_count,
    });

    content_index
        .index_file(relative_path, &content, lang)
        .map_err(|e| IndexError::IndexingFailed {
            path: relative_path.to_string(),
            message: e.to_string(),
        })
}

/// Read a file, retrying once after a short delay. Editors briefly lock
/// files while saving.
fn read_file_with_retry(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Ok(data),
        Err(_) => {
            thread::sleep(READ_RETRY_DELAY);
            Ok(fs::read(path)?)
        }
    }
}

/// Consume debounced event batches and apply them to both indexes. Runs
/// until the batch channel closes. A change to an ignore file reloads the
/// matcher instead of being indexed.
pub fn handle_watcher_events(
    batches: &Receiver<Vec<DebouncedEvent>>,
    root_dir: &Path,
    file_index: &FileIndex,
    content_index: &ContentIndex,
    matcher: &IgnoreMatcher,
) {
    for batch in batches.iter() {
        for event in batch {
            let relative_path = relative_to(root_dir, &event.path);

            match event.op {
                EventOp::Remove | EventOp::Rename => {
                    file_index.remove_file(&relative_path);
                    content_index.remove_file(&relative_path);
                    debug!(path = %relative_path, "removed from index");
                }
                EventOp::Create | EventOp::Write => {
                    let base_name = event
                        .path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or_default();
                    if base_name == ".gitignore" || base_name == ".claudeignore" {
                        matcher.reload();
                        info!(trigger = %base_name, "reloaded ignore rules");
                        continue;
                    }

                    if matcher.should_ignore(&event.path) {
                        continue;
                    }
                    let metadata = match fs::metadata(&event.path) {
                        Ok(m) => m,
                        Err(_) => continue,
                    };
                    if metadata.is_dir() {
                        continue;
                    }
                    if matcher.is_file_too_large(metadata.len()) {
                        continue;
                    }

                    match index_single_file(
                        &event.path,
                        &relative_path,
                        &metadata,
                        file_index,
                        content_index,
                    ) {
                        Ok(()) => debug!(path = %relative_path, "updated index"),
                        Err(e) => {
                            debug!(path = %relative_path, error = %e, "skipped file update")
                        }
                    }
                }
            }
        }
    }
}
