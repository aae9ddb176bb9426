//! Recursive filesystem watcher with debounced event delivery.
//!
//! Wraps the native notification primitive, enrolls every non-ignored
//! subdirectory at startup, auto-enrolls newly created ones, and forwards
//! coalesced events to the apply step.

pub mod debouncer;

pub use debouncer::{DebouncedEvent, Debouncer, EventOp};

use std::fs;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::Result;
use crate::matcher::IgnoreMatcher;

/// Quiet interval during which successive events for a path are collapsed.
const DEBOUNCE_INTERVAL: Duration = Duration::from_millis(100);

/// Capability the watcher needs from the ignore matcher. Kept as a trait so
/// tests can inject a fake.
pub trait IgnoreChecker: Send + Sync {
    fn should_ignore(&self, absolute_path: &Path) -> bool;
    fn should_ignore_dir(&self, absolute_path: &Path) -> bool;
}

impl IgnoreChecker for IgnoreMatcher {
    fn should_ignore(&self, absolute_path: &Path) -> bool {
        IgnoreMatcher::should_ignore(self, absolute_path)
    }

    fn should_ignore_dir(&self, absolute_path: &Path) -> bool {
        IgnoreMatcher::should_ignore_dir(self, absolute_path)
    }
}

type SharedFsWatcher = Arc<Mutex<Option<RecommendedWatcher>>>;

/// Recursive watcher. `start()` runs the event loop on a background thread;
/// `close()` releases the native watcher and lets every downstream consumer
/// drain and exit.
pub struct Watcher {
    fs_watcher: SharedFsWatcher,
    native_events: Option<Receiver<notify::Result<Event>>>,
    debouncer: Option<Debouncer>,
    batches: Option<Receiver<Vec<DebouncedEvent>>>,
    ignore_checker: Arc<dyn IgnoreChecker>,
}

impl Watcher {
    /// Create a watcher rooted at `root_dir`, enrolling every directory the
    /// checker does not reject. Enrollment failures on individual
    /// directories are logged and skipped.
    pub fn new(root_dir: &Path, ignore_checker: Arc<dyn IgnoreChecker>) -> Result<Self> {
        let (tx, native_events) = mpsc::channel();
        let mut fs_watcher = RecommendedWatcher::new(tx, Config::default())?;

        let walker = WalkDir::new(root_dir).into_iter().filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !ignore_checker.should_ignore_dir(entry.path())
        });
        for entry in walker.flatten() {
            if !entry.file_type().is_dir() {
                continue;
            }
            if let Err(e) = fs_watcher.watch(entry.path(), RecursiveMode::NonRecursive) {
                warn!(path = %entry.path().display(), error = %e, "failed to watch directory");
            }
        }

        let (debouncer, batches) = Debouncer::new(DEBOUNCE_INTERVAL);

        Ok(Self {
            fs_watcher: Arc::new(Mutex::new(Some(fs_watcher))),
            native_events: Some(native_events),
            debouncer: Some(debouncer),
            batches: Some(batches),
            ignore_checker,
        })
    }

    /// The consumer endpoint for debounced event batches. Yields `None` once
    /// taken.
    pub fn events(&mut self) -> Option<Receiver<Vec<DebouncedEvent>>> {
        self.batches.take()
    }

    /// Start the event loop on a background thread. The loop runs until
    /// `close()` drops the native watcher.
    pub fn start(&mut self) {
        let native_events = match self.native_events.take() {
            Some(rx) => rx,
            None => return,
        };
        let debouncer = match self.debouncer.take() {
            Some(d) => d,
            None => return,
        };
        let fs_watcher = Arc::clone(&self.fs_watcher);
        let checker = Arc::clone(&self.ignore_checker);

        thread::spawn(move || {
            for result in native_events.iter() {
                match result {
                    Ok(event) => handle_event(&event, &fs_watcher, checker.as_ref(), &debouncer),
                    Err(e) => warn!(error = %e, "watcher error"),
                }
            }
            // Channel closed: the native watcher was dropped by close().
            // The debouncer is dropped here, flushing any pending batch.
        });
    }

    /// Release the native watcher. The event loop, the debouncer, and the
    /// batch channel shut down in cascade.
    pub fn close(&mut self) {
        let mut guard = match self.fs_watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }
}

/// Translate one native event into debouncer input, enrolling newly created
/// directories along the way.
fn handle_event(
    event: &Event,
    fs_watcher: &SharedFsWatcher,
    checker: &dyn IgnoreChecker,
    debouncer: &Debouncer,
) {
    for (position, path) in event.paths.iter().enumerate() {
        let op = match map_event_kind(&event.kind, position, path) {
            Some(op) => op,
            None => continue,
        };

        if op == EventOp::Create {
            if let Ok(meta) = fs::metadata(path) {
                if meta.is_dir() {
                    // Newly created subtree: start watching it. Files inside
                    // produce their own events as the native layer reports them.
                    if !checker.should_ignore_dir(path) {
                        enroll(fs_watcher, path);
                    }
                    continue;
                }
            }
        }

        if checker.should_ignore(path) {
            continue;
        }

        debouncer.add(path.clone(), op);
    }
}

/// Map native flags to one op, priority Create > Write > Remove > Rename.
/// Rename destinations count as creations; rename sources as renames.
fn map_event_kind(kind: &EventKind, position: usize, path: &Path) -> Option<EventOp> {
    match kind {
        EventKind::Create(_) => Some(EventOp::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(EventOp::Rename),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(EventOp::Create),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // Two paths: the old name, then the new one.
            if position == 0 {
                Some(EventOp::Rename)
            } else {
                Some(EventOp::Create)
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            if path.exists() {
                Some(EventOp::Create)
            } else {
                Some(EventOp::Rename)
            }
        }
        EventKind::Modify(_) => Some(EventOp::Write),
        EventKind::Remove(_) => Some(EventOp::Remove),
        _ => None,
    }
}

fn enroll(fs_watcher: &SharedFsWatcher, path: &Path) {
    let mut guard = match fs_watcher.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(ref mut watcher) = *guard {
        if let Err(e) = watcher.watch(path, RecursiveMode::NonRecursive) {
            warn!(path = %path.display(), error = %e, "failed to watch new directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    /// Fake checker that ignores nothing.
    struct AllowAll;

    impl IgnoreChecker for AllowAll {
        fn should_ignore(&self, _: &Path) -> bool {
            false
        }
        fn should_ignore_dir(&self, _: &Path) -> bool {
            false
        }
    }

    /// Fake checker that ignores paths containing a marker.
    struct IgnoreMarked(&'static str);

    impl IgnoreChecker for IgnoreMarked {
        fn should_ignore(&self, path: &Path) -> bool {
            path.to_string_lossy().contains(self.0)
        }
        fn should_ignore_dir(&self, path: &Path) -> bool {
            self.should_ignore(path)
        }
    }

    /// Wait until a batch containing `needle` arrives, or time out.
    fn wait_for_path(
        batches: &Receiver<Vec<DebouncedEvent>>,
        needle: &str,
        timeout: Duration,
    ) -> Option<DebouncedEvent> {
        let deadline = Instant::now() + timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match batches.recv_timeout(remaining) {
                Ok(batch) => {
                    if let Some(event) = batch
                        .into_iter()
                        .find(|e| e.path.to_string_lossy().contains(needle))
                    {
                        return Some(event);
                    }
                }
                Err(_) => break,
            }
        }
        None
    }

    #[test]
    fn test_file_creation_produces_event() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), Arc::new(AllowAll)).unwrap();
        let batches = watcher.events().unwrap();
        watcher.start();

        std::fs::write(tmp.path().join("new.go"), "package main\n").unwrap();

        let event = wait_for_path(&batches, "new.go", Duration::from_secs(5))
            .expect("expected an event for new.go");
        assert!(matches!(event.op, EventOp::Create | EventOp::Write));

        watcher.close();
    }

    #[test]
    fn test_ignored_file_produces_no_event() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), Arc::new(IgnoreMarked(".log"))).unwrap();
        let batches = watcher.events().unwrap();
        watcher.start();

        std::fs::write(tmp.path().join("server.log"), "noise\n").unwrap();
        std::fs::write(tmp.path().join("main.go"), "package main\n").unwrap();

        let event = wait_for_path(&batches, "main.go", Duration::from_secs(5))
            .expect("expected an event for main.go");
        assert!(!event.path.to_string_lossy().contains("server.log"));

        watcher.close();
    }

    #[test]
    fn test_new_subdirectory_is_auto_enrolled() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), Arc::new(AllowAll)).unwrap();
        let batches = watcher.events().unwrap();
        watcher.start();

        let subdir = tmp.path().join("pkg");
        std::fs::create_dir(&subdir).unwrap();
        // Give the event loop a moment to enroll the new directory.
        thread::sleep(Duration::from_millis(300));
        std::fs::write(subdir.join("inner.go"), "package pkg\n").unwrap();

        let event = wait_for_path(&batches, "inner.go", Duration::from_secs(5))
            .expect("expected an event from the new subdirectory");
        assert!(event.path.ends_with("pkg/inner.go"));

        watcher.close();
    }

    #[test]
    fn test_close_shuts_down_event_channel() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), Arc::new(AllowAll)).unwrap();
        let batches = watcher.events().unwrap();
        watcher.start();

        watcher.close();

        // After close the channel drains and disconnects.
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match batches.recv_timeout(Duration::from_millis(100)) {
                Ok(_) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    assert!(
                        Instant::now() < deadline,
                        "event channel did not close after watcher shutdown"
                    );
                }
            }
        }
    }

    #[test]
    fn test_events_endpoint_can_only_be_taken_once() {
        let tmp = TempDir::new().unwrap();
        let mut watcher = Watcher::new(tmp.path(), Arc::new(AllowAll)).unwrap();
        assert!(watcher.events().is_some());
        assert!(watcher.events().is_none());
    }
}
