//! Per-path event coalescing with a quiet-window timer.
//!
//! Editors emit bursts like Create→Write→Write on save; the debouncer
//! collapses them so the apply step sees one event per path, with the latest
//! operation winning.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread;
use std::time::Duration;

/// The type of file system operation, after coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOp {
    Create,
    Write,
    Remove,
    Rename,
}

/// A batched file system event.
#[derive(Debug, Clone)]
pub struct DebouncedEvent {
    pub path: PathBuf,
    pub op: EventOp,
}

/// Size of the output buffer. A slow consumer blocks the flusher instead of
/// losing batches.
const OUTPUT_BUFFER: usize = 16;

/// Collects events and emits them as batches once a full quiet interval
/// passes without new input. Dropping the debouncer flushes any pending
/// events and stops the background thread.
pub struct Debouncer {
    input: Sender<(PathBuf, EventOp)>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet interval. Returns the handle
    /// and the consumer endpoint for batches.
    pub fn new(interval: Duration) -> (Self, Receiver<Vec<DebouncedEvent>>) {
        let (input, events) = mpsc::channel::<(PathBuf, EventOp)>();
        let (output, batches) = mpsc::sync_channel::<Vec<DebouncedEvent>>(OUTPUT_BUFFER);

        thread::spawn(move || run_loop(&events, &output, interval));

        (Self { input }, batches)
    }

    /// Record an event. Replaces any pending entry for the same path and
    /// restarts the quiet-window timer.
    pub fn add(&self, path: PathBuf, op: EventOp) {
        // Send only fails when the flusher thread is gone, i.e. on shutdown.
        let _ = self.input.send((path, op));
    }
}

fn run_loop(
    events: &Receiver<(PathBuf, EventOp)>,
    output: &SyncSender<Vec<DebouncedEvent>>,
    interval: Duration,
) {
    let mut pending: HashMap<PathBuf, EventOp> = HashMap::new();

    loop {
        match events.recv_timeout(interval) {
            Ok((path, op)) => {
                // Latest op wins within the window.
                pending.insert(path, op);
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending.is_empty() {
                    continue;
                }
                if flush(&mut pending, output).is_err() {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                if !pending.is_empty() {
                    let _ = flush(&mut pending, output);
                }
                return;
            }
        }
    }
}

fn flush(
    pending: &mut HashMap<PathBuf, EventOp>,
    output: &SyncSender<Vec<DebouncedEvent>>,
) -> Result<(), mpsc::SendError<Vec<DebouncedEvent>>> {
    let batch: Vec<DebouncedEvent> = pending
        .drain()
        .map(|(path, op)| DebouncedEvent { path, op })
        .collect();
    output.send(batch)
}
