//! Unbounded FIFO of filenames awaiting classification.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use magicfolder_core::ignore::is_ignored;
use magicfolder_core::VisibilityState;

#[derive(Debug, Default)]
struct QueueInner {
    fifo: VecDeque<String>,
    /// Names in the FIFO or in the batch currently being classified.
    /// Membership here rejects re-enqueues; cleared by `finish_batch`.
    in_flight: HashSet<String>,
    running: bool,
}

/// FIFO plus in-flight marker set, guarded by one mutex and paired with a
/// condition variable that wakes the worker.
///
/// Lock order: `enqueue` consults the visibility state (and releases its
/// mutex) strictly before taking the queue mutex, so no caller ever holds
/// both locks at once.
pub struct ClassifyQueue {
    state: Arc<VisibilityState>,
    inner: Mutex<QueueInner>,
    available: Condvar,
}

impl ClassifyQueue {
    pub fn new(state: Arc<VisibilityState>) -> Self {
        Self {
            state,
            inner: Mutex::new(QueueInner {
                running: true,
                ..Default::default()
            }),
            available: Condvar::new(),
        }
    }

    /// Queue a filename for classification and wake the worker.
    ///
    /// Ignored names, names already awaiting a verdict, and names that
    /// already have a category are rejected. Returns whether the name was
    /// actually queued.
    pub fn enqueue(&self, name: &str) -> bool {
        if is_ignored(name) {
            return false;
        }
        if self.state.category_of(name).is_some() {
            return false;
        }

        {
            let mut inner = self.lock();
            if !inner.running || inner.in_flight.contains(name) {
                return false;
            }
            inner.fifo.push_back(name.to_string());
            inner.in_flight.insert(name.to_string());
        }
        self.available.notify_one();
        debug!("enqueued '{name}' for classification");
        true
    }

    /// Block until work is available or shutdown is requested, debounce,
    /// then drain the entire FIFO. Returns `None` once the queue has been
    /// shut down and emptied.
    ///
    /// The debounce sleep runs with the lock released so a burst of
    /// releases (a multi-file copy) coalesces into one batch and writers
    /// get time to flush before the classifier reads the bytes.
    pub fn next_batch(&self, debounce: Duration) -> Option<Vec<String>> {
        let mut inner = self.lock();
        while inner.fifo.is_empty() && inner.running {
            inner = self
                .available
                .wait(inner)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if inner.fifo.is_empty() {
            return None;
        }

        if inner.running {
            drop(inner);
            std::thread::sleep(debounce);
            inner = self.lock();
        }

        // In-flight markers stay set until finish_batch so re-enqueues
        // during the RPC are silently dropped.
        Some(inner.fifo.drain(..).collect())
    }

    /// Clear the in-flight markers for a completed batch, whether or not
    /// any verdicts came back.
    pub fn finish_batch(&self, batch: &[String]) {
        let mut inner = self.lock();
        for name in batch {
            inner.in_flight.remove(name);
        }
    }

    /// Ask the worker to exit. Wakes it even if the queue is empty; a
    /// non-empty queue is drained into one final batch first.
    pub fn shutdown(&self) {
        self.lock().running = false;
        self.available.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Number of names currently awaiting a batch.
    pub fn len(&self) -> usize {
        self.lock().fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().fifo.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
