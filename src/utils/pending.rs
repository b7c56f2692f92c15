//! Single-slot pending result
//!
//! Holds at most one background result that a caller will pick up later
//! (for example content generated while the learner is busy with something
//! else).
//!
//! Overwrite contract: starting a new request with [`PendingResult::begin`]
//! always replaces the slot. Whatever was in it, finished but unconsumed or
//! still in flight, is discarded; the old producer's `send` returns `Err`.

use parking_lot::Mutex;
use tokio::sync::oneshot::{self, error::TryRecvError};

pub struct PendingResult<T> {
    slot: Mutex<Option<oneshot::Receiver<T>>>,
}

impl<T> PendingResult<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Start a new request, discarding any previous one.
    ///
    /// The returned sender is handed to the producer.
    pub fn begin(&self) -> oneshot::Sender<T> {
        let (tx, rx) = oneshot::channel();
        if self.slot.lock().replace(rx).is_some() {
            tracing::debug!("pending result replaced; previous result discarded");
        }
        tx
    }

    /// Whether a request is in flight or a result is waiting
    pub fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Take the result if it is ready.
    ///
    /// Returns `None` while the producer is still working. A producer that
    /// went away without sending empties the slot.
    pub fn try_take(&self) -> Option<T> {
        let mut slot = self.slot.lock();
        let rx = slot.as_mut()?;

        match rx.try_recv() {
            Ok(value) => {
                *slot = None;
                Some(value)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                *slot = None;
                None
            }
        }
    }

    /// Wait for the current request.
    ///
    /// Takes the request out of the slot; a `begin` issued while waiting
    /// starts an unrelated request.
    pub async fn wait(&self) -> Option<T> {
        let rx = self.slot.lock().take()?;
        rx.await.ok()
    }
}

impl<T> Default for PendingResult<T> {
    fn default() -> Self {
        Self::new()
    }
}
