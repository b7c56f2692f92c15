//! Global sequence counter
//!
//! One monotonic counter shared by every event stream and by snapshots.
//! The next value is persisted before a number is handed out, so a crash can
//! leave a gap but never a duplicate.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::utils::atomic_write;

use super::error::{StoreError, StoreResult};

/// Durable, thread-safe sequence counter
#[derive(Debug)]
pub struct Sequencer {
    path: PathBuf,
    /// Next value to issue; always equal to what is on disk
    next: Mutex<u64>,
}

impl Sequencer {
    /// Open the counter stored at `path`.
    ///
    /// A missing file starts the sequence at 1.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let next = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match content.trim().parse::<u64>() {
                Ok(value) if value >= 1 => value,
                _ => {
                    return Err(StoreError::CorruptCounter {
                        path,
                        content,
                    })
                }
            }
        } else {
            1
        };

        Ok(Self {
            path,
            next: Mutex::new(next),
        })
    }

    /// Issue the next sequence number.
    ///
    /// The incremented value is written to disk while the lock is held; if
    /// that write fails the call fails and the counter does not move.
    pub fn next(&self) -> StoreResult<u64> {
        let mut next = self.next.lock();
        let value = *next;

        atomic_write(&self.path, &(value + 1).to_string())?;
        *next = value + 1;

        tracing::debug!(sequence = value, "issued sequence");
        Ok(value)
    }

    /// The value the next call to [`Sequencer::next`] will return
    pub fn peek(&self) -> u64 {
        *self.next.lock()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
