//! Storage errors

use std::path::PathBuf;

/// Errors raised by durable storage.
///
/// These are always propagated: swallowing one could reuse a sequence number
/// or lose a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt sequence counter at {path}: {content:?}")]
    CorruptCounter { path: PathBuf, content: String },

    #[error("snapshot {sequence} already exists")]
    SnapshotExists { sequence: u64 },

    #[error("snapshot corrupted at {path}: {reason}")]
    SnapshotCorrupted { path: PathBuf, reason: String },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
