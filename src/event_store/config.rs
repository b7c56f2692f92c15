//! Storage configuration
//!
//! Every on-disk path is derived from a single data directory:
//!
//! ```text
//! <data_dir>/
//!   sequence                       next sequence value
//!   events/<stream>.jsonl          one envelope per line
//!   snapshots/snapshot-<seq>.json  one immutable snapshot per file
//! ```

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PROGRESS_DATA_DIR";

/// Environment variable overriding the number of snapshots kept
pub const SNAPSHOT_RETENTION_ENV: &str = "PROGRESS_SNAPSHOT_RETENTION";

const DEFAULT_SNAPSHOT_RETENTION: usize = 10;

/// Configuration for the progress store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Root of all persisted files
    pub data_dir: PathBuf,
    /// Snapshots kept after each checkpoint
    pub snapshot_retention: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            snapshot_retention: DEFAULT_SNAPSHOT_RETENTION,
        }
    }
}

impl StoreConfig {
    /// Create config with custom data directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Read `PROGRESS_DATA_DIR` and `PROGRESS_SNAPSHOT_RETENTION`, falling back
    /// to defaults for anything unset or unparseable
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(raw) = env::var(SNAPSHOT_RETENTION_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(keep) => config.snapshot_retention = keep,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {}",
                    SNAPSHOT_RETENTION_ENV
                ),
            }
        }

        config
    }

    /// Set the number of snapshots kept after each checkpoint
    pub fn with_retention(mut self, keep: usize) -> Self {
        self.snapshot_retention = keep;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the persisted sequence counter
    pub fn sequence_path(&self) -> PathBuf {
        self.data_dir.join("sequence")
    }

    /// Directory holding one JSONL file per event stream
    pub fn events_dir(&self) -> PathBuf {
        self.data_dir.join("events")
    }

    /// Directory holding snapshot files
    pub fn snapshots_dir(&self) -> PathBuf {
        self.data_dir.join("snapshots")
    }
}
