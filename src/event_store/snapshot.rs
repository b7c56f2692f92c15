//! Snapshot Store
//!
//! Snapshots are point-in-time captures of learner state that allow a fast
//! restore without replaying every event. Each snapshot is its own file,
//! written once and never modified; old ones are only ever pruned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::Snapshot;
use crate::utils::{atomic_create, cleanup_temp_files};

use super::error::{StoreError, StoreResult};

const FILE_PREFIX: &str = "snapshot-";
const FILE_EXTENSION: &str = "json";

/// Location and identity of a stored snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMeta {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

/// A snapshot file whose header could not be read
struct Unreadable {
    /// Sequence encoded in the file name, if it parses
    sequence: Option<u64>,
    path: PathBuf,
    reason: String,
}

#[derive(Deserialize)]
struct SnapshotHeader {
    sequence: u64,
    timestamp: DateTime<Utc>,
}

/// Directory of immutable snapshot files
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open the store, creating the directory and clearing interrupted writes
    pub fn open<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let cleaned = cleanup_temp_files(&dir)?;
        if cleaned > 0 {
            tracing::warn!(count = cleaned, "removed interrupted snapshot writes");
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, sequence: u64) -> PathBuf {
        self.dir
            .join(format!("{}{:020}.{}", FILE_PREFIX, sequence, FILE_EXTENSION))
    }

    /// Persist a snapshot. Fails if one with the same sequence already exists.
    pub fn save(&self, snapshot: &Snapshot) -> StoreResult<()> {
        let path = self.path_for(snapshot.sequence);
        let json = serde_json::to_string(snapshot)?;

        match atomic_create(&path, &json) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StoreError::SnapshotExists {
                    sequence: snapshot.sequence,
                })
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            sequence = snapshot.sequence,
            timestamp = %snapshot.timestamp,
            "saved snapshot"
        );
        Ok(())
    }

    /// Readable snapshots plus the files whose header could not be read
    fn scan(&self) -> StoreResult<(Vec<SnapshotMeta>, Vec<Unreadable>)> {
        let mut metas = Vec::new();
        let mut unreadable = Vec::new();
        if !self.dir.exists() {
            return Ok((metas, unreadable));
        }

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !is_snapshot_file(&path) {
                continue;
            }

            let header = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|c| {
                    serde_json::from_str::<SnapshotHeader>(&c).map_err(|e| e.to_string())
                });
            match header {
                Ok(header) => metas.push(SnapshotMeta {
                    sequence: header.sequence,
                    timestamp: header.timestamp,
                    path,
                }),
                Err(reason) => unreadable.push(Unreadable {
                    sequence: sequence_from_name(&path),
                    path,
                    reason,
                }),
            }
        }

        metas.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok((metas, unreadable))
    }

    /// Readable snapshots, newest first (by timestamp, then sequence).
    ///
    /// Files that cannot be read are logged and left out.
    pub fn list(&self) -> StoreResult<Vec<SnapshotMeta>> {
        let (metas, unreadable) = self.scan()?;
        for file in &unreadable {
            tracing::warn!(
                path = %file.path.display(),
                reason = %file.reason,
                "skipping unreadable snapshot"
            );
        }
        Ok(metas)
    }

    /// Number of readable snapshots
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.list()?.len())
    }

    /// The most recent snapshot.
    ///
    /// `Ok(None)` means no snapshot has been written yet, which is a normal
    /// first run. An unreadable older snapshot is skipped, but if the file with
    /// the highest sequence cannot be read that is an error: restoring from
    /// an older one would silently lose progress.
    pub fn latest(&self) -> StoreResult<Option<Snapshot>> {
        let (metas, unreadable) = self.scan()?;
        let newest_readable = metas.iter().map(|m| m.sequence).max();

        let blocking = unreadable
            .into_iter()
            .find(|f| match (f.sequence, newest_readable) {
                (_, None) => true,
                (Some(seq), Some(newest)) => seq > newest,
                (None, Some(_)) => false,
            });
        if let Some(file) = blocking {
            return Err(StoreError::SnapshotCorrupted {
                path: file.path,
                reason: file.reason,
            });
        }

        let Some(meta) = metas.into_iter().next() else {
            return Ok(None);
        };

        let content = fs::read_to_string(&meta.path)?;
        let snapshot =
            serde_json::from_str(&content).map_err(|e| StoreError::SnapshotCorrupted {
                path: meta.path.clone(),
                reason: e.to_string(),
            })?;
        Ok(Some(snapshot))
    }

    /// Delete old snapshots, keeping roughly the `keep` newest.
    ///
    /// The cutoff is the timestamp of the `keep`-th older snapshot (counting
    /// from zero, with `keep` floored at 1); every snapshot at or before it is
    /// removed. When no such older snapshot exists nothing is deleted, and the
    /// newest snapshot is never deleted. Returns the number removed.
    pub fn prune(&self, keep: usize) -> StoreResult<usize> {
        let metas = self.list()?;

        let Some(cutoff) = metas.get(keep.max(1)).map(|m| m.timestamp) else {
            return Ok(0);
        };

        let mut deleted = 0;
        for meta in metas.iter().skip(1) {
            if meta.timestamp <= cutoff {
                fs::remove_file(&meta.path)?;
                deleted += 1;
            }
        }

        if deleted > 0 {
            tracing::info!(deleted, keep, "pruned snapshots");
        }
        Ok(deleted)
    }
}

fn sequence_from_name(path: &Path) -> Option<u64> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(FILE_PREFIX)?
        .parse()
        .ok()
}

fn is_snapshot_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .map(|e| e == FILE_EXTENSION)
        .unwrap_or(false);
    let has_prefix = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(FILE_PREFIX))
        .unwrap_or(false);
    has_extension && has_prefix
}
