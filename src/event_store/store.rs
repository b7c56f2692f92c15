//! Progress Store - the durable side of the engine
//!
//! Bundles the sequencer, the event log and the snapshot store that share one
//! data directory and one sequence.

use std::sync::Arc;

use serde_json::Value;

use crate::types::{RawEnvelope, Snapshot};

use super::config::StoreConfig;
use super::error::StoreResult;
use super::log::EventLog;
use super::sequencer::Sequencer;
use super::snapshot::SnapshotStore;

pub struct ProgressStore {
    config: StoreConfig,
    sequencer: Arc<Sequencer>,
    events: Arc<EventLog>,
    snapshots: SnapshotStore,
}

impl ProgressStore {
    /// Open (or create) the store under `config.data_dir`
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(config.data_dir())?;

        let sequencer = Arc::new(Sequencer::open(config.sequence_path())?);
        let events = Arc::new(EventLog::new(config.events_dir(), Arc::clone(&sequencer)));
        let snapshots = SnapshotStore::open(config.snapshots_dir())?;

        tracing::info!(
            data_dir = %config.data_dir().display(),
            next_sequence = sequencer.peek(),
            "opened progress store"
        );

        Ok(Self {
            config,
            sequencer,
            events,
            snapshots,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Most recent snapshot, `None` on first run
    pub fn latest_snapshot(&self) -> StoreResult<Option<Snapshot>> {
        self.snapshots.latest()
    }

    /// Write a new sequence-stamped snapshot of `data`, then apply retention.
    ///
    /// Once the snapshot is saved the checkpoint has succeeded; a failed prune
    /// is logged and retried by the next checkpoint.
    pub fn checkpoint(&self, data: Value) -> StoreResult<Snapshot> {
        let sequence = self.sequencer.next()?;
        let snapshot = Snapshot::new(sequence, data);

        self.snapshots.save(&snapshot)?;
        if let Err(e) = self.snapshots.prune(self.config.snapshot_retention) {
            tracing::warn!(sequence, error = %e, "snapshot retention failed");
        }

        Ok(snapshot)
    }

    /// Events recorded after the latest snapshot, across all streams
    pub fn events_since_snapshot(&self) -> StoreResult<Vec<RawEnvelope>> {
        let after = self
            .snapshots
            .list()?
            .first()
            .map(|m| m.sequence)
            .unwrap_or(0);
        self.events.load_all_after(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReviewAnswerEvent;
    use serde_json::json;
    use tempfile::TempDir;

    fn answer(skill: &str) -> ReviewAnswerEvent {
        ReviewAnswerEvent {
            skill_id: skill.to_string(),
            correct: true,
            session_id: None,
        }
    }

    #[test]
    fn test_checkpoint_shares_sequence_with_events() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProgressStore::open(StoreConfig::new(temp_dir.path())).unwrap();

        store.events().append(answer("a")).unwrap();
        let snapshot = store.checkpoint(json!({"k": 1})).unwrap();
        store.events().append(answer("b")).unwrap();

        assert_eq!(snapshot.sequence, 2);

        let since = store.events_since_snapshot().unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].sequence, 3);
        assert_eq!(since[0].payload["skill_id"], "b");
    }

    #[test]
    fn test_checkpoint_applies_retention() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig::new(temp_dir.path()).with_retention(2);
        let store = ProgressStore::open(config).unwrap();

        for i in 0..4 {
            store.checkpoint(json!({ "i": i })).unwrap();
            // Distinct timestamps keep the retention cutoff exact
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        assert_eq!(store.snapshots().count().unwrap(), 2);
        assert_eq!(store.latest_snapshot().unwrap().unwrap().data["i"], 3);
    }

    #[test]
    fn test_checkpoint_survives_unreadable_old_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = ProgressStore::open(StoreConfig::new(temp_dir.path())).unwrap();

        let first = store.checkpoint(json!({"round": 1})).unwrap();
        store.checkpoint(json!({"round": 2})).unwrap();
        let first_path = store
            .snapshots()
            .list()
            .unwrap()
            .into_iter()
            .find(|m| m.sequence == first.sequence)
            .unwrap()
            .path;
        std::fs::write(&first_path, "not json").unwrap();

        let third = store.checkpoint(json!({"round": 3})).unwrap();
        assert_eq!(third.sequence, 3);

        let latest = store.latest_snapshot().unwrap().unwrap();
        assert_eq!(latest.sequence, 3);
        assert_eq!(latest.data["round"], 3);
        assert_eq!(store.snapshots().count().unwrap(), 2);
    }

    #[test]
    fn test_reopen_continues_sequence() {
        let temp_dir = TempDir::new().unwrap();
        {
            let store = ProgressStore::open(StoreConfig::new(temp_dir.path())).unwrap();
            store.checkpoint(json!({})).unwrap();
            store.events().append(answer("a")).unwrap();
        }

        let store = ProgressStore::open(StoreConfig::new(temp_dir.path())).unwrap();
        assert_eq!(store.sequencer().peek(), 3);
        assert_eq!(store.latest_snapshot().unwrap().unwrap().sequence, 1);
    }
}
