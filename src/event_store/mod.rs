//! Event Store Module
//!
//! Durable storage for learner progress:
//! - `Sequencer`: one monotonic counter stamping every event and snapshot
//! - `EventLog`: append-only JSONL streams, one per payload type
//! - `SnapshotStore`: immutable point-in-time captures with retention pruning
//! - `ProgressStore`: the three above over one data directory
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//! ┌──────────┐    ┌───────────────┐    ┌──────────────────────┐
//! │ Session  │───►│ Sequencer     │───►│ events/<stream>.jsonl│
//! │ event    │    │ next()        │    │ (fsync per append)   │
//! └──────────┘    └───────────────┘    └──────────────────────┘
//!
//! Checkpoint (session end):
//! ┌──────────────┐    ┌───────────────┐    ┌──────────────────┐
//! │ LearnerState │───►│ snapshot-<seq>│───►│ prune(retention) │
//! └──────────────┘    └───────────────┘    └──────────────────┘
//!
//! Read Path (session start):
//! ┌────────────────┐    ┌────────────────────────────┐
//! │ latest snapshot│───►│ events with sequence > seq │
//! └────────────────┘    └────────────────────────────┘
//! ```

mod config;
mod error;
mod log;
mod sequencer;
mod snapshot;
mod store;

pub use config::{StoreConfig, DATA_DIR_ENV, SNAPSHOT_RETENTION_ENV};
pub use error::{StoreError, StoreResult};
pub use log::EventLog;
pub use sequencer::Sequencer;
pub use snapshot::{SnapshotMeta, SnapshotStore};
pub use store::ProgressStore;
