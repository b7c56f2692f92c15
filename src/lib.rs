//! Progress Engine
//!
//! Learner progress persistence and spaced-repetition scheduling over a
//! skill prerequisite graph.
//!
//! # Features
//!
//! - **Shared sequencing**: one durable counter orders events across streams
//! - **Event streams**: append-only JSONL, one file per payload type
//! - **Snapshots**: immutable, never overwritten, pruned by retention
//! - **Spaced repetition**: fixed-interval ladder with graduation and decay
//! - **Gems**: rarity from skill depth, streak length and session accuracy
//!
//! # Modules
//!
//! - `types`: Event payloads, snapshots, mastery and gem types
//! - `event_store`: Sequencer, event log, snapshot store and configuration
//! - `mastery`: Mastery collaborator traits and the in-memory ledger
//! - `scheduler`: Review states, interval policy and the decay sweep
//! - `skill_graph`: Prerequisite DAG trait and an in-memory catalog
//! - `gems`: Skill depth index and rarity classifiers
//! - `session`: One learner visit, from restore to checkpoint
//! - `utils`: Atomic writes, timestamps and the single-slot pending result
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use progress_engine::{LearnerSession, ProgressStore, StoreConfig};
//!
//! fn main() -> Result<(), progress_engine::StoreError> {
//!     let store = Arc::new(ProgressStore::open(StoreConfig::from_env())?);
//!     let mut session = LearnerSession::open(store, "session-1")?;
//!
//!     let now = Utc::now();
//!     session.start(now);
//!     for skill in session.due_skills(now) {
//!         session.record_answer(&skill, true, now)?;
//!     }
//!     session.finish()?;
//!     Ok(())
//! }
//! ```

pub mod event_store;
pub mod gems;
pub mod mastery;
pub mod scheduler;
pub mod session;
pub mod skill_graph;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use event_store::{EventLog, ProgressStore, Sequencer, SnapshotStore, StoreConfig, StoreError};
pub use gems::{DepthMap, GemService};
pub use mastery::{EventAppender, MasteryLedger, MasteryService};
pub use scheduler::{ReviewState, ReviewStatus, Scheduler};
pub use session::{LearnerSession, SessionStats};
pub use skill_graph::{SkillCatalog, SkillDef, SkillGraph};
pub use types::{
    Envelope, GemAward, GemReason, LearnerState, MasteryState, MasteryTransition, Rarity,
    Snapshot,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
