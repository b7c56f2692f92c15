//! Mastery collaborator
//!
//! The scheduler reads mastery states and asks for `Mastered → Rusty`
//! transitions through [`MasteryService`], and records audit events through
//! [`EventAppender`]. Both are traits so the session layer (or a test) can
//! supply its own implementation.

mod ledger;

pub use ledger::{parse_mastery_entries, MasteryLedger};

use crate::event_store::{EventLog, StoreResult};
use crate::types::{MasteryInfo, MasteryTransition, MasteryTransitionEvent};

/// Source of truth for per-skill mastery classification
pub trait MasteryService: Send + Sync {
    /// Current mastery of a skill; unknown skills report `New`
    fn mastery(&self, skill_id: &str) -> MasteryInfo;

    /// Move a skill from `Mastered` to `Rusty`.
    ///
    /// Returns `None` when the skill was not `Mastered`.
    fn mark_rusty(&self, skill_id: &str) -> Option<MasteryTransition>;
}

/// Sink for mastery transition audit records
pub trait EventAppender: Send + Sync {
    /// Append one audit record, returning its sequence number
    fn append_transition(&self, event: MasteryTransitionEvent) -> StoreResult<u64>;
}

impl EventAppender for EventLog {
    fn append_transition(&self, event: MasteryTransitionEvent) -> StoreResult<u64> {
        Ok(self.append(event)?.sequence)
    }
}
