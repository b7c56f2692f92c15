//! Spaced-Repetition Scheduler
//!
//! Owns one [`ReviewState`] per mastered skill, decides which skills are due,
//! and flags skills that went unreviewed for too long as rusty.
//!
//! The scheduler is plain single-threaded state. Share it behind a lock if
//! more than one task needs it.

mod persist;
pub mod policy;
mod review;

pub use persist::{bootstrap_from_mastery, decode_reviews, encode_reviews, ReviewRecord};
pub use policy::{
    GRADUATED_INTERVAL_DAYS, GRADUATION_THRESHOLD, REVIEW_INTERVALS_DAYS, RUSTY_GRACE_FRACTION,
};
pub use review::{ReviewState, ReviewStatus};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::mastery::{EventAppender, MasteryService};
use crate::types::{triggers, MasteryState, MasteryTransition, MasteryTransitionEvent, Snapshot};

/// Snapshot key holding the serialized review states
pub const SPACED_REPETITION_KEY: &str = "spaced_repetition";

/// Snapshot key holding the mastery records
pub const MASTERY_KEY: &str = "mastery";

pub struct Scheduler {
    reviews: BTreeMap<String, ReviewState>,
    mastery: Arc<dyn MasteryService>,
    events: Arc<dyn EventAppender>,
    session_id: Option<String>,
}

impl Scheduler {
    /// Rebuild the scheduler from the latest snapshot.
    ///
    /// Review states come from the `spaced_repetition` section when present.
    /// Older snapshots that only carry `mastery` are upgraded by bootstrapping
    /// every mastered skill. No snapshot means an empty scheduler.
    pub fn new(
        snapshot: Option<&Snapshot>,
        mastery: Arc<dyn MasteryService>,
        events: Arc<dyn EventAppender>,
    ) -> Self {
        let reviews = match snapshot {
            Some(snapshot) => Self::restore(snapshot),
            None => BTreeMap::new(),
        };

        Self {
            reviews,
            mastery,
            events,
            session_id: None,
        }
    }

    fn restore(snapshot: &Snapshot) -> BTreeMap<String, ReviewState> {
        fn section<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
            data.get(key).filter(|v| !v.is_null())
        }

        if let Some(spaced) = section(&snapshot.data, SPACED_REPETITION_KEY) {
            let reviews = decode_reviews(spaced);
            tracing::info!(
                sequence = snapshot.sequence,
                count = reviews.len(),
                "restored review states"
            );
            reviews
        } else if let Some(mastery) = section(&snapshot.data, MASTERY_KEY) {
            let reviews = bootstrap_from_mastery(mastery);
            tracing::info!(
                sequence = snapshot.sequence,
                count = reviews.len(),
                "bootstrapped review states from mastery history"
            );
            reviews
        } else {
            BTreeMap::new()
        }
    }

    /// Tag audit events written by this scheduler with a session id
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Start tracking a skill that just became mastered.
    ///
    /// A skill that is already tracked is started over.
    pub fn init_skill(&mut self, skill_id: &str, mastered_at: DateTime<Utc>) {
        self.reviews
            .insert(skill_id.to_string(), ReviewState::new(skill_id, mastered_at));
        tracing::debug!(skill_id, "tracking skill for review");
    }

    /// Restart a skill that recovered from rusty; all progress is discarded
    pub fn reinit_skill(&mut self, skill_id: &str, now: DateTime<Utc>) {
        self.reviews
            .insert(skill_id.to_string(), ReviewState::new(skill_id, now));
        tracing::debug!(skill_id, "review progress reset after recovery");
    }

    /// Apply a review outcome. Untracked skills are ignored.
    pub fn record_review(&mut self, skill_id: &str, correct: bool, now: DateTime<Utc>) {
        let Some(state) = self.reviews.get_mut(skill_id) else {
            return;
        };

        if correct {
            state.record_correct(now);
        } else {
            state.record_incorrect(now);
        }

        tracing::debug!(
            skill_id,
            correct,
            stage = state.stage,
            hits = state.consecutive_hits,
            graduated = state.graduated,
            "recorded review"
        );
    }

    /// Mark every mastered skill that is past its grace period as rusty.
    ///
    /// Each applied transition gets a `time-decay` audit event. A failed
    /// audit append is logged and does not stop the sweep.
    pub fn run_decay_check(&self, now: DateTime<Utc>) -> Vec<MasteryTransition> {
        let mut applied = Vec::new();

        for (skill_id, state) in &self.reviews {
            let info = self.mastery.mastery(skill_id);
            if info.state != MasteryState::Mastered || !state.is_rusty_threshold(now) {
                continue;
            }

            let Some(transition) = self.mastery.mark_rusty(skill_id) else {
                continue;
            };

            let event = MasteryTransitionEvent {
                skill_id: skill_id.clone(),
                from_state: transition.from,
                to_state: transition.to,
                trigger: triggers::TIME_DECAY.to_string(),
                fluency_score: info.fluency_score,
                session_id: self.session_id.clone(),
            };
            if let Err(e) = self.events.append_transition(event) {
                tracing::warn!(skill_id = %skill_id, error = %e, "failed to record decay transition");
            }

            tracing::info!(
                skill_id = %skill_id,
                overdue_days = state.overdue_days(now),
                "skill decayed to rusty"
            );
            applied.push(transition);
        }

        applied
    }

    /// Mastered skills that are due, most overdue first, ties by skill id
    pub fn due_skills(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut due: Vec<(&String, f64)> = self
            .reviews
            .iter()
            .filter(|(_, state)| state.is_due(now))
            .filter(|(skill_id, _)| self.mastery.mastery(skill_id).state == MasteryState::Mastered)
            .map(|(skill_id, state)| (skill_id, state.overdue_days(now)))
            .collect();

        due.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        due.into_iter().map(|(skill_id, _)| skill_id.clone()).collect()
    }

    pub fn review_state(&self, skill_id: &str) -> Option<&ReviewState> {
        self.reviews.get(skill_id)
    }

    pub fn all_review_states(&self) -> &BTreeMap<String, ReviewState> {
        &self.reviews
    }

    /// Number of tracked skills
    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    /// Serializable `spaced_repetition` section for the next snapshot
    pub fn snapshot_data(&self) -> Value {
        encode_reviews(&self.reviews)
    }
}
