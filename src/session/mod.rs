//! Learner session
//!
//! Wires the durable store to the in-memory services for one learner visit:
//!
//! ```text
//! open ──► latest snapshot ──► MasteryLedger + Scheduler
//! start ─► decay sweep
//! record_answer / skill_mastered / skill_recovered / award_gem ─► events
//! finish ─► checkpoint (mastery + spaced_repetition + carried sections)
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::event_store::{EventLog, ProgressStore, StoreResult};
use crate::mastery::{MasteryLedger, MasteryService};
use crate::scheduler::{Scheduler, MASTERY_KEY};
use crate::types::{
    triggers, GemAward, GemAwardEvent, LearnerState, MasteryState, MasteryTransition,
    MasteryTransitionEvent, ReviewAnswerEvent, Snapshot,
};

/// Running answer counts for the current session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SessionStats {
    pub answered: u32,
    pub correct: u32,
    /// Consecutive correct answers ending at the latest answer
    pub streak: u32,
    pub best_streak: u32,
}

impl SessionStats {
    fn record(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
    }

    /// Fraction of correct answers, 0.0 before the first answer
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.answered)
        }
    }
}

pub struct LearnerSession {
    id: String,
    store: Arc<ProgressStore>,
    ledger: Arc<MasteryLedger>,
    scheduler: Scheduler,
    /// Snapshot sections owned by other components, written back unchanged
    carried: Map<String, Value>,
    stats: SessionStats,
}

impl LearnerSession {
    /// Restore learner state from the latest snapshot, or start empty
    pub fn open(store: Arc<ProgressStore>, session_id: impl Into<String>) -> StoreResult<Self> {
        let id = session_id.into();
        let snapshot = store.latest_snapshot()?;

        let (ledger, carried) = match &snapshot {
            Some(snapshot) => restore_sections(snapshot),
            None => (MasteryLedger::new(), Map::new()),
        };
        let ledger = Arc::new(ledger);

        let events: Arc<EventLog> = Arc::clone(store.events());
        let scheduler =
            Scheduler::new(snapshot.as_ref(), ledger.clone(), events).with_session(id.clone());

        tracing::info!(
            session_id = %id,
            snapshot = snapshot.as_ref().map(|s| s.sequence),
            skills = ledger.len(),
            tracked = scheduler.len(),
            "opened learner session"
        );

        Ok(Self {
            id,
            store,
            ledger,
            scheduler,
            carried,
            stats: SessionStats::default(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    pub fn ledger(&self) -> &Arc<MasteryLedger> {
        &self.ledger
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Run the decay sweep at session start
    pub fn start(&self, now: DateTime<Utc>) -> Vec<MasteryTransition> {
        self.scheduler.run_decay_check(now)
    }

    /// Skills to review now, most overdue first
    pub fn due_skills(&self, now: DateTime<Utc>) -> Vec<String> {
        self.scheduler.due_skills(now)
    }

    /// Log an answer and apply it as a review.
    ///
    /// The answer is durable before the review state changes; if the append
    /// fails the review is not applied.
    pub fn record_answer(
        &mut self,
        skill_id: &str,
        correct: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let event = ReviewAnswerEvent {
            skill_id: skill_id.to_string(),
            correct,
            session_id: Some(self.id.clone()),
        };
        let sequence = self.store.events().append_at(event, now)?.sequence;

        self.scheduler.record_review(skill_id, correct, now);
        self.stats.record(correct);
        Ok(sequence)
    }

    /// A skill was classified as mastered: update the ledger, audit it and
    /// start its review schedule.
    ///
    /// A skill that is already mastered keeps its schedule and `None` is
    /// returned. A rusty skill is handled as a recovery.
    pub fn skill_mastered(
        &mut self,
        skill_id: &str,
        at: DateTime<Utc>,
        fluency_score: f64,
    ) -> StoreResult<Option<MasteryTransition>> {
        match self.ledger.mastery(skill_id).state {
            MasteryState::Mastered => {
                tracing::debug!(skill_id, "skill already mastered");
                return Ok(None);
            }
            MasteryState::Rusty => return self.skill_recovered(skill_id, at),
            MasteryState::New | MasteryState::Learning => {}
        }

        let transition = self.ledger.set_mastered(skill_id, at, fluency_score);
        self.append_transition(&transition, triggers::PRACTICE, at)?;
        self.scheduler.init_skill(skill_id, at);
        Ok(Some(transition))
    }

    /// A rusty skill was practised back to mastery. Its review schedule
    /// starts over. Returns `None` if the skill was not rusty.
    pub fn skill_recovered(
        &mut self,
        skill_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<MasteryTransition>> {
        let info = self.ledger.mastery(skill_id);
        if info.state != MasteryState::Rusty {
            return Ok(None);
        }

        let transition = self.ledger.set_mastered(skill_id, now, info.fluency_score);
        self.append_transition(&transition, triggers::RECOVERY, now)?;
        self.scheduler.reinit_skill(skill_id, now);
        Ok(Some(transition))
    }

    /// Record a gem award
    pub fn award_gem(&self, award: GemAward) -> StoreResult<u64> {
        let rarity = award.rarity;
        let envelope = self.store.events().append(GemAwardEvent {
            award,
            session_id: Some(self.id.clone()),
        })?;
        tracing::info!(session_id = %self.id, %rarity, "awarded gem");
        Ok(envelope.sequence)
    }

    /// Snapshot data for the current state
    pub fn learner_state(&self) -> LearnerState {
        LearnerState {
            mastery: Some(self.ledger.to_value()),
            spaced_repetition: Some(self.scheduler.snapshot_data()),
            other: self.carried.clone(),
        }
    }

    /// Write a checkpoint of the session's state
    pub fn finish(&self) -> StoreResult<Snapshot> {
        let snapshot = self.store.checkpoint(self.learner_state().to_value()?)?;
        tracing::info!(
            session_id = %self.id,
            sequence = snapshot.sequence,
            answered = self.stats.answered,
            accuracy = self.stats.accuracy(),
            "session checkpointed"
        );
        Ok(snapshot)
    }

    fn append_transition(
        &self,
        transition: &MasteryTransition,
        trigger: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let event = MasteryTransitionEvent {
            skill_id: transition.skill_id.clone(),
            from_state: transition.from,
            to_state: transition.to,
            trigger: trigger.to_string(),
            fluency_score: transition.fluency_score,
            session_id: Some(self.id.clone()),
        };
        Ok(self.store.events().append_at(event, at)?.sequence)
    }
}

/// Split a snapshot into the mastery ledger and the sections nobody here owns
fn restore_sections(snapshot: &Snapshot) -> (MasteryLedger, Map<String, Value>) {
    match snapshot.learner_state() {
        Ok(state) => {
            let ledger = state
                .mastery
                .as_ref()
                .map(MasteryLedger::from_value)
                .unwrap_or_default();
            (ledger, state.other)
        }
        Err(e) => {
            tracing::warn!(
                sequence = snapshot.sequence,
                error = %e,
                "snapshot data is not a learner state document"
            );
            let ledger = snapshot
                .data
                .get(MASTERY_KEY)
                .map(MasteryLedger::from_value)
                .unwrap_or_default();
            (ledger, Map::new())
        }
    }
}
