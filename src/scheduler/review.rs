//! Per-skill review state
//!
//! States: untracked (no `ReviewState`), active (`graduated == false`) and
//! graduated. `next_review_date` is only ever set as `last_review_date` plus
//! the current interval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::{days_to_duration, fractional_days};

use super::policy::{self, GRADUATED_INTERVAL_DAYS, GRADUATION_THRESHOLD, RUSTY_GRACE_FRACTION};

/// Review status as shown to the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    NotDue,
    Due,
    Overdue,
    Graduated,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::NotDue => write!(f, "not_due"),
            ReviewStatus::Due => write!(f, "due"),
            ReviewStatus::Overdue => write!(f, "overdue"),
            ReviewStatus::Graduated => write!(f, "graduated"),
        }
    }
}

/// Spaced-repetition progress of one skill
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub skill_id: String,
    pub stage: u32,
    pub next_review_date: DateTime<Utc>,
    pub consecutive_hits: u32,
    pub graduated: bool,
    pub last_review_date: DateTime<Utc>,
}

impl ReviewState {
    /// Fresh state for a skill mastered (or recovered) at `start`
    pub fn new(skill_id: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            skill_id: skill_id.into(),
            stage: 0,
            next_review_date: start + policy::interval(0, false),
            consecutive_hits: 0,
            graduated: false,
            last_review_date: start,
        }
    }

    /// Interval in effect, in days
    pub fn current_interval_days(&self) -> i64 {
        if self.graduated {
            GRADUATED_INTERVAL_DAYS
        } else {
            policy::interval_days(self.stage)
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_date
    }

    /// Fractional days past the review date; 0 when not due
    pub fn overdue_days(&self, now: DateTime<Utc>) -> f64 {
        if !self.is_due(now) {
            return 0.0;
        }
        fractional_days(now - self.next_review_date)
    }

    /// Whether the skill is overdue by more than half its current interval
    pub fn is_rusty_threshold(&self, now: DateTime<Utc>) -> bool {
        if !self.is_due(now) {
            return false;
        }
        let grace = days_to_duration(RUSTY_GRACE_FRACTION * self.current_interval_days() as f64);
        now > self.next_review_date + grace
    }

    /// Graduated skills that are due still report `Due` so they get surfaced
    pub fn status(&self, now: DateTime<Utc>) -> ReviewStatus {
        if self.is_rusty_threshold(now) {
            ReviewStatus::Overdue
        } else if self.is_due(now) {
            ReviewStatus::Due
        } else if self.graduated {
            ReviewStatus::Graduated
        } else {
            ReviewStatus::NotDue
        }
    }

    /// Whole days until the review; never 0 unless already due
    pub fn days_until_review(&self, now: DateTime<Utc>) -> i64 {
        if self.is_due(now) {
            return 0;
        }
        (self.next_review_date - now).num_hours() / 24 + 1
    }

    pub(crate) fn record_correct(&mut self, now: DateTime<Utc>) {
        self.consecutive_hits += 1;
        if !self.graduated {
            self.stage += 1;
            if self.consecutive_hits >= GRADUATION_THRESHOLD {
                self.graduated = true;
            }
        }
        self.last_review_date = now;
        self.next_review_date = now + policy::interval(self.stage, self.graduated);
    }

    /// A miss resets the streak but leaves the schedule alone, so the skill
    /// stays due until it is answered correctly
    pub(crate) fn record_incorrect(&mut self, now: DateTime<Utc>) {
        self.consecutive_hits = 0;
        self.last_review_date = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    fn state_at_stage(stage: u32, next: DateTime<Utc>) -> ReviewState {
        let interval = policy::interval(stage, false);
        ReviewState {
            skill_id: "s".to_string(),
            stage,
            next_review_date: next,
            consecutive_hits: stage,
            graduated: false,
            last_review_date: next - interval,
        }
    }

    #[test]
    fn test_new_state() {
        let state = ReviewState::new("add-1", t0());
        assert_eq!(state.stage, 0);
        assert_eq!(state.consecutive_hits, 0);
        assert!(!state.graduated);
        assert_eq!(state.last_review_date, t0());
        assert_eq!(state.next_review_date, t0() + Duration::days(1));
    }

    #[test]
    fn test_is_due_boundary() {
        let state = ReviewState::new("a", t0());
        let next = state.next_review_date;
        assert!(!state.is_due(next - Duration::seconds(1)));
        assert!(state.is_due(next));
    }

    #[test]
    fn test_overdue_days() {
        let state = ReviewState::new("a", t0());
        let next = state.next_review_date;
        assert_eq!(state.overdue_days(next - Duration::hours(5)), 0.0);
        assert_eq!(state.overdue_days(next + Duration::hours(36)), 1.5);
    }

    #[test]
    fn test_grace_period_at_stage_two() {
        let state = state_at_stage(2, t0());
        assert_eq!(state.current_interval_days(), 7);

        assert!(!state.is_rusty_threshold(t0() + Duration::days(2)));
        assert!(state.is_rusty_threshold(t0() + Duration::days(4)));
        // Exactly at the edge of the grace period is still fine
        assert!(!state.is_rusty_threshold(t0() + Duration::hours(84)));
        assert!(!state.is_rusty_threshold(t0() - Duration::days(1)));
    }

    #[test]
    fn test_status() {
        let state = state_at_stage(2, t0());
        assert_eq!(state.status(t0() - Duration::hours(1)), ReviewStatus::NotDue);
        assert_eq!(state.status(t0() + Duration::days(1)), ReviewStatus::Due);
        assert_eq!(state.status(t0() + Duration::days(4)), ReviewStatus::Overdue);
    }

    #[test]
    fn test_status_of_graduated_skill() {
        let mut state = state_at_stage(6, t0());
        state.graduated = true;

        assert_eq!(state.status(t0() - Duration::days(10)), ReviewStatus::Graduated);
        assert_eq!(state.status(t0() + Duration::days(1)), ReviewStatus::Due);
        // Graduated grace is 45 days
        assert_eq!(state.status(t0() + Duration::days(46)), ReviewStatus::Overdue);
    }

    #[test]
    fn test_days_until_review_rounds_up() {
        let state = ReviewState::new("a", t0());
        let next = state.next_review_date;

        assert_eq!(state.days_until_review(next), 0);
        assert_eq!(state.days_until_review(next + Duration::days(3)), 0);
        assert_eq!(state.days_until_review(next - Duration::minutes(30)), 1);
        assert_eq!(state.days_until_review(next - Duration::hours(23)), 1);
        assert_eq!(state.days_until_review(next - Duration::hours(49)), 3);
    }

    #[test]
    fn test_correct_review_advances_stage() {
        let mut state = ReviewState::new("a", t0());
        let now = t0() + Duration::days(1);
        state.record_correct(now);

        assert_eq!(state.stage, 1);
        assert_eq!(state.consecutive_hits, 1);
        assert_eq!(state.last_review_date, now);
        assert_eq!(state.next_review_date, now + Duration::days(3));
    }

    #[test]
    fn test_incorrect_review_keeps_schedule() {
        let mut state = ReviewState::new("a", t0());
        state.record_correct(t0() + Duration::days(1));
        state.record_correct(t0() + Duration::days(4));
        let next = state.next_review_date;

        let miss = t0() + Duration::days(12);
        state.record_incorrect(miss);

        assert_eq!(state.consecutive_hits, 0);
        assert_eq!(state.stage, 2);
        assert!(!state.graduated);
        assert_eq!(state.last_review_date, miss);
        assert_eq!(state.next_review_date, next);
    }

    #[test]
    fn test_graduation_after_threshold() {
        let mut state = ReviewState::new("a", t0());
        let mut now = t0();
        for _ in 0..GRADUATION_THRESHOLD - 1 {
            now += Duration::days(1);
            state.record_correct(now);
        }
        assert!(!state.graduated);
        assert_eq!(state.stage, 5);

        now += Duration::days(1);
        state.record_correct(now);
        assert!(state.graduated);
        assert_eq!(state.stage, 6);
        assert_eq!(state.next_review_date, now + Duration::days(GRADUATED_INTERVAL_DAYS));

        // Further hits no longer move the stage
        now += Duration::days(90);
        state.record_correct(now);
        assert_eq!(state.stage, 6);
        assert_eq!(state.consecutive_hits, 7);
        assert!(state.graduated);
    }

    #[test]
    fn test_miss_before_threshold_blocks_graduation() {
        let mut state = ReviewState::new("a", t0());
        let mut now = t0();
        for _ in 0..5 {
            now += Duration::days(1);
            state.record_correct(now);
        }
        now += Duration::days(1);
        state.record_incorrect(now);
        now += Duration::days(1);
        state.record_correct(now);

        assert_eq!(state.consecutive_hits, 1);
        assert!(!state.graduated);
    }
}
