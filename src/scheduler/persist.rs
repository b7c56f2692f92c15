//! Snapshot encoding for review states
//!
//! Shape of the `spaced_repetition` sub-document:
//!
//! ```text
//! { "reviews": { "<skill_id>": { "skill_id", "stage", "next_review_date",
//!                                "consecutive_hits", "graduated",
//!                                "last_review_date" } } }
//! ```
//!
//! Dates are RFC3339 strings at second precision. A bad date drops only the
//! entry it belongs to.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::mastery::parse_mastery_entries;
use crate::types::MasteryState;
use crate::utils::{format_rfc3339, parse_rfc3339};

use super::review::ReviewState;

/// Persisted form of a [`ReviewState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub skill_id: String,
    pub stage: u32,
    pub next_review_date: String,
    pub consecutive_hits: u32,
    pub graduated: bool,
    pub last_review_date: String,
}

impl From<&ReviewState> for ReviewRecord {
    fn from(state: &ReviewState) -> Self {
        Self {
            skill_id: state.skill_id.clone(),
            stage: state.stage,
            next_review_date: format_rfc3339(state.next_review_date),
            consecutive_hits: state.consecutive_hits,
            graduated: state.graduated,
            last_review_date: format_rfc3339(state.last_review_date),
        }
    }
}

impl ReviewRecord {
    /// Convert back, or `None` if either date does not parse
    pub fn into_state(self, skill_id: &str) -> Option<ReviewState> {
        let next_review_date = parse_rfc3339(&self.next_review_date)?;
        let last_review_date = parse_rfc3339(&self.last_review_date)?;

        Some(ReviewState {
            skill_id: skill_id.to_string(),
            stage: self.stage,
            next_review_date,
            consecutive_hits: self.consecutive_hits,
            graduated: self.graduated,
            last_review_date,
        })
    }
}

/// Encode all review states as a `spaced_repetition` sub-document
pub fn encode_reviews(reviews: &BTreeMap<String, ReviewState>) -> Value {
    let mut map = Map::with_capacity(reviews.len());
    for (skill_id, state) in reviews {
        // ReviewRecord only holds strings, numbers and bools
        if let Ok(value) = serde_json::to_value(ReviewRecord::from(state)) {
            map.insert(skill_id.clone(), value);
        }
    }
    json!({ "reviews": Value::Object(map) })
}

/// Decode a `spaced_repetition` sub-document, skipping unusable entries
pub fn decode_reviews(value: &Value) -> BTreeMap<String, ReviewState> {
    let mut reviews = BTreeMap::new();

    let Some(entries) = value.get("reviews").and_then(Value::as_object) else {
        return reviews;
    };

    for (skill_id, entry) in entries {
        let record: ReviewRecord = match serde_json::from_value(entry.clone()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(skill_id = %skill_id, error = %e, "skipping malformed review entry");
                continue;
            }
        };

        match record.into_state(skill_id) {
            Some(state) => {
                reviews.insert(skill_id.clone(), state);
            }
            None => {
                tracing::warn!(skill_id = %skill_id, "skipping review entry with invalid timestamp");
            }
        }
    }

    reviews
}

/// Build review states for skills a pre-spaced-repetition snapshot marks as
/// mastered.
///
/// Skills in any other state, or without a usable `mastered_at`, are skipped.
pub fn bootstrap_from_mastery(mastery: &Value) -> BTreeMap<String, ReviewState> {
    parse_mastery_entries(mastery)
        .into_iter()
        .filter(|(_, record)| record.state == MasteryState::Mastered)
        .filter_map(|(skill_id, record)| {
            let mastered_at: DateTime<Utc> = record.mastered_at?;
            let state = ReviewState::new(skill_id.clone(), mastered_at);
            Some((skill_id, state))
        })
        .collect()
}
