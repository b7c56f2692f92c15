//! Snapshot records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Immutable point-in-time capture of learner state.
///
/// `sequence` comes from the shared sequencer, so every event with a larger
/// sequence happened after this snapshot regardless of its stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl Snapshot {
    /// Create a snapshot taken now
    pub fn new(sequence: u64, data: Value) -> Self {
        Self::with_timestamp(sequence, Utc::now(), data)
    }

    /// Create a snapshot with an explicit timestamp
    pub fn with_timestamp(sequence: u64, timestamp: DateTime<Utc>, data: Value) -> Self {
        Self {
            sequence,
            timestamp,
            data,
        }
    }

    /// Decode the data blob as a learner state document
    pub fn learner_state(&self) -> Result<LearnerState, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}

/// Top-level shape of `Snapshot::data`.
///
/// Sub-documents this crate does not own are carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LearnerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spaced_repetition: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl LearnerState {
    /// Encode as a snapshot data blob
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_learner_state_preserves_unknown_sections() {
        let data = json!({
            "mastery": {"add-1": {"state": "mastered"}},
            "streak": {"current": 4}
        });
        let snapshot = Snapshot::new(7, data);

        let state = snapshot.learner_state().unwrap();
        assert!(state.mastery.is_some());
        assert!(state.spaced_repetition.is_none());
        assert_eq!(state.other["streak"]["current"], 4);

        let back = state.to_value().unwrap();
        assert_eq!(back["streak"]["current"], 4);
        assert!(back.get("spaced_repetition").is_none());
    }
}
