//! Event types for the append-only event log
//!
//! Every domain fact is recorded as an [`Envelope`] around a typed payload.
//! The envelope carries the sequence number issued by the shared sequencer
//! and the time the event was recorded, so records from different streams
//! can be merged into one total order.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{GemAward, MasteryState};

/// A payload that can be appended to an event stream
pub trait EventPayload: Serialize + DeserializeOwned {
    /// Name of the stream this payload type is stored in
    const STREAM: &'static str;
}

/// A sequenced, timestamped event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Value issued by the sequencer; unique across all streams
    pub sequence: u64,

    /// When the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Event-specific payload
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(sequence: u64, timestamp: DateTime<Utc>, payload: T) -> Self {
        Self {
            sequence,
            timestamp,
            payload,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    /// Serialize event to JSON string (for JSONL)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Deserialize event from JSON string
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// An envelope read without knowing its payload type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Stream the record was read from
    #[serde(default)]
    pub stream: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl RawEnvelope {
    /// Parse the payload as a specific type
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Audit record of a mastery state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryTransitionEvent {
    pub skill_id: String,
    pub from_state: MasteryState,
    pub to_state: MasteryState,
    pub trigger: String,
    pub fluency_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EventPayload for MasteryTransitionEvent {
    const STREAM: &'static str = "mastery_transitions";
}

/// An answer that counts as a spaced-repetition review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAnswerEvent {
    pub skill_id: String,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EventPayload for ReviewAnswerEvent {
    const STREAM: &'static str = "review_answers";
}

/// A gem granted to the learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GemAwardEvent {
    #[serde(flatten)]
    pub award: GemAward,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl EventPayload for GemAwardEvent {
    const STREAM: &'static str = "gem_awards";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GemReason, Rarity};
    use chrono::TimeZone;

    #[test]
    fn test_envelope_serialization() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let event = Envelope::new(
            3,
            ts,
            ReviewAnswerEvent {
                skill_id: "add-1".to_string(),
                correct: true,
                session_id: None,
            },
        );

        let json = event.to_json_line().unwrap();
        assert!(json.contains("\"sequence\":3"));
        assert!(json.contains("\"skill_id\":\"add-1\""));
        assert!(!json.contains("session_id"));

        let parsed: Envelope<ReviewAnswerEvent> = Envelope::from_json_line(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_raw_envelope_parses_payload() {
        let line = r#"{"sequence":9,"timestamp":"2025-01-01T12:00:00Z","payload":{"skill_id":"x","from_state":"mastered","to_state":"rusty","trigger":"time-decay","fluency_score":0.4}}"#;
        let raw: RawEnvelope = serde_json::from_str(line).unwrap();
        assert_eq!(raw.stream, "");

        let payload: MasteryTransitionEvent = raw.parse_payload().unwrap();
        assert_eq!(payload.from_state, MasteryState::Mastered);
        assert_eq!(payload.to_state, MasteryState::Rusty);
        assert_eq!(payload.trigger, "time-decay");
    }

    #[test]
    fn test_gem_award_event_is_flat() {
        let event = GemAwardEvent {
            award: GemAward {
                rarity: Rarity::Epic,
                reason: GemReason::Streak { length: 15 },
                skill_id: None,
            },
            session_id: Some("s-1".to_string()),
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["rarity"], "epic");
        assert_eq!(value["reason"]["kind"], "streak");
        assert_eq!(value["reason"]["length"], 15);
        assert_eq!(value["session_id"], "s-1");

        let back: GemAwardEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
