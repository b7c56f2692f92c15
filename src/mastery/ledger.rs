//! In-memory mastery ledger
//!
//! Stores externally classified mastery states and round-trips them through
//! the `mastery` snapshot sub-document. It does not decide when a skill is
//! mastered; callers tell it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::types::{MasteryInfo, MasteryRecord, MasteryState, MasteryTransition};
use crate::utils::parse_rfc3339;

use super::MasteryService;

/// Parse a `mastery` sub-document entry by entry.
///
/// Entries without a recognisable `state` are skipped. A missing or malformed
/// `mastered_at` leaves the timestamp unset rather than dropping the entry.
pub fn parse_mastery_entries(value: &Value) -> Vec<(String, MasteryRecord)> {
    let Some(entries) = value.as_object() else {
        tracing::warn!("mastery section is not an object; ignoring it");
        return Vec::new();
    };

    let mut records = Vec::with_capacity(entries.len());
    for (skill_id, entry) in entries {
        let state = entry
            .get("state")
            .cloned()
            .and_then(|s| serde_json::from_value::<MasteryState>(s).ok());
        let Some(state) = state else {
            tracing::warn!(skill_id = %skill_id, "skipping mastery entry without a valid state");
            continue;
        };

        let mastered_at = entry
            .get("mastered_at")
            .and_then(Value::as_str)
            .and_then(parse_rfc3339);
        let fluency_score = entry
            .get("fluency_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);

        records.push((
            skill_id.clone(),
            MasteryRecord {
                state,
                mastered_at,
                fluency_score,
            },
        ));
    }
    records
}

/// Thread-safe map of skill id to mastery record
#[derive(Debug, Default)]
pub struct MasteryLedger {
    records: RwLock<BTreeMap<String, MasteryRecord>>,
}

impl MasteryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a `mastery` snapshot sub-document
    pub fn from_value(value: &Value) -> Self {
        Self::from_records(parse_mastery_entries(value))
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, MasteryRecord)>,
    {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Record of a single skill, if known
    pub fn record(&self, skill_id: &str) -> Option<MasteryRecord> {
        self.records.read().get(skill_id).cloned()
    }

    /// Number of skills with a record
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Record that a skill became mastered at `at`
    pub fn set_mastered(
        &self,
        skill_id: &str,
        at: DateTime<Utc>,
        fluency_score: f64,
    ) -> MasteryTransition {
        let mut records = self.records.write();
        let record = records.entry(skill_id.to_string()).or_default();
        let from = record.state;

        record.state = MasteryState::Mastered;
        record.mastered_at = Some(at);
        record.fluency_score = fluency_score;

        MasteryTransition {
            skill_id: skill_id.to_string(),
            from,
            to: MasteryState::Mastered,
            fluency_score,
        }
    }

    /// Overwrite the state of a skill. Returns `None` if nothing changed.
    pub fn set_state(&self, skill_id: &str, state: MasteryState) -> Option<MasteryTransition> {
        let mut records = self.records.write();
        let record = records.entry(skill_id.to_string()).or_default();
        if record.state == state {
            return None;
        }

        let from = record.state;
        record.state = state;
        Some(MasteryTransition {
            skill_id: skill_id.to_string(),
            from,
            to: state,
            fluency_score: record.fluency_score,
        })
    }

    /// Encode as a `mastery` snapshot sub-document
    pub fn to_value(&self) -> Value {
        let records = self.records.read();
        let mut map = Map::with_capacity(records.len());
        for (skill_id, record) in records.iter() {
            // MasteryRecord only holds plain data; serialization cannot fail
            if let Ok(value) = serde_json::to_value(record) {
                map.insert(skill_id.clone(), value);
            }
        }
        Value::Object(map)
    }
}

impl MasteryService for MasteryLedger {
    fn mastery(&self, skill_id: &str) -> MasteryInfo {
        self.records
            .read()
            .get(skill_id)
            .map(|r| MasteryInfo {
                state: r.state,
                fluency_score: r.fluency_score,
            })
            .unwrap_or_default()
    }

    fn mark_rusty(&self, skill_id: &str) -> Option<MasteryTransition> {
        let mut records = self.records.write();
        let record = records.get_mut(skill_id)?;
        if record.state != MasteryState::Mastered {
            return None;
        }

        record.state = MasteryState::Rusty;
        Some(MasteryTransition {
            skill_id: skill_id.to_string(),
            from: MasteryState::Mastered,
            to: MasteryState::Rusty,
            fluency_score: record.fluency_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_is_lenient_per_entry() {
        let value = json!({
            "add-1": {"state": "mastered", "mastered_at": "2025-01-01T12:00:00Z", "fluency_score": 0.9},
            "add-2": {"state": "mastered", "mastered_at": "last tuesday"},
            "add-3": {"state": "confused"},
            "add-4": {"fluency_score": 0.3},
            "add-5": {"state": "learning"}
        });

        let records: BTreeMap<_, _> = parse_mastery_entries(&value).into_iter().collect();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records["add-1"].mastered_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(records["add-1"].fluency_score, 0.9);
        assert_eq!(records["add-2"].state, MasteryState::Mastered);
        assert!(records["add-2"].mastered_at.is_none());
        assert_eq!(records["add-5"].state, MasteryState::Learning);
    }

    #[test]
    fn test_parse_non_object() {
        assert!(parse_mastery_entries(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_unknown_skill_is_new() {
        let ledger = MasteryLedger::new();
        assert_eq!(ledger.mastery("nope").state, MasteryState::New);
        assert!(ledger.mark_rusty("nope").is_none());
    }

    #[test]
    fn test_mark_rusty_only_from_mastered() {
        let ledger = MasteryLedger::new();
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        ledger.set_mastered("a", at, 0.7);
        ledger.set_state("b", MasteryState::Learning);

        let transition = ledger.mark_rusty("a").unwrap();
        assert_eq!(transition.from, MasteryState::Mastered);
        assert_eq!(transition.to, MasteryState::Rusty);
        assert_eq!(transition.fluency_score, 0.7);

        assert!(ledger.mark_rusty("a").is_none());
        assert!(ledger.mark_rusty("b").is_none());
        assert_eq!(ledger.mastery("a").state, MasteryState::Rusty);
    }

    #[test]
    fn test_set_state_reports_changes_only() {
        let ledger = MasteryLedger::new();
        let first = ledger.set_state("a", MasteryState::Learning).unwrap();
        assert_eq!(first.from, MasteryState::New);
        assert!(ledger.set_state("a", MasteryState::Learning).is_none());
    }

    #[test]
    fn test_value_round_trip() {
        let at = Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        let ledger = MasteryLedger::new();
        ledger.set_mastered("a", at, 0.5);
        ledger.set_state("b", MasteryState::Rusty);

        let restored = MasteryLedger::from_value(&ledger.to_value());
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.record("a"), ledger.record("a"));
        assert_eq!(restored.mastery("b").state, MasteryState::Rusty);
    }
}
