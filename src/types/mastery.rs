//! Mastery types consumed from the mastery collaborator

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mastery classification of a single skill.
///
/// The engine never computes this; it only reads it and asks the mastery
/// collaborator to move skills from `Mastered` to `Rusty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryState {
    #[default]
    New,
    Learning,
    Mastered,
    Rusty,
}

impl std::fmt::Display for MasteryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MasteryState::New => write!(f, "new"),
            MasteryState::Learning => write!(f, "learning"),
            MasteryState::Mastered => write!(f, "mastered"),
            MasteryState::Rusty => write!(f, "rusty"),
        }
    }
}

/// Current mastery of a skill as reported by the collaborator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MasteryInfo {
    pub state: MasteryState,
    pub fluency_score: f64,
}

/// A mastery state change that was actually applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasteryTransition {
    pub skill_id: String,
    pub from: MasteryState,
    pub to: MasteryState,
    pub fluency_score: f64,
}

/// Per-skill entry of the `mastery` snapshot sub-document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MasteryRecord {
    pub state: MasteryState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fluency_score: f64,
}

/// Trigger labels written into mastery transition audit events
pub mod triggers {
    /// Mastered skill went unreviewed past its grace period
    pub const TIME_DECAY: &str = "time-decay";
    /// Skill reached mastery through practice
    pub const PRACTICE: &str = "practice";
    /// Rusty skill was mastered again
    pub const RECOVERY: &str = "recovery";
}
