//! Gem rarity and award records

use serde::{Deserialize, Serialize};

/// Four-tier rarity scale shared by every gem source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl std::fmt::Display for Rarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rarity::Common => write!(f, "common"),
            Rarity::Rare => write!(f, "rare"),
            Rarity::Epic => write!(f, "epic"),
            Rarity::Legendary => write!(f, "legendary"),
        }
    }
}

/// What earned a gem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GemReason {
    SkillMastered,
    Streak { length: u32 },
    Session { accuracy: f64 },
}

/// A gem granted to the learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GemAward {
    pub rarity: Rarity,
    pub reason: GemReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_id: Option<String>,
}
