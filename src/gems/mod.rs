//! Gems
//!
//! Gems are small rewards with a four-tier rarity. Mastery gems take their
//! rarity from how deep the skill sits in the prerequisite graph; streak and
//! session gems from streak length and accuracy.

mod depth;
mod rarity;

pub use depth::DepthMap;
pub use rarity::{session_rarity, streak_rarity};

use crate::skill_graph::SkillGraph;
use crate::types::{GemAward, GemReason};

/// Streak lengths that earn a gem are multiples of this
pub const STREAK_MILESTONE: u32 = 5;

/// Decides which gem a learner earns.
///
/// Holds a [`DepthMap`] computed once at construction; pass the service to
/// whoever needs it rather than rebuilding depths per award.
#[derive(Debug, Clone)]
pub struct GemService {
    depths: DepthMap,
}

impl GemService {
    pub fn new(graph: &dyn SkillGraph) -> Self {
        Self::with_depths(DepthMap::compute(graph))
    }

    pub fn with_depths(depths: DepthMap) -> Self {
        Self { depths }
    }

    pub fn depths(&self) -> &DepthMap {
        &self.depths
    }

    /// Gem for mastering a skill
    pub fn mastery_gem(&self, skill_id: &str) -> GemAward {
        GemAward {
            rarity: self.depths.rarity_for_skill(skill_id),
            reason: GemReason::SkillMastered,
            skill_id: Some(skill_id.to_string()),
        }
    }

    /// Gem for reaching a streak milestone, `None` between milestones
    pub fn streak_gem(&self, length: u32) -> Option<GemAward> {
        if length < STREAK_MILESTONE || length % STREAK_MILESTONE != 0 {
            return None;
        }
        Some(GemAward {
            rarity: streak_rarity(length),
            reason: GemReason::Streak { length },
            skill_id: None,
        })
    }

    /// Gem for finishing a session
    pub fn session_gem(&self, accuracy: f64) -> GemAward {
        GemAward {
            rarity: session_rarity(accuracy),
            reason: GemReason::Session { accuracy },
            skill_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill_graph::{SkillCatalog, SkillDef};
    use crate::types::Rarity;

    fn service() -> GemService {
        let catalog = SkillCatalog::new(vec![
            SkillDef::new("a", &[]),
            SkillDef::new("b", &["a"]),
            SkillDef::new("c", &["b"]),
            SkillDef::new("d", &["c"]),
            SkillDef::new("e", &["d"]),
        ])
        .unwrap();
        GemService::new(&catalog)
    }

    #[test]
    fn test_mastery_gem_uses_depth() {
        let gems = service();
        // depths 0..=4, boundaries [1, 2, 3]
        assert_eq!(gems.depths().boundaries(), [1, 2, 3]);
        assert_eq!(gems.mastery_gem("a").rarity, Rarity::Common);
        assert_eq!(gems.mastery_gem("c").rarity, Rarity::Rare);
        assert_eq!(gems.mastery_gem("d").rarity, Rarity::Epic);
        assert_eq!(gems.mastery_gem("e").rarity, Rarity::Legendary);
        assert_eq!(gems.mastery_gem("e").skill_id.as_deref(), Some("e"));
    }

    #[test]
    fn test_streak_gems_at_milestones() {
        let gems = service();
        assert!(gems.streak_gem(0).is_none());
        assert!(gems.streak_gem(4).is_none());
        assert!(gems.streak_gem(7).is_none());

        assert_eq!(gems.streak_gem(5).unwrap().rarity, Rarity::Common);
        assert_eq!(gems.streak_gem(10).unwrap().rarity, Rarity::Rare);
        assert_eq!(gems.streak_gem(15).unwrap().rarity, Rarity::Epic);
        let legendary = gems.streak_gem(20).unwrap();
        assert_eq!(legendary.rarity, Rarity::Legendary);
        assert_eq!(legendary.reason, GemReason::Streak { length: 20 });
    }

    #[test]
    fn test_session_gem() {
        let gems = service();
        let award = gems.session_gem(0.8);
        assert_eq!(award.rarity, Rarity::Epic);
        assert!(award.skill_id.is_none());
    }
}
