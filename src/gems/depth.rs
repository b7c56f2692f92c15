//! Skill depth index
//!
//! Depth is the longest prerequisite path from a root skill. Rarity of a
//! mastery gem is the depth quartile the skill falls in.

use std::collections::HashMap;

use crate::skill_graph::SkillGraph;
use crate::types::Rarity;

/// Longest-path depth of every skill plus quartile boundaries.
///
/// Built once from the skill graph and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepthMap {
    depths: HashMap<String, u32>,
    boundaries: [u32; 3],
}

impl DepthMap {
    /// Compute depths in one pass over the topological order.
    ///
    /// Every prerequisite is visited before the skills that need it, so its
    /// depth is already known.
    pub fn compute(graph: &dyn SkillGraph) -> Self {
        let order = graph.topological_order();
        let mut depths: HashMap<String, u32> = HashMap::with_capacity(order.len());

        for skill_id in order {
            let depth = graph
                .prerequisites(skill_id)
                .iter()
                .map(|p| depths.get(p).copied().unwrap_or(0) + 1)
                .max()
                .unwrap_or(0);
            depths.insert(skill_id.clone(), depth);
        }

        let boundaries = quartile_boundaries(depths.values().copied().collect());
        tracing::debug!(skills = depths.len(), ?boundaries, "computed skill depth map");

        Self { depths, boundaries }
    }

    /// Depth of a skill; unknown skills are treated as roots
    pub fn depth(&self, skill_id: &str) -> u32 {
        self.depths.get(skill_id).copied().unwrap_or(0)
    }

    /// Depth values at the 25th, 50th and 75th percentile
    pub fn boundaries(&self) -> [u32; 3] {
        self.boundaries
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    /// Rarity tier for a skill from its depth quartile
    pub fn rarity_for_skill(&self, skill_id: &str) -> Rarity {
        let depth = self.depth(skill_id);
        let [q1, q2, q3] = self.boundaries;

        if depth > q3 {
            Rarity::Legendary
        } else if depth > q2 {
            Rarity::Epic
        } else if depth > q1 {
            Rarity::Rare
        } else {
            Rarity::Common
        }
    }
}

/// Sorted values at indexes n/4, n/2 and 3n/4
fn quartile_boundaries(mut values: Vec<u32>) -> [u32; 3] {
    if values.is_empty() {
        return [0; 3];
    }
    values.sort_unstable();
    let n = values.len();
    [values[n / 4], values[n / 2], values[3 * n / 4]]
}
