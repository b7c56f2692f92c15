//! Skill graph collaborator
//!
//! The engine needs three things from the skill graph: every skill in
//! topological order, each skill's direct prerequisites, and the root skills.
//! [`SkillCatalog`] is an in-memory implementation built from a list of
//! skill definitions.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Read-only view of the prerequisite DAG
pub trait SkillGraph {
    /// Every skill, each one after all of its prerequisites
    fn topological_order(&self) -> &[String];

    /// Direct prerequisites of a skill; empty for roots and unknown ids
    fn prerequisites(&self, skill_id: &str) -> &[String];

    /// Skills without prerequisites
    fn roots(&self) -> Vec<String> {
        self.topological_order()
            .iter()
            .filter(|id| self.prerequisites(id).is_empty())
            .cloned()
            .collect()
    }
}

/// Errors building a skill catalog
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate skill: {0}")]
    DuplicateSkill(String),

    #[error("skill {skill} requires unknown skill {prerequisite}")]
    UnknownPrerequisite { skill: String, prerequisite: String },

    #[error("prerequisite cycle among: {0:?}")]
    Cycle(Vec<String>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One skill and its direct prerequisites
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: String,
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

impl SkillDef {
    pub fn new(id: &str, prerequisites: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// In-memory skill graph with a precomputed topological order
#[derive(Debug, Clone, Default)]
pub struct SkillCatalog {
    order: Vec<String>,
    prerequisites: HashMap<String, Vec<String>>,
}

impl SkillCatalog {
    /// Build a catalog, rejecting duplicates, dangling prerequisites and cycles.
    ///
    /// Skills that become available at the same time are ordered by id, so the
    /// order is deterministic.
    pub fn new(skills: Vec<SkillDef>) -> Result<Self, GraphError> {
        let mut prerequisites: HashMap<String, Vec<String>> = HashMap::with_capacity(skills.len());
        for skill in skills {
            if prerequisites.contains_key(&skill.id) {
                return Err(GraphError::DuplicateSkill(skill.id));
            }
            prerequisites.insert(skill.id, skill.prerequisites);
        }

        let mut remaining: HashMap<&str, usize> = HashMap::with_capacity(prerequisites.len());
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (skill, prereqs) in &prerequisites {
            for prereq in prereqs {
                if !prerequisites.contains_key(prereq) {
                    return Err(GraphError::UnknownPrerequisite {
                        skill: skill.clone(),
                        prerequisite: prereq.clone(),
                    });
                }
                dependents.entry(prereq.as_str()).or_default().push(skill.as_str());
            }
            remaining.insert(skill.as_str(), prereqs.len());
        }

        // Kahn's algorithm
        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(prerequisites.len());

        while let Some(skill) = ready.pop_first() {
            order.push(skill.to_string());
            for &dependent in dependents.get(skill).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() < prerequisites.len() {
            let mut stuck: Vec<String> = remaining
                .iter()
                .filter(|(_, &count)| count > 0)
                .map(|(&id, _)| id.to_string())
                .collect();
            stuck.sort();
            return Err(GraphError::Cycle(stuck));
        }

        Ok(Self {
            order,
            prerequisites,
        })
    }

    /// Parse a JSON array of `{ "id", "prerequisites" }` objects
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let skills: Vec<SkillDef> = serde_json::from_str(json)?;
        Self::new(skills)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, skill_id: &str) -> bool {
        self.prerequisites.contains_key(skill_id)
    }
}

impl SkillGraph for SkillCatalog {
    fn topological_order(&self) -> &[String] {
        &self.order
    }

    fn prerequisites(&self, skill_id: &str) -> &[String] {
        self.prerequisites
            .get(skill_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
