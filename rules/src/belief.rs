use serde::{Deserialize, Serialize};

use crate::stats::Stats;
use crate::unique::{HasUniques, Unique};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BeliefType {
    Pantheon,
    Founder,
    Follower,
    Enhancer,
    /// Matches every other type when choosing free beliefs.
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Belief {
    pub name: String,
    #[serde(rename = "type")]
    pub belief_type: BeliefType,
    /// Yields granted to every city following the belief.
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub uniques: Vec<Unique>,
}

impl Belief {
    pub fn is_of_type(&self, belief_type: BeliefType) -> bool {
        belief_type == BeliefType::Any || self.belief_type == belief_type
    }
}

impl HasUniques for Belief {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}
