use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::unique::{HasUniques, Unique};
use crate::victory::VictoryFocus;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Policy {
    pub name: String,
    pub uniques: Vec<Unique>,
}

impl HasUniques for Policy {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}

/// A policy tree; adopting the branch itself opens its policies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyBranch {
    pub name: String,
    /// How much an AI with the given focus wants this branch.
    pub priorities: BTreeMap<VictoryFocus, i32>,
    pub policies: Vec<Policy>,
    pub uniques: Vec<Unique>,
}

impl PolicyBranch {
    pub fn priority_for(&self, focus: VictoryFocus) -> i32 {
        self.priorities.get(&focus).copied().unwrap_or(0)
    }
}

impl HasUniques for PolicyBranch {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}
