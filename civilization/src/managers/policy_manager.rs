use std::collections::{BTreeMap, BTreeSet};

use rules::{PolicyBranch, Ruleset, VictoryFocus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Manages the social policies of a civilization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyManager {
    /// Adopted branches and policies
    pub adopted_policies: BTreeSet<String>,

    /// Culture stored towards the next policy
    pub stored_culture: i32,

    /// Policies that can be adopted without paying culture
    pub free_policies: i32,
}

impl PolicyManager {
    /// Creates a new PolicyManager
    pub fn new() -> Self {
        PolicyManager::default()
    }

    pub fn is_adopted(&self, policy_name: &str) -> bool {
        self.adopted_policies.contains(policy_name)
    }

    pub fn number_of_adopted_policies(&self) -> usize {
        self.adopted_policies.len()
    }

    /// Culture needed for the next policy, growing with adopted policies and owned cities.
    pub fn get_culture_needed_for_next_policy(&self, number_of_cities: usize) -> i32 {
        let adopted = self.number_of_adopted_policies() as f32;
        let mut cost = 25.0 + (adopted * 6.0).powf(1.7);
        let city_modifier = 1.0 + 0.1 * (number_of_cities.max(1) - 1) as f32;
        cost *= city_modifier;
        (cost / 5.0) as i32 * 5
    }

    pub fn can_adopt_policy(&self, ruleset: &Ruleset, number_of_cities: usize) -> bool {
        if self.free_policies == 0 && self.stored_culture < self.get_culture_needed_for_next_policy(number_of_cities) {
            return false;
        }
        ruleset
            .policy_branches
            .iter()
            .any(|branch| !self.adoptable_policies_in(branch).is_empty())
    }

    /// A branch opener can always be adopted; a policy only inside an adopted branch.
    pub fn is_adoptable(&self, ruleset: &Ruleset, policy_name: &str) -> bool {
        if self.is_adopted(policy_name) {
            return false;
        }
        match ruleset.branch_of_policy(policy_name) {
            Some(branch) => branch.name == policy_name || self.is_adopted(&branch.name),
            None => false,
        }
    }

    fn adoptable_policies_in<'a>(&self, branch: &'a PolicyBranch) -> Vec<&'a str> {
        if !self.is_adopted(&branch.name) {
            return vec![branch.name.as_str()];
        }
        branch
            .policies
            .iter()
            .filter(|it| !self.is_adopted(&it.name))
            .map(|it| it.name.as_str())
            .collect()
    }

    /// Branches with at least one policy left to adopt, in ruleset order.
    pub fn incomplete_branches<'a>(&self, ruleset: &'a Ruleset) -> Vec<&'a PolicyBranch> {
        ruleset
            .policy_branches
            .iter()
            .filter(|branch| !self.adoptable_policies_in(branch).is_empty())
            .collect()
    }

    /// Names adoptable right now within `branch`.
    pub fn adoptable_policies<'a>(&self, branch: &'a PolicyBranch) -> Vec<&'a str> {
        self.adoptable_policies_in(branch)
    }

    /// How much an AI with `focus` wants each incomplete branch.
    pub fn branch_priorities(&self, ruleset: &Ruleset, focus: VictoryFocus) -> BTreeMap<String, i32> {
        self.incomplete_branches(ruleset)
            .into_iter()
            .map(|branch| (branch.name.clone(), branch.priority_for(focus)))
            .collect()
    }

    /// Number of adopted entries in each incomplete branch, opener included.
    pub fn branch_completion(&self, ruleset: &Ruleset) -> BTreeMap<String, usize> {
        self.incomplete_branches(ruleset)
            .into_iter()
            .map(|branch| {
                let adopted = std::iter::once(branch.name.as_str())
                    .chain(branch.policies.iter().map(|it| it.name.as_str()))
                    .filter(|it| self.is_adopted(it))
                    .count();
                (branch.name.clone(), adopted)
            })
            .collect()
    }

    /// Adopts a policy, paying culture unless a free policy is available.
    pub fn adopt(&mut self, policy_name: &str, number_of_cities: usize) {
        if self.free_policies > 0 {
            self.free_policies -= 1;
        } else {
            let cost = self.get_culture_needed_for_next_policy(number_of_cities);
            self.stored_culture = (self.stored_culture - cost).max(0);
        }
        self.adopted_policies.insert(policy_name.to_string());
        debug!(policy = %policy_name, "Policy adopted");
    }
}
