use std::collections::BTreeMap;

use rules::{BeliefType, Ruleset, Stats};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Progress of a civilization through the religion ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ReligionState {
    #[default]
    None,
    Pantheon,
    /// A prophet was bought; beliefs and a name are still to be chosen
    FoundingReligion,
    Religion,
    /// A prophet was bought to enhance; beliefs are still to be chosen
    EnhancingReligion,
    EnhancedReligion,
}

/// A pantheon or religion with its chosen beliefs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Religion {
    pub name: String,
    pub founding_civ: String,
    pub beliefs: Vec<String>,
}

impl Religion {
    pub fn new(name: &str, founding_civ: &str) -> Self {
        Religion {
            name: name.to_string(),
            founding_civ: founding_civ.to_string(),
            beliefs: Vec::new(),
        }
    }

    pub fn is_pantheon(&self) -> bool {
        self.name == self.founding_civ
    }

    /// Summed stats of every belief, applied once per city following the religion.
    pub fn stats(&self, ruleset: &Ruleset) -> Stats {
        let mut stats = Stats::default();
        for belief in self.beliefs.iter().filter_map(|it| ruleset.get_belief(it)) {
            stats += belief.stats;
        }
        stats
    }
}

/// Manages faith and the religion founded by a civilization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReligionManager {
    pub stored_faith: i32,

    pub religion_state: ReligionState,

    /// Key of our pantheon or religion in the game's religion map
    pub religion: Option<String>,

    /// Great prophets bought so far; each makes the next one dearer
    pub great_prophets_earned: i32,

    /// Beliefs of any type granted for free, chosen at the next opportunity
    #[serde(default)]
    pub free_beliefs: usize,
}

impl ReligionManager {
    /// Creates a new ReligionManager
    pub fn new() -> Self {
        ReligionManager::default()
    }

    /// Faith needed for a pantheon given how many were founded in the game so far.
    pub fn faith_for_pantheon(pantheons_founded: usize) -> i32 {
        10 + 5 * pantheons_founded as i32
    }

    pub fn faith_for_next_great_prophet(&self) -> i32 {
        let earned = self.great_prophets_earned;
        200 + 100 * earned * (earned + 1) / 2
    }

    pub fn can_found_pantheon(&self, pantheons_founded: usize) -> bool {
        self.religion_state == ReligionState::None
            && self.stored_faith >= Self::faith_for_pantheon(pantheons_founded)
    }

    /// Whether a prophet can be bought to found or enhance a religion.
    pub fn can_buy_great_prophet(&self, religions_left: usize) -> bool {
        let state_allows = match self.religion_state {
            ReligionState::Pantheon => religions_left > 0,
            ReligionState::Religion => true,
            _ => false,
        };
        state_allows && self.stored_faith >= self.faith_for_next_great_prophet()
    }

    /// Spends faith on a prophet and moves to the matching founding state.
    pub fn buy_great_prophet(&mut self) {
        self.stored_faith -= self.faith_for_next_great_prophet();
        self.great_prophets_earned += 1;
        self.religion_state = match self.religion_state {
            ReligionState::Pantheon => ReligionState::FoundingReligion,
            ReligionState::Religion => ReligionState::EnhancingReligion,
            other => other,
        };
        debug!(state = ?self.religion_state, "Great prophet bought");
    }

    /// Beliefs of each type that must be chosen in the current state.
    pub fn beliefs_to_choose(&self) -> BTreeMap<BeliefType, usize> {
        let mut result = BTreeMap::new();
        match self.religion_state {
            ReligionState::None => {
                result.insert(BeliefType::Pantheon, 1);
            }
            ReligionState::FoundingReligion => {
                result.insert(BeliefType::Founder, 1);
                result.insert(BeliefType::Follower, 1);
            }
            ReligionState::EnhancingReligion => {
                result.insert(BeliefType::Follower, 1);
                result.insert(BeliefType::Enhancer, 1);
            }
            _ => {}
        }
        result
    }

    pub fn add_faith(&mut self, faith: i32) {
        self.stored_faith += faith;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prophet_cost_grows() {
        let mut manager = ReligionManager::new();
        assert_eq!(manager.faith_for_next_great_prophet(), 200);
        manager.great_prophets_earned = 1;
        assert_eq!(manager.faith_for_next_great_prophet(), 300);
        manager.great_prophets_earned = 2;
        assert_eq!(manager.faith_for_next_great_prophet(), 500);
    }

    #[test]
    fn test_religion_ladder() {
        let mut manager = ReligionManager::new();
        manager.stored_faith = 15;
        assert!(manager.can_found_pantheon(1));
        assert!(!manager.can_found_pantheon(2));
        manager.religion_state = ReligionState::Pantheon;
        manager.stored_faith = 200;
        assert!(!manager.can_buy_great_prophet(0));
        assert!(manager.can_buy_great_prophet(3));
        manager.buy_great_prophet();
        assert_eq!(manager.religion_state, ReligionState::FoundingReligion);
        assert_eq!(manager.stored_faith, 0);
        assert_eq!(manager.beliefs_to_choose().get(&BeliefType::Founder), Some(&1));
    }
}
