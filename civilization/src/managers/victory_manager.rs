use std::collections::BTreeMap;

use rules::{Milestone, MilestoneType, Victory};
use serde::{Deserialize, Serialize};

/// Tracks progress towards the ruleset's victories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VictoryManager {
    /// Spaceship parts added to the capital, by name
    pub spaceship_parts: BTreeMap<String, i32>,

    /// Set once the civilization won a diplomatic vote
    pub won_diplomatic_vote: bool,
}

/// What a milestone check needs to know about the world.
pub struct MilestoneProgress<'a> {
    pub civ_has_building: &'a dyn Fn(&str) -> bool,
    pub is_built_globally: &'a dyn Fn(&str) -> bool,
    pub owns_all_capitals: bool,
}

impl VictoryManager {
    /// Creates a new VictoryManager
    pub fn new() -> Self {
        VictoryManager::default()
    }

    pub fn add_spaceship_part(&mut self, part: &str) {
        *self.spaceship_parts.entry(part.to_string()).or_insert(0) += 1;
    }

    fn has_all_spaceship_parts(&self, victory: &Victory) -> bool {
        let mut required: BTreeMap<&str, i32> = BTreeMap::new();
        for part in &victory.required_spaceship_parts {
            *required.entry(part.as_str()).or_insert(0) += 1;
        }
        required
            .iter()
            .all(|(part, amount)| self.spaceship_parts.get(*part).copied().unwrap_or(0) >= *amount)
    }

    pub fn is_milestone_complete(&self, milestone: &Milestone, victory: &Victory, progress: &MilestoneProgress) -> bool {
        match milestone.milestone_type {
            MilestoneType::BuiltBuilding => (progress.civ_has_building)(&milestone.param),
            MilestoneType::BuildingBuiltGlobally => (progress.is_built_globally)(&milestone.param),
            MilestoneType::AddedSSPartsInCapital => self.has_all_spaceship_parts(victory),
            MilestoneType::WinDiplomaticVote => self.won_diplomatic_vote,
            MilestoneType::CaptureAllCapitals => progress.owns_all_capitals,
        }
    }

    /// The first incomplete milestone of `victory`, if any remain.
    pub fn get_next_milestone<'a>(&self, victory: &'a Victory, progress: &MilestoneProgress) -> Option<&'a Milestone> {
        victory
            .milestones
            .iter()
            .find(|it| !self.is_milestone_complete(it, victory, progress))
    }

    /// Whether every milestone of some victory except possibly the last is done.
    pub fn is_close_to_victory(&self, victories: &[Victory], progress: &MilestoneProgress) -> bool {
        victories.iter().any(|victory| {
            let remaining = victory
                .milestones
                .iter()
                .filter(|it| !self.is_milestone_complete(it, victory, progress))
                .count();
            !victory.milestones.is_empty() && remaining <= 1 && victory.milestones.len() > 1
        })
    }
}
