use serde::{Deserialize, Serialize};

/// The kind of victory an AI steers towards; shapes most of its weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VictoryFocus {
    #[default]
    Neutral,
    Culture,
    Science,
    Military,
    Diplomacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneType {
    /// Param: building the civilization must own.
    BuiltBuilding,
    /// Param: building that must exist anywhere in the world.
    BuildingBuiltGlobally,
    AddedSSPartsInCapital,
    WinDiplomaticVote,
    CaptureAllCapitals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(rename = "type")]
    pub milestone_type: MilestoneType,
    #[serde(default)]
    pub param: String,
}

impl Milestone {
    /// Buildings that progress this milestone.
    pub fn focus_buildings(&self) -> Option<&str> {
        match self.milestone_type {
            MilestoneType::BuiltBuilding | MilestoneType::BuildingBuiltGlobally => Some(&self.param),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Victory {
    pub name: String,
    pub milestones: Vec<Milestone>,
    pub required_spaceship_parts: Vec<String>,
}
