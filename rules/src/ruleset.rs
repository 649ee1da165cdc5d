use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use util::Result;

use crate::belief::Belief;
use crate::building::Building;
use crate::construction::{Construction, PerpetualConstruction};
use crate::policy::PolicyBranch;
use crate::tech::Technology;
use crate::tile_resource::TileResource;
use crate::unique::{HasUniques, Unique, UniqueType};
use crate::unit::BaseUnit;
use crate::victory::Victory;

const BUILTIN_RULESET: &str = include_str!("../data/ruleset.json");

/// Read-only catalog of everything the game can contain.
///
/// Catalogs are kept in file order; every "first match wins" decision in the
/// AI depends on that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ruleset {
    pub name: String,
    pub buildings: Vec<Building>,
    pub units: Vec<BaseUnit>,
    pub technologies: Vec<Technology>,
    pub policy_branches: Vec<PolicyBranch>,
    pub beliefs: Vec<Belief>,
    pub tile_resources: Vec<TileResource>,
    pub victories: Vec<Victory>,
    /// Religion names available for founding.
    pub religions: Vec<String>,
    pub mod_options: Vec<Unique>,
}

impl Ruleset {
    pub fn from_json_str(json: &str) -> Result<Ruleset> {
        let ruleset: Ruleset = serde_json::from_str(json)?;
        debug!(
            name = %ruleset.name,
            buildings = ruleset.buildings.len(),
            units = ruleset.units.len(),
            technologies = ruleset.technologies.len(),
            "Loaded ruleset"
        );
        Ok(ruleset)
    }

    pub fn from_file(path: &Path) -> Result<Ruleset> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The ruleset shipped with the crate.
    pub fn builtin() -> Result<Ruleset> {
        Self::from_json_str(BUILTIN_RULESET)
    }

    pub fn get_building(&self, name: &str) -> Option<&Building> {
        self.buildings.iter().find(|it| it.name == name)
    }

    pub fn get_unit(&self, name: &str) -> Option<&BaseUnit> {
        self.units.iter().find(|it| it.name == name)
    }

    pub fn get_technology(&self, name: &str) -> Option<&Technology> {
        self.technologies.iter().find(|it| it.name == name)
    }

    pub fn get_tile_resource(&self, name: &str) -> Option<&TileResource> {
        self.tile_resources.iter().find(|it| it.name == name)
    }

    pub fn get_belief(&self, name: &str) -> Option<&Belief> {
        self.beliefs.iter().find(|it| it.name == name)
    }

    pub fn get_policy_branch(&self, name: &str) -> Option<&PolicyBranch> {
        self.policy_branches.iter().find(|it| it.name == name)
    }

    /// Finds a policy by name, including branch openers.
    pub fn get_policy_uniques(&self, name: &str) -> Option<&[Unique]> {
        if let Some(branch) = self.get_policy_branch(name) {
            return Some(branch.uniques());
        }
        self.policy_branches
            .iter()
            .flat_map(|branch| branch.policies.iter())
            .find(|policy| policy.name == name)
            .map(|policy| policy.uniques())
    }

    pub fn branch_of_policy(&self, name: &str) -> Option<&PolicyBranch> {
        self.policy_branches
            .iter()
            .find(|branch| branch.name == name || branch.policies.iter().any(|it| it.name == name))
    }

    /// Resolves a construction name, including perpetual conversions.
    pub fn get_construction(&self, name: &str) -> Option<Construction<'_>> {
        if let Some(perpetual) = PerpetualConstruction::from_name(name) {
            return Some(Construction::Perpetual(perpetual));
        }
        if let Some(building) = self.get_building(name) {
            return Some(Construction::Building(building));
        }
        self.get_unit(name).map(Construction::Unit)
    }

    /// Spaceship parts plus the resources they consume.
    pub fn space_resources(&self) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        for unit in self.units.iter().filter(|it| it.has_unique(UniqueType::SpaceshipPart)) {
            result.insert(unit.name.clone());
            if let Some(resource) = &unit.required_resource {
                result.insert(resource.clone());
            }
        }
        for building in self.buildings.iter().filter(|it| it.has_unique(UniqueType::SpaceshipPart)) {
            result.insert(building.name.clone());
            if let Some(resource) = &building.required_resource {
                result.insert(resource.clone());
            }
        }
        for victory in &self.victories {
            result.extend(victory.required_spaceship_parts.iter().cloned());
        }
        result
    }

    /// Gold value of telling another civilization about a third one.
    pub fn introduction_value(&self) -> i32 {
        self.mod_options
            .get_matching_uniques(UniqueType::TradeCivIntroductions)
            .first()
            .and_then(|it| it.param(0))
            .and_then(|it| it.parse().ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_resource::ResourceType;

    #[test]
    fn test_builtin_loads() {
        let ruleset = Ruleset::builtin().unwrap();
        assert!(!ruleset.buildings.is_empty());
        assert!(!ruleset.units.is_empty());
        assert!(ruleset.get_building("Monument").is_some());
        assert!(ruleset.get_unit("Settler").is_some());
        assert_eq!(ruleset.introduction_value(), 250);
    }

    #[test]
    fn test_builtin_references_resolve() {
        let ruleset = Ruleset::builtin().unwrap();
        for building in &ruleset.buildings {
            if let Some(tech) = &building.required_tech {
                assert!(ruleset.get_technology(tech).is_some(), "{} -> {}", building.name, tech);
            }
            if let Some(resource) = &building.required_resource {
                assert!(ruleset.get_tile_resource(resource).is_some());
            }
        }
        for unit in &ruleset.units {
            if let Some(tech) = &unit.required_tech {
                assert!(ruleset.get_technology(tech).is_some(), "{} -> {}", unit.name, tech);
            }
            if let Some(resource) = &unit.required_resource {
                assert!(ruleset.get_tile_resource(resource).is_some());
            }
        }
        for tech in &ruleset.technologies {
            for prerequisite in &tech.prerequisites {
                assert!(ruleset.get_technology(prerequisite).is_some());
            }
        }
    }

    #[test]
    fn test_space_resources() {
        let ruleset = Ruleset::builtin().unwrap();
        let space = ruleset.space_resources();
        assert!(space.contains("SS Booster"));
        assert!(space.contains("Aluminum"));
        assert_eq!(
            ruleset.get_tile_resource("Aluminum").map(|it| it.resource_type),
            Some(ResourceType::Strategic)
        );
    }

    #[test]
    fn test_get_construction_resolves_all_kinds() {
        let ruleset = Ruleset::builtin().unwrap();
        assert!(matches!(ruleset.get_construction("Gold"), Some(Construction::Perpetual(_))));
        assert!(matches!(ruleset.get_construction("Library"), Some(Construction::Building(_))));
        assert!(matches!(ruleset.get_construction("Warrior"), Some(Construction::Unit(_))));
        assert!(ruleset.get_construction("Death Star").is_none());
    }

    #[test]
    fn test_policy_lookup() {
        let ruleset = Ruleset::builtin().unwrap();
        assert!(ruleset.get_policy_uniques("Tradition").is_some());
        assert_eq!(
            ruleset.branch_of_policy("Aristocracy").map(|it| it.name.as_str()),
            Some("Tradition")
        );
    }
}
