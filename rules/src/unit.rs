use serde::{Deserialize, Serialize};

use crate::unique::{HasUniques, Unique, UniqueType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitType {
    #[default]
    Civilian,
    WaterCivilian,
    Melee,
    Archery,
    Mounted,
    Siege,
    Naval,
    Air,
}

impl UnitType {
    pub fn name(&self) -> &'static str {
        match self {
            UnitType::Civilian => "Civilian",
            UnitType::WaterCivilian => "WaterCivilian",
            UnitType::Melee => "Melee",
            UnitType::Archery => "Archery",
            UnitType::Mounted => "Mounted",
            UnitType::Siege => "Siege",
            UnitType::Naval => "Naval",
            UnitType::Air => "Air",
        }
    }

    pub fn is_water_unit(&self) -> bool {
        matches!(self, UnitType::Naval | UnitType::WaterCivilian)
    }

    pub fn is_air_unit(&self) -> bool {
        matches!(self, UnitType::Air)
    }

    pub fn is_land_unit(&self) -> bool {
        !self.is_water_unit() && !self.is_air_unit()
    }
}

/// A unit template from the ruleset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BaseUnit {
    pub name: String,
    pub unit_type: UnitType,
    pub cost: i32,
    pub strength: i32,
    pub ranged_strength: i32,
    pub range: i32,
    pub movement: i32,
    pub required_tech: Option<String>,
    pub obsolete_tech: Option<String>,
    pub required_resource: Option<String>,
    /// Civilization this unit is exclusive to.
    pub unique_to: Option<String>,
    pub hurry_cost_modifier: i32,
    pub uniques: Vec<Unique>,
}

impl Default for BaseUnit {
    fn default() -> Self {
        BaseUnit {
            name: String::new(),
            unit_type: UnitType::default(),
            cost: 0,
            strength: 0,
            ranged_strength: 0,
            range: 2,
            movement: 2,
            required_tech: None,
            obsolete_tech: None,
            required_resource: None,
            unique_to: None,
            hurry_cost_modifier: 0,
            uniques: Vec::new(),
        }
    }
}

impl BaseUnit {
    pub fn is_civilian(&self) -> bool {
        self.strength == 0 && self.ranged_strength == 0
    }

    pub fn is_military(&self) -> bool {
        !self.is_civilian()
    }

    pub fn is_ranged(&self) -> bool {
        self.ranged_strength > 0
    }

    pub fn is_melee(&self) -> bool {
        !self.is_ranged() && self.strength > 0
    }

    pub fn is_water_unit(&self) -> bool {
        self.unit_type.is_water_unit()
    }

    pub fn is_air_unit(&self) -> bool {
        self.unit_type.is_air_unit()
    }

    pub fn is_land_unit(&self) -> bool {
        self.unit_type.is_land_unit()
    }

    pub fn is_great_general(&self) -> bool {
        self.has_unique(UniqueType::GreatGeneral)
    }

    /// Rough combat value used for civilization force rankings.
    pub fn get_force_evaluation(&self) -> i32 {
        if self.cost == -1 || !self.is_military() {
            return 0;
        }
        let mut power = (self.strength as f32).powf(1.5);
        let mut ranged_power = (self.ranged_strength as f32).powf(1.45);
        // Ranged naval units are valued less
        if self.is_water_unit() {
            ranged_power /= 2.0;
        }
        if ranged_power > 0.0 {
            power = ranged_power;
        }
        power *= (self.movement as f32).powf(0.3);
        power as i32
    }

    pub fn matches_filter(&self, filter: &str) -> bool {
        match filter {
            "All" => true,
            "Military" => self.is_military(),
            "Civilian" => self.is_civilian(),
            "Melee" => self.is_melee(),
            "Ranged" => self.is_ranged(),
            "Land" => self.is_land_unit(),
            "Water" => self.is_water_unit(),
            "Air" => self.is_air_unit(),
            _ => filter == self.name || filter == self.unit_type.name(),
        }
    }

    pub fn base_gold_cost(&self) -> i32 {
        let cost = (30.0 * self.cost as f32).powf(0.75) * (1.0 + self.hurry_cost_modifier as f32 / 100.0);
        (cost / 10.0) as i32 * 10
    }
}

impl HasUniques for BaseUnit {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str, unit_type: UnitType, strength: i32, ranged_strength: i32) -> BaseUnit {
        BaseUnit {
            name: name.to_string(),
            unit_type,
            cost: 40,
            strength,
            ranged_strength,
            ..Default::default()
        }
    }

    #[test]
    fn test_classification() {
        let warrior = unit("Warrior", UnitType::Melee, 8, 0);
        let archer = unit("Archer", UnitType::Archery, 5, 7);
        let settler = unit("Settler", UnitType::Civilian, 0, 0);
        assert!(warrior.is_melee() && warrior.is_military());
        assert!(archer.is_ranged() && !archer.is_melee());
        assert!(settler.is_civilian());
        assert!(settler.matches_filter("Civilian"));
        assert!(archer.matches_filter("Archery"));
    }

    #[test]
    fn test_force_evaluation() {
        let warrior = unit("Warrior", UnitType::Melee, 8, 0);
        // 8^1.5 * 2^0.3 = 22.6 * 1.23
        assert_eq!(warrior.get_force_evaluation(), 27);
        assert_eq!(unit("Worker", UnitType::Civilian, 0, 0).get_force_evaluation(), 0);

        let trireme = unit("Trireme", UnitType::Naval, 10, 0);
        let bireme = unit("Bireme", UnitType::Naval, 4, 10);
        assert!(bireme.get_force_evaluation() < trireme.get_force_evaluation());
    }
}
