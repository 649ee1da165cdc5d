use combat::Combatant;
use rules::{BaseUnit, HasUniques, UniqueType};
use serde::{Deserialize, Serialize};
use util::HexCoord;

pub const MAX_UNIT_HEALTH: i32 = 100;

/// A unit on the map.
///
/// Keeps its own copy of the base unit so it can be evaluated without a
/// ruleset lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapUnit {
    pub id: u32,
    pub civ_name: String,
    pub base_unit: BaseUnit,
    pub position: HexCoord,
    pub health: i32,
    /// Whether the unit already acted this turn
    pub has_moved: bool,
}

impl MapUnit {
    pub fn new(id: u32, civ_name: &str, base_unit: BaseUnit, position: HexCoord) -> Self {
        MapUnit {
            id,
            civ_name: civ_name.to_string(),
            base_unit,
            position,
            health: MAX_UNIT_HEALTH,
            has_moved: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.base_unit.name
    }

    pub fn is_civilian(&self) -> bool {
        self.base_unit.is_civilian()
    }

    pub fn is_military(&self) -> bool {
        self.base_unit.is_military()
    }

    pub fn has_unique(&self, unique_type: UniqueType) -> bool {
        self.base_unit.has_unique(unique_type)
    }

    pub fn requires_resource(&self, resource: &str) -> bool {
        self.base_unit.required_resource.as_deref() == Some(resource)
    }

    /// Force scaled by remaining health.
    pub fn get_force_evaluation(&self) -> i32 {
        self.base_unit.get_force_evaluation() * self.health / MAX_UNIT_HEALTH
    }

    pub fn combatant(&self) -> Combatant {
        Combatant::unit(&self.base_unit, self.health)
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(MAX_UNIT_HEALTH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_scales_with_health() {
        let warrior = BaseUnit {
            name: "Warrior".to_string(),
            unit_type: rules::UnitType::Melee,
            strength: 8,
            cost: 40,
            ..Default::default()
        };
        let mut unit = MapUnit::new(1, "Rome", warrior, HexCoord::default());
        let full = unit.get_force_evaluation();
        assert!(full > 0);
        unit.health = 50;
        assert_eq!(unit.get_force_evaluation(), full / 2);
        unit.heal(80);
        assert_eq!(unit.health, MAX_UNIT_HEALTH);
    }
}
