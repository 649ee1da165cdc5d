use rules::BaseUnit;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    Unit,
    City,
}

/// What the damage evaluator needs to know about one side of a fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub kind: CombatantKind,
    pub attacking_strength: f32,
    pub defending_strength: f32,
    pub health: i32,
    pub is_ranged: bool,
    pub is_air: bool,
    pub is_civilian: bool,
}

impl Combatant {
    pub fn unit(base_unit: &BaseUnit, health: i32) -> Self {
        let attacking_strength = if base_unit.is_ranged() {
            base_unit.ranged_strength
        } else {
            base_unit.strength
        };
        Combatant {
            name: base_unit.name.clone(),
            kind: CombatantKind::Unit,
            attacking_strength: attacking_strength as f32,
            defending_strength: base_unit.strength as f32,
            health,
            is_ranged: base_unit.is_ranged(),
            is_air: base_unit.is_air_unit(),
            is_civilian: base_unit.is_civilian(),
        }
    }

    /// Cities attack by bombarding, so they count as ranged.
    pub fn city(name: &str, strength: f32, health: i32) -> Self {
        Combatant {
            name: name.to_string(),
            kind: CombatantKind::City,
            attacking_strength: strength,
            defending_strength: strength,
            health,
            is_ranged: true,
            is_air: false,
            is_civilian: false,
        }
    }
}
