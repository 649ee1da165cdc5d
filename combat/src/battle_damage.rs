use crate::combatant::{Combatant, CombatantKind};
use tracing::trace;

/// Each 3 points of missing health reduce damage dealt by 1%.
const DAMAGE_REDUCTION_WOUNDED_UNIT_RATIO_PERCENTAGE: f32 = 300.0;
const DAMAGE_TO_CIVILIAN_UNIT: i32 = 40;

/// Expected damage of an attack, consumed by the AI as a black box.
pub trait CombatEvaluator: Send + Sync {
    fn calculate_damage_to_attacker(&self, attacker: &Combatant, defender: &Combatant) -> i32;
    fn calculate_damage_to_defender(&self, attacker: &Combatant, defender: &Combatant) -> i32;
}

/// The standard damage model with a fixed randomness factor.
///
/// A factor of 0.5 yields the expected value of the in-game roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattleDamage {
    pub randomness_factor: f32,
}

impl Default for BattleDamage {
    fn default() -> Self {
        BattleDamage { randomness_factor: 0.5 }
    }
}

impl BattleDamage {
    fn get_health_dependant_damage_ratio(combatant: &Combatant) -> f32 {
        if combatant.kind != CombatantKind::Unit {
            return 1.0;
        }
        1.0 - (100 - combatant.health) as f32 / DAMAGE_REDUCTION_WOUNDED_UNIT_RATIO_PERCENTAGE
    }

    fn strength_ratio(attacker: &Combatant, defender: &Combatant) -> f32 {
        f32::max(1.0, attacker.attacking_strength) / f32::max(1.0, defender.defending_strength)
    }

    fn damage_modifier(&self, attacker_to_defender_ratio: f32, damage_to_attacker: bool) -> f32 {
        let stronger_to_weaker_ratio = if attacker_to_defender_ratio < 1.0 {
            attacker_to_defender_ratio.powf(-1.0)
        } else {
            attacker_to_defender_ratio
        };

        let mut ratio_modifier = (((stronger_to_weaker_ratio + 3.0) / 4.0).powf(4.0) + 1.0) / 2.0;

        // The weaker party's damage ratio is inverted
        if (damage_to_attacker && attacker_to_defender_ratio > 1.0)
            || (!damage_to_attacker && attacker_to_defender_ratio < 1.0)
        {
            ratio_modifier = ratio_modifier.powf(-1.0);
        }

        let random_centered_around_30 = 24.0 + 12.0 * self.randomness_factor;
        random_centered_around_30 * ratio_modifier
    }
}

impl CombatEvaluator for BattleDamage {
    fn calculate_damage_to_attacker(&self, attacker: &Combatant, defender: &Combatant) -> i32 {
        if attacker.is_ranged && !attacker.is_air {
            return 0;
        }
        if defender.is_civilian {
            return 0;
        }
        let ratio = Self::strength_ratio(attacker, defender);
        (self.damage_modifier(ratio, true) * Self::get_health_dependant_damage_ratio(defender)) as i32
    }

    fn calculate_damage_to_defender(&self, attacker: &Combatant, defender: &Combatant) -> i32 {
        if defender.is_civilian {
            return DAMAGE_TO_CIVILIAN_UNIT;
        }
        let ratio = Self::strength_ratio(attacker, defender);
        let damage = (self.damage_modifier(ratio, false) * Self::get_health_dependant_damage_ratio(attacker)) as i32;
        trace!(attacker = %attacker.name, defender = %defender.name, ratio, damage, "Expected damage to defender");
        damage
    }
}
