pub mod battle_damage;
pub mod city_combatant;
pub mod combatant;

pub use battle_damage::{BattleDamage, CombatEvaluator};
pub use city_combatant::{city_max_health, city_strength};
pub use combatant::{Combatant, CombatantKind};
