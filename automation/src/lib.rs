//! AI decision making: what cities build, how civilizations trade, fight,
//! pray and spend, and the turn loop that ties it together.

pub mod automation;
pub mod city;
pub mod civilization;
pub mod turn_manager;
pub mod unit;

pub use crate::city::construction_automation::{choose_next_construction, ConstructionAutomation};
pub use crate::civilization::motivation_to_attack_automation::{get_closest_cities, motivation_to_attack, CityDistance};
pub use crate::civilization::next_turn_automation::automate_civ_moves;
pub use crate::civilization::trade_automation::{decline_trade_request, get_counteroffer, respond_to_trade_requests};
pub use crate::turn_manager::{next_turn, run_turns};
