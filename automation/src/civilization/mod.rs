pub mod motivation_to_attack_automation;
pub mod next_turn_automation;
pub mod religion_automation;
pub mod trade_automation;
pub mod use_gold_automation;
