pub mod policy_manager;
pub mod religion_manager;
pub mod tech_manager;
pub mod victory_manager;

pub use policy_manager::PolicyManager;
pub use religion_manager::{Religion, ReligionManager, ReligionState};
pub use tech_manager::TechManager;
pub use victory_manager::VictoryManager;
