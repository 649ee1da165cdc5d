pub mod diplomacy_manager;
pub mod flags;
pub mod modifiers;
pub mod relationship_level;
pub mod status;

pub use diplomacy_manager::{DiplomacyManager, DiplomacyTurnOutcome};
pub use flags::DiplomacyFlags;
pub use modifiers::DiplomaticModifiers;
pub use relationship_level::RelationshipLevel;
pub use status::DiplomaticStatus;
