use serde::{Deserialize, Serialize};

/// Represents the diplomatic status between two civilizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiplomaticStatus {
    /// Peaceful relations between civilizations
    #[default]
    Peace,

    /// City state's diplomacy for major civ can be marked as Protector, not vice versa
    Protector,

    /// At war with each other
    War,
}
