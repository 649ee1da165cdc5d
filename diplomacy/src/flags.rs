use serde::{Deserialize, Serialize};

/// Timed markers on one side of a relation. Each counts down once per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiplomacyFlags {
    DeclinedLuxExchange,
    DeclinedPeace,
    DeclinedResearchAgreement,
    /// Set on both sides after a declaration; blocks another one until it expires.
    DeclaredWar,
    DeclarationOfFriendship,
    ResearchAgreement,
    SettledCitiesNearUs,
    AgreedToNotSettleNearUs,
    IgnoreThemSettlingNearUs,
    Denunciation,
    RecentlyPledgedProtection,
    RecentlyWithdrewProtection,
    Bullied,
    MarriageCooldown,
    BorderConflict,
}
