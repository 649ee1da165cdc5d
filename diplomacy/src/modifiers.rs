use serde::{Deserialize, Serialize};

/// Lasting opinion adjustments; their sum is the opinion of the other civ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiplomaticModifiers {
    DeclaredWarOnUs,
    WarMongerer,
    RefusedToNotSettleCitiesNearUs,
    BetrayedPromiseToNotSettleCitiesNearUs,
    Denunciation,
    BetrayedDeclarationOfFriendship,
    UnacceptableDemands,
    YearsOfPeace,
    SharedEnemy,
    DeclarationOfFriendship,
    OpenBorders,
    FulfilledPromiseToNotSettleCitiesNearUs,
    GaveUsGifts,
    BulliedProtectedMinor,
}

impl DiplomaticModifiers {
    pub fn text(&self) -> &'static str {
        match self {
            DiplomaticModifiers::DeclaredWarOnUs => "You declared war on us!",
            DiplomaticModifiers::WarMongerer => "Your warmongering ways are unacceptable to us.",
            DiplomaticModifiers::RefusedToNotSettleCitiesNearUs => {
                "You refused to stop settling cities near us"
            }
            DiplomaticModifiers::BetrayedPromiseToNotSettleCitiesNearUs => {
                "You betrayed your promise to not settle cities near us"
            }
            DiplomaticModifiers::Denunciation => "You have publicly denounced us!",
            DiplomaticModifiers::BetrayedDeclarationOfFriendship => {
                "Your so-called 'friendship' is worth nothing."
            }
            DiplomaticModifiers::UnacceptableDemands => "Your arrogant demands are in bad taste",
            DiplomaticModifiers::YearsOfPeace => "Years of peace have strengthened our relations.",
            DiplomaticModifiers::SharedEnemy => "Our mutual military struggle brings us closer together.",
            DiplomaticModifiers::DeclarationOfFriendship => "We have signed a public declaration of friendship",
            DiplomaticModifiers::OpenBorders => "Our open borders have brought us closer together.",
            DiplomaticModifiers::FulfilledPromiseToNotSettleCitiesNearUs => {
                "You fulfilled your promise to stop settling cities near us!"
            }
            DiplomaticModifiers::GaveUsGifts => "We appreciate your gifts",
            DiplomaticModifiers::BulliedProtectedMinor => "You demanded tribute from City-States that are under our protection!",
        }
    }

    /// Modifiers that fade by this much each turn.
    pub fn decay_per_turn(&self) -> f32 {
        match self {
            DiplomaticModifiers::DeclarationOfFriendship
            | DiplomaticModifiers::OpenBorders
            | DiplomaticModifiers::YearsOfPeace
            | DiplomaticModifiers::SharedEnemy => 0.0,
            DiplomaticModifiers::GaveUsGifts => 1.0,
            _ => 0.5,
        }
    }
}
