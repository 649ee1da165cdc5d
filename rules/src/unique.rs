use serde::{Deserialize, Serialize};

/// Ruleset abilities the AI reasons about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UniqueType {
    // Units
    FoundCity,
    BuildImprovements,
    CreateWaterImprovements,
    AddInCapital,
    GreatGeneral,
    SpaceshipPart,
    Unbuildable,
    CannotBePurchased,

    // Buildings
    TriggersCulturalVictory,
    TriggersDiplomaticVote,
    EnablesNuclearWeapons,
    EnablesConstructionOfSpaceshipParts,
    UnitStartingExperience,
    RemoveAnnexUnhappiness,
    CarryOverFood,

    // Civilization-wide
    /// Params: the stat city production may be converted to.
    EnablesCivWideStatProduction,
    CityStateCanBeBoughtForGold,
    /// Params: percentage of luxury happiness kept after trading the last copy away.
    RetainHappinessFromLuxury,
    EnablesResearchAgreements,
    EnablesOpenBorders,

    // Mod options
    /// Params: gold value of introducing another civilization.
    TradeCivIntroductions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unique {
    #[serde(rename = "type")]
    pub unique_type: UniqueType,
    #[serde(default)]
    pub params: Vec<String>,
}

impl Unique {
    pub fn new(unique_type: UniqueType, params: &[&str]) -> Self {
        Unique {
            unique_type,
            params: params.iter().map(|it| it.to_string()).collect(),
        }
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(|it| it.as_str())
    }

    pub fn param_f32(&self, index: usize) -> Option<f32> {
        self.param(index).and_then(|it| it.parse().ok())
    }
}

/// Anything that carries a list of uniques.
pub trait HasUniques {
    fn uniques(&self) -> &[Unique];

    fn has_unique(&self, unique_type: UniqueType) -> bool {
        self.uniques().iter().any(|it| it.unique_type == unique_type)
    }

    fn get_matching_uniques(&self, unique_type: UniqueType) -> Vec<&Unique> {
        self.uniques()
            .iter()
            .filter(|it| it.unique_type == unique_type)
            .collect()
    }
}

impl HasUniques for Vec<Unique> {
    fn uniques(&self) -> &[Unique] {
        self
    }
}
