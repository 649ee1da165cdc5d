use crate::building::Building;
use crate::stats::Stat;
use crate::unique::{HasUniques, UniqueType};
use crate::unit::BaseUnit;

/// Why a construction cannot currently be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReasonType {
    AlreadyBuilt,
    Unbuildable,
    UniqueToOtherNation,
    MissingTechnology,
    Obsoleted,
    MissingBuildings,
    MissingResources,
    MissingOtherPrerequisites,
    NoWaterAccess,
    WonderAlreadyBuilt,
    NationalWonderAlreadyBuilt,
    WonderBeingBuiltElsewhere,
}

impl RejectionReasonType {
    pub fn error_message(&self) -> &'static str {
        match self {
            RejectionReasonType::AlreadyBuilt => "Building already built in this city",
            RejectionReasonType::Unbuildable => "Unbuildable",
            RejectionReasonType::UniqueToOtherNation => "Unique to another nation",
            RejectionReasonType::MissingTechnology => "Required technology not researched",
            RejectionReasonType::Obsoleted => "Obsolete",
            RejectionReasonType::MissingBuildings => "Required building missing",
            RejectionReasonType::MissingResources => "Required resource missing",
            RejectionReasonType::MissingOtherPrerequisites => "Other prerequisites missing",
            RejectionReasonType::NoWaterAccess => "No water access",
            RejectionReasonType::WonderAlreadyBuilt => "Wonder already built",
            RejectionReasonType::NationalWonderAlreadyBuilt => "National Wonder already built",
            RejectionReasonType::WonderBeingBuiltElsewhere => "Wonder is being built elsewhere",
        }
    }
}

/// What a buildability check may ask about the city and its owner.
pub trait ConstructionContext {
    fn civ_name(&self) -> &str;
    fn is_tech_researched(&self, tech: &str) -> bool;
    fn has_resource(&self, resource: &str) -> bool;
    /// Built in the city being checked.
    fn has_building(&self, building: &str) -> bool;
    /// Built in any city of the owning civilization.
    fn civ_has_building(&self, building: &str) -> bool;
    /// Built anywhere in the world.
    fn is_wonder_built(&self, building: &str) -> bool;
    /// Currently being constructed by another city of the same civilization.
    fn is_being_built_elsewhere(&self, construction: &str) -> bool;
    /// Whether the owner holds `unique_type`, optionally with a first param equal to `param`.
    fn civ_has_unique(&self, unique_type: UniqueType, param: Option<&str>) -> bool;
    fn religion_enabled(&self) -> bool;
    fn is_coastal(&self) -> bool;
}

/// Stat conversions a city falls back to when there is nothing concrete to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PerpetualConstruction {
    Science,
    Gold,
    Culture,
    Faith,
    Idle,
}

impl PerpetualConstruction {
    pub const ALL: [PerpetualConstruction; 5] = [
        PerpetualConstruction::Science,
        PerpetualConstruction::Gold,
        PerpetualConstruction::Culture,
        PerpetualConstruction::Faith,
        PerpetualConstruction::Idle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PerpetualConstruction::Science => "Science",
            PerpetualConstruction::Gold => "Gold",
            PerpetualConstruction::Culture => "Culture",
            PerpetualConstruction::Faith => "Faith",
            PerpetualConstruction::Idle => "Nothing",
        }
    }

    pub fn from_name(name: &str) -> Option<PerpetualConstruction> {
        PerpetualConstruction::ALL.into_iter().find(|it| it.name() == name)
    }

    /// The stat production is converted into, if any.
    pub fn stat(&self) -> Option<Stat> {
        match self {
            PerpetualConstruction::Science => Some(Stat::Science),
            PerpetualConstruction::Gold => Some(Stat::Gold),
            PerpetualConstruction::Culture => Some(Stat::Culture),
            PerpetualConstruction::Faith => Some(Stat::Faith),
            PerpetualConstruction::Idle => None,
        }
    }

    pub fn is_buildable(&self, context: &dyn ConstructionContext) -> bool {
        match self.stat() {
            None => true,
            Some(stat) => {
                if stat == Stat::Faith && !context.religion_enabled() {
                    return false;
                }
                context.civ_has_unique(UniqueType::EnablesCivWideStatProduction, Some(stat.name()))
            }
        }
    }
}

/// Anything a city can put at the head of its queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Construction<'a> {
    Building(&'a Building),
    Unit(&'a BaseUnit),
    Perpetual(PerpetualConstruction),
}

impl<'a> Construction<'a> {
    pub fn name(&self) -> &str {
        match self {
            Construction::Building(building) => &building.name,
            Construction::Unit(unit) => &unit.name,
            Construction::Perpetual(perpetual) => perpetual.name(),
        }
    }

    pub fn is_perpetual(&self) -> bool {
        matches!(self, Construction::Perpetual(_))
    }

    /// Production needed to complete the construction.
    ///
    /// # Panics
    /// Perpetual conversions never complete, so asking for their cost is a
    /// contract violation.
    pub fn production_cost(&self) -> i32 {
        match self {
            Construction::Building(building) => building.cost,
            Construction::Unit(unit) => unit.cost,
            Construction::Perpetual(perpetual) => {
                panic!("[{}] is a perpetual construction and has no production cost", perpetual.name())
            }
        }
    }

    /// Gold needed to purchase, or `None` when it cannot be bought.
    pub fn gold_cost(&self) -> Option<i32> {
        match self {
            Construction::Building(building) => {
                if building.has_unique(UniqueType::CannotBePurchased) || building.is_any_wonder() {
                    None
                } else {
                    Some(building.base_gold_cost())
                }
            }
            Construction::Unit(unit) => {
                if unit.has_unique(UniqueType::CannotBePurchased) {
                    None
                } else {
                    Some(unit.base_gold_cost())
                }
            }
            Construction::Perpetual(_) => None,
        }
    }

    pub fn matches_filter(&self, filter: &str) -> bool {
        match self {
            Construction::Building(building) => building.matches_filter(filter),
            Construction::Unit(unit) => unit.matches_filter(filter),
            Construction::Perpetual(perpetual) => filter == perpetual.name() || filter == "All",
        }
    }

    pub fn has_unique(&self, unique_type: UniqueType) -> bool {
        match self {
            Construction::Building(building) => building.has_unique(unique_type),
            Construction::Unit(unit) => unit.has_unique(unique_type),
            Construction::Perpetual(_) => false,
        }
    }

    pub fn required_resource(&self) -> Option<&str> {
        match self {
            Construction::Building(building) => building.required_resource.as_deref(),
            Construction::Unit(unit) => unit.required_resource.as_deref(),
            Construction::Perpetual(_) => None,
        }
    }

    pub fn rejection_reasons(&self, context: &dyn ConstructionContext) -> Vec<RejectionReasonType> {
        let mut reasons = Vec::new();
        match self {
            Construction::Building(building) => {
                if building.has_unique(UniqueType::Unbuildable) {
                    reasons.push(RejectionReasonType::Unbuildable);
                }
                if context.has_building(&building.name) {
                    reasons.push(RejectionReasonType::AlreadyBuilt);
                }
                if building.is_wonder && context.is_wonder_built(&building.name) {
                    reasons.push(RejectionReasonType::WonderAlreadyBuilt);
                }
                if building.is_national_wonder && context.civ_has_building(&building.name) {
                    reasons.push(RejectionReasonType::NationalWonderAlreadyBuilt);
                }
                if building.is_any_wonder() && context.is_being_built_elsewhere(&building.name) {
                    reasons.push(RejectionReasonType::WonderBeingBuiltElsewhere);
                }
                if let Some(tech) = &building.required_tech {
                    if !context.is_tech_researched(tech) {
                        reasons.push(RejectionReasonType::MissingTechnology);
                    }
                }
                if let Some(required) = &building.required_building {
                    if !context.has_building(required) {
                        reasons.push(RejectionReasonType::MissingBuildings);
                    }
                }
            }
            Construction::Unit(unit) => {
                if unit.has_unique(UniqueType::Unbuildable) {
                    reasons.push(RejectionReasonType::Unbuildable);
                }
                if let Some(nation) = &unit.unique_to {
                    if nation != context.civ_name() {
                        reasons.push(RejectionReasonType::UniqueToOtherNation);
                    }
                }
                if let Some(tech) = &unit.required_tech {
                    if !context.is_tech_researched(tech) {
                        reasons.push(RejectionReasonType::MissingTechnology);
                    }
                }
                if let Some(tech) = &unit.obsolete_tech {
                    if context.is_tech_researched(tech) {
                        reasons.push(RejectionReasonType::Obsoleted);
                    }
                }
                if unit.is_water_unit() && !context.is_coastal() {
                    reasons.push(RejectionReasonType::NoWaterAccess);
                }
            }
            Construction::Perpetual(perpetual) => {
                if !perpetual.is_buildable(context) {
                    reasons.push(RejectionReasonType::MissingOtherPrerequisites);
                }
                return reasons;
            }
        }

        if let Some(resource) = self.required_resource() {
            if !context.has_resource(resource) {
                reasons.push(RejectionReasonType::MissingResources);
            }
        }
        if self.has_unique(UniqueType::SpaceshipPart)
            && !context.civ_has_unique(UniqueType::EnablesConstructionOfSpaceshipParts, None)
        {
            reasons.push(RejectionReasonType::MissingOtherPrerequisites);
        }
        reasons
    }

    pub fn is_buildable(&self, context: &dyn ConstructionContext) -> bool {
        self.rejection_reasons(context).is_empty()
    }
}
