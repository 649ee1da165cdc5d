pub mod belief;
pub mod building;
pub mod construction;
pub mod policy;
pub mod ruleset;
pub mod stats;
pub mod tech;
pub mod tile_resource;
pub mod unique;
pub mod unit;
pub mod victory;

pub use belief::{Belief, BeliefType};
pub use building::Building;
pub use construction::{Construction, ConstructionContext, PerpetualConstruction, RejectionReasonType};
pub use policy::{Policy, PolicyBranch};
pub use ruleset::Ruleset;
pub use stats::{Stat, Stats};
pub use tech::Technology;
pub use tile_resource::{ResourceType, TileResource};
pub use unique::{HasUniques, Unique, UniqueType};
pub use unit::{BaseUnit, UnitType};
pub use victory::{Milestone, MilestoneType, Victory, VictoryFocus};
