use serde::{Deserialize, Serialize};

use crate::stats::Stats;
use crate::unique::{HasUniques, Unique};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ResourceType {
    #[default]
    Bonus,
    Luxury,
    Strategic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TileResource {
    pub name: String,
    pub resource_type: ResourceType,
    /// Extra yields of the tile once improved.
    pub stats: Stats,
    pub improvement: Option<String>,
    pub uniques: Vec<Unique>,
}

impl TileResource {
    pub fn is_tradable(&self) -> bool {
        self.resource_type != ResourceType::Bonus
    }
}

impl HasUniques for TileResource {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}
