use serde::{Deserialize, Serialize};
use util::HexCoord;

use crate::terrain::Terrain;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub position: HexCoord,
    pub terrain: Terrain,
    pub resource: Option<String>,
    /// Copies of a strategic resource the tile yields.
    pub resource_amount: i32,
    pub improvement: Option<String>,
    /// Name of the owning civilization.
    pub owner: Option<String>,
    /// Id of the city the tile belongs to.
    pub owning_city: Option<String>,
    pub is_city_center: bool,
}

impl Tile {
    pub fn new(position: HexCoord, terrain: Terrain) -> Self {
        Tile {
            position,
            terrain,
            ..Default::default()
        }
    }

    pub fn is_water(&self) -> bool {
        self.terrain.is_water()
    }

    pub fn is_land(&self) -> bool {
        !self.is_water()
    }

    pub fn is_impassible(&self) -> bool {
        self.terrain.is_impassible()
    }

    pub fn get_owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn is_owned_by(&self, civ_name: &str) -> bool {
        self.get_owner() == Some(civ_name)
    }

    pub fn aerial_distance_to(&self, other: &Tile) -> i32 {
        self.position.aerial_distance_to(&other.position)
    }
}
