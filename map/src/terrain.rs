use rules::Stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    #[default]
    Grassland,
    Plains,
    Desert,
    Hill,
    Mountain,
    Coast,
    Ocean,
}

impl Terrain {
    pub fn is_water(&self) -> bool {
        matches!(self, Terrain::Coast | Terrain::Ocean)
    }

    pub fn is_impassible(&self) -> bool {
        matches!(self, Terrain::Mountain)
    }

    pub fn base_stats(&self) -> Stats {
        match self {
            Terrain::Grassland => Stats { food: 2.0, ..Default::default() },
            Terrain::Plains => Stats { food: 1.0, production: 1.0, ..Default::default() },
            Terrain::Desert => Stats::default(),
            Terrain::Hill => Stats { production: 2.0, ..Default::default() },
            Terrain::Mountain => Stats::default(),
            Terrain::Coast => Stats { food: 1.0, gold: 1.0, ..Default::default() },
            Terrain::Ocean => Stats { food: 1.0, ..Default::default() },
        }
    }
}
