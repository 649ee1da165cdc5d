use rules::{Stat, Stats};
use serde::{Deserialize, Serialize};

/// Which yields population assignment favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CityFocus {
    #[default]
    NoFocus,
    FoodFocus,
    ProductionFocus,
    GoldFocus,
    ScienceFocus,
    CultureFocus,
}

impl CityFocus {
    pub fn stat(&self) -> Option<Stat> {
        match self {
            CityFocus::NoFocus => None,
            CityFocus::FoodFocus => Some(Stat::Food),
            CityFocus::ProductionFocus => Some(Stat::Production),
            CityFocus::GoldFocus => Some(Stat::Gold),
            CityFocus::ScienceFocus => Some(Stat::Science),
            CityFocus::CultureFocus => Some(Stat::Culture),
        }
    }

    /// Weighted worth of a tile's yields.
    pub fn rank(&self, stats: &Stats) -> f32 {
        let mut rank = 0.0;
        for stat in Stat::ALL {
            let mut weight = match stat {
                Stat::Food | Stat::Production => 1.0,
                Stat::Gold => 0.7,
                Stat::Happiness => 0.0,
                _ => 0.5,
            };
            if self.stat() == Some(stat) {
                weight *= 3.0;
            }
            rank += stats.get(stat) * weight;
        }
        rank
    }
}
