use serde::{Deserialize, Serialize};

use crate::stats::{Stat, Stats};
use crate::unique::{HasUniques, Unique};

/// A city improvement or wonder from the ruleset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Building {
    pub name: String,
    pub cost: i32,
    pub is_wonder: bool,
    pub is_national_wonder: bool,
    pub stats: Stats,
    /// Percentage bonuses applied to the city's yields.
    pub percent_stat_bonus: Stats,
    pub city_strength: i32,
    pub city_health: i32,
    pub required_tech: Option<String>,
    pub required_building: Option<String>,
    pub required_resource: Option<String>,
    pub hurry_cost_modifier: i32,
    pub uniques: Vec<Unique>,
}

impl Building {
    pub fn is_any_wonder(&self) -> bool {
        self.is_wonder || self.is_national_wonder
    }

    /// Whether the building yields or boosts `stat` in any way.
    pub fn is_stat_related(&self, stat: Stat) -> bool {
        self.stats.get(stat) > 0.0 || self.percent_stat_bonus.get(stat) > 0.0
    }

    pub fn matches_filter(&self, filter: &str) -> bool {
        match filter {
            "All" => true,
            "Building" | "Buildings" => !self.is_any_wonder(),
            "Wonder" | "Wonders" => self.is_any_wonder(),
            "World Wonder" => self.is_wonder,
            "National Wonder" => self.is_national_wonder,
            _ if filter == self.name => true,
            _ => Stat::from_name(filter).is_some_and(|stat| self.is_stat_related(stat)),
        }
    }

    /// Gold needed to buy the building outright.
    pub fn base_gold_cost(&self) -> i32 {
        let cost = (30.0 * self.cost as f32).powf(0.75) * (1.0 + self.hurry_cost_modifier as f32 / 100.0);
        (cost / 10.0) as i32 * 10
    }
}

impl HasUniques for Building {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}
