use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// The yield categories a city or civilization produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stat {
    Production,
    Food,
    Gold,
    Science,
    Culture,
    Happiness,
    Faith,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Production,
        Stat::Food,
        Stat::Gold,
        Stat::Science,
        Stat::Culture,
        Stat::Happiness,
        Stat::Faith,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Production => "Production",
            Stat::Food => "Food",
            Stat::Gold => "Gold",
            Stat::Science => "Science",
            Stat::Culture => "Culture",
            Stat::Happiness => "Happiness",
            Stat::Faith => "Faith",
        }
    }

    pub fn from_name(name: &str) -> Option<Stat> {
        Stat::ALL.into_iter().find(|stat| stat.name() == name)
    }
}

/// A bundle of per-turn yields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub production: f32,
    pub food: f32,
    pub gold: f32,
    pub science: f32,
    pub culture: f32,
    pub happiness: f32,
    pub faith: f32,
}

impl Stats {
    pub fn get(&self, stat: Stat) -> f32 {
        match stat {
            Stat::Production => self.production,
            Stat::Food => self.food,
            Stat::Gold => self.gold,
            Stat::Science => self.science,
            Stat::Culture => self.culture,
            Stat::Happiness => self.happiness,
            Stat::Faith => self.faith,
        }
    }

    pub fn add_stat(&mut self, stat: Stat, value: f32) {
        match stat {
            Stat::Production => self.production += value,
            Stat::Food => self.food += value,
            Stat::Gold => self.gold += value,
            Stat::Science => self.science += value,
            Stat::Culture => self.culture += value,
            Stat::Happiness => self.happiness += value,
            Stat::Faith => self.faith += value,
        }
    }

    pub fn is_empty(&self) -> bool {
        Stat::ALL.iter().all(|stat| self.get(*stat) == 0.0)
    }

    pub fn times(&self, factor: f32) -> Stats {
        let mut result = Stats::default();
        for stat in Stat::ALL {
            result.add_stat(stat, self.get(stat) * factor);
        }
        result
    }

    pub fn sum(&self) -> f32 {
        Stat::ALL.iter().map(|stat| self.get(*stat)).sum()
    }
}

impl Add for Stats {
    type Output = Stats;

    fn add(mut self, other: Stats) -> Stats {
        self += other;
        self
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        for stat in Stat::ALL {
            self.add_stat(stat, other.get(stat));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_names_round_trip() {
        for stat in Stat::ALL {
            assert_eq!(Stat::from_name(stat.name()), Some(stat));
        }
        assert_eq!(Stat::from_name("Influence"), None);
    }

    #[test]
    fn test_add_and_empty() {
        let mut stats = Stats::default();
        assert!(stats.is_empty());
        stats.add_stat(Stat::Gold, 2.0);
        let total = stats + Stats { food: 1.0, ..Default::default() };
        assert_eq!(total.gold, 2.0);
        assert_eq!(total.food, 1.0);
        assert_eq!(total.sum(), 3.0);
        assert!(!total.is_empty());
    }
}
