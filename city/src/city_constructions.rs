use std::collections::{BTreeMap, BTreeSet};

use rules::{Construction, PerpetualConstruction, Ruleset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// City constructions manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityConstructions {
    /// Built buildings
    pub built_buildings: BTreeSet<String>,

    /// Production invested so far, by construction name
    pub in_progress_constructions: BTreeMap<String, i32>,

    /// Construction queue; the head is the current construction
    pub construction_queue: Vec<String>,

    /// Production overflow from the last completed construction
    pub production_overflow: i32,
}

impl CityConstructions {
    pub fn new() -> Self {
        CityConstructions::default()
    }

    /// Name of the current construction; the idle conversion when the queue is empty.
    pub fn current_construction_name(&self) -> &str {
        self.construction_queue
            .first()
            .map(|it| it.as_str())
            .unwrap_or(PerpetualConstruction::Idle.name())
    }

    /// Gets the current construction, falling back to idle for unknown names
    pub fn get_current_construction<'a>(&self, ruleset: &'a Ruleset) -> Construction<'a> {
        ruleset
            .get_construction(self.current_construction_name())
            .unwrap_or(Construction::Perpetual(PerpetualConstruction::Idle))
    }

    /// Replaces the head of the queue
    pub fn set_current_construction(&mut self, name: &str) {
        if self.construction_queue.is_empty() {
            self.construction_queue.push(name.to_string());
        } else {
            self.construction_queue[0] = name.to_string();
        }
    }

    pub fn add_to_queue(&mut self, name: &str) {
        self.construction_queue.push(name.to_string());
    }

    pub fn clear_queue(&mut self) {
        self.construction_queue.clear();
    }

    /// Checks if a building is built
    pub fn is_built(&self, building_name: &str) -> bool {
        self.built_buildings.contains(building_name)
    }

    /// Checks if a construction is being constructed
    pub fn is_being_constructed(&self, construction_name: &str) -> bool {
        self.current_construction_name() == construction_name
    }

    /// Checks if building a wonder
    pub fn is_building_wonder(&self, ruleset: &Ruleset) -> bool {
        match self.get_current_construction(ruleset) {
            Construction::Building(building) => building.is_wonder,
            _ => false,
        }
    }

    /// Gets work done for a construction
    pub fn get_work_done(&self, construction_name: &str) -> i32 {
        self.in_progress_constructions
            .get(construction_name)
            .copied()
            .unwrap_or(0)
    }

    /// Production still needed; zero for perpetual conversions and unknown names
    pub fn get_remaining_work(&self, construction_name: &str, ruleset: &Ruleset) -> i32 {
        match ruleset.get_construction(construction_name) {
            Some(construction) if !construction.is_perpetual() => {
                construction.production_cost() - self.get_work_done(construction_name)
            }
            _ => 0,
        }
    }

    /// Gets turns to construction at the given production per turn
    pub fn turns_to_construction(&self, construction_name: &str, ruleset: &Ruleset, production: f32) -> i32 {
        let work_left = self.get_remaining_work(construction_name, ruleset);
        if work_left <= 0 {
            0
        } else if work_left <= self.production_overflow {
            1
        } else {
            ((work_left - self.production_overflow) as f32 / production.max(1.0)).ceil() as i32
        }
    }

    pub fn add_building(&mut self, building_name: &str) {
        self.built_buildings.insert(building_name.to_string());
    }

    pub fn remove_building(&mut self, building_name: &str) -> bool {
        self.built_buildings.remove(building_name)
    }

    /// Adds production to the current construction.
    ///
    /// Returns the name of the construction when it completes; the caller is
    /// responsible for placing the building or unit.
    pub fn add_production_points(&mut self, production: i32, ruleset: &Ruleset) -> Option<String> {
        let construction = self.get_current_construction(ruleset);
        if construction.is_perpetual() {
            return None;
        }
        let name = construction.name().to_string();
        let cost = construction.production_cost();
        let invested = self.get_work_done(&name) + production + self.production_overflow;
        self.production_overflow = 0;
        if invested < cost {
            self.in_progress_constructions.insert(name, invested);
            return None;
        }
        self.production_overflow = invested - cost;
        self.complete_current_construction();
        debug!(construction = %name, "Construction completed");
        Some(name)
    }

    /// Removes the head of the queue and its invested production.
    pub fn complete_current_construction(&mut self) -> Option<String> {
        if self.construction_queue.is_empty() {
            return None;
        }
        let name = self.construction_queue.remove(0);
        self.in_progress_constructions.remove(&name);
        Some(name)
    }
}
