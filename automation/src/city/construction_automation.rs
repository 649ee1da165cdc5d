use std::collections::HashMap;

use city::City;
use civilization::{CityBuildContext, Civilization, GameInfo, NotificationCategory, PlayerType};
use map::Bfs;
use rules::{
    BaseUnit, Building, Construction, HasUniques, MilestoneType, PerpetualConstruction, Ruleset, Stat,
    UniqueType, VictoryFocus,
};
use tracing::debug;

use crate::automation::{afraid_of_barbarians, allow_automated_construction, choose_military_unit};
use crate::civilization::motivation_to_attack_automation::get_closest_cities;

/// Wonders a culture-focused civ goes out of its way for.
const CULTURE_WONDERS: [&str; 5] = [
    "Sistine Chapel",
    "Eiffel Tower",
    "Cristo Redentor",
    "Neuschwanstein",
    "Sydney Opera House",
];

/// Candidates finishing within this many turns beat any slower candidate.
const SHORT_TERM_TURNS: f32 = 30.0;

/// Picks what a city builds next once it idles on a perpetual conversion.
pub struct ConstructionAutomation<'a> {
    game: &'a GameInfo,
    ruleset: &'a Ruleset,
    civ: &'a Civilization,
    city: &'a City,
    context: CityBuildContext<'a>,
    relative_cost_effectiveness: Vec<ConstructionChoice>,
    buildable_buildings: HashMap<String, bool>,
    buildable_units: HashMap<String, bool>,
    military_units: usize,
    workers: f32,
    cities: usize,
    all_techs_are_researched: bool,
    is_at_war: bool,
    buildings_for_victory: Vec<String>,
    city_is_over_average_production: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionChoice {
    pub choice: String,
    pub choice_modifier: f32,
    pub remaining_work: i32,
    pub production: f32,
}

impl<'a> ConstructionAutomation<'a> {
    pub fn new(game: &'a GameInfo, civ: &'a Civilization, city: &'a City) -> Self {
        let ruleset: &'a Ruleset = &game.ruleset;
        let military_units = civ.units.iter().filter(|it| it.is_military()).count();
        let workers = civ
            .units
            .iter()
            .filter(|it| it.is_civilian() && it.has_unique(UniqueType::BuildImprovements))
            .count() as f32;
        let buildings_for_victory = game
            .next_milestones(civ)
            .into_iter()
            .filter(|it| {
                matches!(
                    it.milestone_type,
                    MilestoneType::BuiltBuilding | MilestoneType::BuildingBuiltGlobally
                )
            })
            .map(|it| it.param.clone())
            .collect();
        let average_production = if civ.cities.is_empty() {
            0.0
        } else {
            civ.cities.iter().map(|it| it.current_stats.production).sum::<f32>() / civ.cities.len() as f32
        };

        ConstructionAutomation {
            game,
            ruleset,
            civ,
            city,
            context: CityBuildContext::new(game, civ, city),
            relative_cost_effectiveness: Vec::new(),
            buildable_buildings: HashMap::new(),
            buildable_units: HashMap::new(),
            military_units,
            workers,
            cities: civ.cities.len(),
            all_techs_are_researched: civ.tech.all_techs_are_researched(ruleset),
            is_at_war: civ.is_at_war(),
            buildings_for_victory,
            city_is_over_average_production: city.current_stats.production >= average_production,
        }
    }

    fn production(&self) -> f32 {
        self.city.current_stats.production
    }

    fn add_choice(&mut self, choice: &str, choice_modifier: f32) {
        let remaining_work = self
            .city
            .city_constructions
            .get_remaining_work(choice, self.ruleset);
        self.relative_cost_effectiveness.push(ConstructionChoice {
            choice: choice.to_string(),
            choice_modifier,
            remaining_work,
            production: self.production(),
        });
    }

    /// Buildability is expensive and cannot change within one pass.
    fn is_buildable(&mut self, construction: Construction<'a>) -> bool {
        let cache = match construction {
            Construction::Unit(_) => &mut self.buildable_units,
            _ => &mut self.buildable_buildings,
        };
        if let Some(buildable) = cache.get(construction.name()) {
            return *buildable;
        }
        let buildable = construction.is_buildable(&self.context);
        cache.insert(construction.name().to_string(), buildable);
        buildable
    }

    fn allowed(&self, construction: Construction<'a>) -> bool {
        allow_automated_construction(self.game, self.civ, construction)
    }

    fn non_wonders(&self) -> Vec<&'a Building> {
        let ruleset = self.ruleset;
        ruleset.buildings.iter().filter(|it| !it.is_any_wonder()).collect()
    }

    fn automatable_non_wonders(&self) -> Vec<&'a Building> {
        self.non_wonders()
            .into_iter()
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect()
    }

    fn stat_buildings(&self) -> Vec<&'a Building> {
        self.non_wonders()
            .into_iter()
            .filter(|it| !(it.stats.is_empty() && it.percent_stat_bonus.is_empty()))
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect()
    }

    /// The cheapest buildable building, first in catalog order on ties.
    fn cheapest_building(&mut self, candidates: Vec<&'a Building>) -> Option<&'a Building> {
        let mut best: Option<&'a Building> = None;
        for building in candidates {
            if !self.is_buildable(Construction::Building(building)) {
                continue;
            }
            if best.map_or(true, |it| building.cost < it.cost) {
                best = Some(building);
            }
        }
        best
    }

    fn cheapest_unit(&mut self, unique_type: UniqueType) -> Option<&'a BaseUnit> {
        let ruleset = self.ruleset;
        let mut best: Option<&'a BaseUnit> = None;
        for unit in ruleset.units.iter().filter(|it| it.has_unique(unique_type)) {
            if !self.allowed(Construction::Unit(unit)) || !self.is_buildable(Construction::Unit(unit)) {
                continue;
            }
            if best.map_or(true, |it| unit.cost < it.cost) {
                best = Some(unit);
            }
        }
        best
    }

    /// Scores every category and returns the winner, or `None` when the
    /// city is already building something concrete.
    pub fn choose(mut self) -> Option<String> {
        if !self
            .city
            .city_constructions
            .get_current_construction(self.ruleset)
            .is_perpetual()
        {
            return None;
        }

        self.add_food_building_choice();
        self.add_production_building_choice();
        self.add_gold_building_choice();
        self.add_science_building_choice();
        self.add_happiness_building_choice();
        self.add_defence_building_choice();
        self.add_unit_training_building_choice();
        self.add_culture_building_choice();
        self.add_other_building_choice();

        if !self.city.is_puppet {
            self.add_spaceship_part_choice();
            self.add_wonders_choice();
            self.add_worker_choice();
            self.add_work_boat_choice();
            self.add_military_unit_choice();
        }

        Some(self.select())
    }

    fn select(&mut self) -> String {
        let production = self.production();
        if self.relative_cost_effectiveness.is_empty() {
            return self.choose_perpetual_construction();
        }
        let short_term = |it: &ConstructionChoice| (it.remaining_work as f32) < production * SHORT_TERM_TURNS;
        if self.relative_cost_effectiveness.iter().any(short_term) {
            self.relative_cost_effectiveness.retain(short_term);
            first_min_by(&self.relative_cost_effectiveness, |it| {
                it.remaining_work as f32 / it.choice_modifier
            })
        } else {
            // A young city cannot plan this far ahead; go for the cheapest.
            first_min_by(&self.relative_cost_effectiveness, |it| it.remaining_work as f32)
        }
    }

    fn choose_perpetual_construction(&self) -> String {
        if PerpetualConstruction::Science.is_buildable(&self.context) && !self.all_techs_are_researched {
            PerpetualConstruction::Science.name().to_string()
        } else if PerpetualConstruction::Gold.is_buildable(&self.context) {
            PerpetualConstruction::Gold.name().to_string()
        } else {
            PerpetualConstruction::Idle.name().to_string()
        }
    }

    fn add_food_building_choice(&mut self) {
        let candidates = self
            .non_wonders()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Food) || it.has_unique(UniqueType::CarryOverFood))
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect();
        if let Some(food_building) = self.cheapest_building(candidates) {
            let modifier = if self.city.population < 5 { 1.3 } else { 1.0 };
            self.add_choice(&food_building.name, modifier);
        }
    }

    fn add_production_building_choice(&mut self) {
        let candidates = self
            .stat_buildings()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Production))
            .collect();
        if let Some(production_building) = self.cheapest_building(candidates) {
            self.add_choice(&production_building.name, 1.5);
        }
    }

    fn add_gold_building_choice(&mut self) {
        let candidates = self
            .stat_buildings()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Gold))
            .collect();
        if let Some(gold_building) = self.cheapest_building(candidates) {
            let modifier = if self.civ.stats_for_next_turn.gold < 0.0 { 3.0 } else { 1.2 };
            self.add_choice(&gold_building.name, modifier);
        }
    }

    fn add_science_building_choice(&mut self) {
        if self.all_techs_are_researched {
            return;
        }
        let candidates = self
            .stat_buildings()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Science))
            .collect();
        if let Some(science_building) = self.cheapest_building(candidates) {
            let mut modifier = 1.1;
            if self.civ.wants_to_focus_on(VictoryFocus::Science) {
                modifier *= 1.4;
            }
            self.add_choice(&science_building.name, modifier);
        }
    }

    fn add_happiness_building_choice(&mut self) {
        let candidates = self
            .non_wonders()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Happiness) || it.has_unique(UniqueType::RemoveAnnexUnhappiness))
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect();
        if let Some(happiness_building) = self.cheapest_building(candidates) {
            let civ_happiness = self.civ.happiness;
            let mut modifier = 1.0;
            if civ_happiness > 5 {
                modifier = 0.5;
            }
            if civ_happiness < 0 {
                modifier = 3.0;
            } else if happiness_building.has_unique(UniqueType::RemoveAnnexUnhappiness) {
                modifier = 2.0;
            }
            self.add_choice(&happiness_building.name, modifier);
        }
    }

    fn add_defence_building_choice(&mut self) {
        let candidates = self
            .non_wonders()
            .into_iter()
            .filter(|it| it.city_strength > 0)
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect();
        let Some(defensive_building) = self.cheapest_building(candidates) else {
            return;
        };
        if !self.is_at_war && self.civ.wants_to_focus_on(VictoryFocus::Culture) {
            return;
        }
        let mut modifier = if self.is_at_war { 0.5 } else { 0.2 };

        // The closest city to a neighbour is the likeliest target
        let is_frontier_city = self
            .civ
            .get_known_civ_names()
            .filter_map(|name| self.game.get_civilization(name))
            .filter_map(|other| get_closest_cities(self.civ, other))
            .any(|it| it.city1.id == self.city.id);
        if is_frontier_city {
            modifier *= 1.5;
        }
        self.add_choice(&defensive_building.name, modifier);
    }

    fn add_unit_training_building_choice(&mut self) {
        let candidates = self
            .non_wonders()
            .into_iter()
            .filter(|it| it.has_unique(UniqueType::UnitStartingExperience))
            .filter(|it| self.allowed(Construction::Building(*it)))
            .collect();
        let Some(unit_training_building) = self.cheapest_building(candidates) else {
            return;
        };
        if self.civ.wants_to_focus_on(VictoryFocus::Culture) && !self.is_at_war {
            return;
        }
        let mut modifier = if self.city_is_over_average_production { 0.5 } else { 0.1 };
        if self.is_at_war {
            modifier *= 2.0;
        }
        if self.civ.wants_to_focus_on(VictoryFocus::Military) {
            modifier *= 1.3;
        }
        self.add_choice(&unit_training_building.name, modifier);
    }

    fn add_culture_building_choice(&mut self) {
        let candidates = self
            .stat_buildings()
            .into_iter()
            .filter(|it| it.is_stat_related(Stat::Culture))
            .collect();
        if let Some(culture_building) = self.cheapest_building(candidates) {
            let mut modifier = 0.5;
            if self.city.current_stats.culture == 0.0 {
                modifier = 0.8;
            }
            if self.civ.wants_to_focus_on(VictoryFocus::Culture) {
                modifier = 1.6;
            }
            self.add_choice(&culture_building.name, modifier);
        }
    }

    fn add_other_building_choice(&mut self) {
        let candidates = self.automatable_non_wonders();
        if let Some(other_building) = self.cheapest_building(candidates) {
            self.add_choice(&other_building.name, 0.6);
        }
    }

    fn add_spaceship_part_choice(&mut self) {
        if !self
            .civ
            .has_unique(self.ruleset, UniqueType::EnablesConstructionOfSpaceshipParts)
        {
            return;
        }
        let ruleset = self.ruleset;
        let space_resources = ruleset.space_resources();
        let parts: Vec<Construction<'a>> = ruleset
            .buildings
            .iter()
            .filter(|it| !it.is_any_wonder())
            .map(Construction::Building)
            .chain(ruleset.units.iter().map(Construction::Unit))
            .filter(|it| space_resources.contains(it.name()))
            .collect();
        for part in parts {
            if self.is_buildable(part) {
                self.add_choice(part.name(), 2.0);
                return;
            }
        }
    }

    fn get_wonder_priority(&self, wonder: &Building) -> f32 {
        // Only the city that would finish it soonest goes for the win
        if wonder.has_unique(UniqueType::TriggersCulturalVictory) && self.finishes_soonest(&wonder.name) {
            return 10.0;
        }
        if self.buildings_for_victory.iter().any(|it| *it == wonder.name) {
            return 5.0;
        }
        if self.civ.wants_to_focus_on(VictoryFocus::Culture) && CULTURE_WONDERS.contains(&wonder.name.as_str()) {
            return 3.0;
        }
        if wonder.is_stat_related(Stat::Science) {
            if self.all_techs_are_researched {
                return 0.5;
            }
            return if self.civ.wants_to_focus_on(VictoryFocus::Science) { 1.5 } else { 1.3 };
        }
        if wonder.has_unique(UniqueType::EnablesNuclearWeapons) {
            return if self.civ.wants_to_focus_on(VictoryFocus::Military) { 2.0 } else { 1.3 };
        }
        if wonder.is_stat_related(Stat::Happiness) {
            return 1.2;
        }
        if wonder.is_stat_related(Stat::Production) {
            return 1.1;
        }
        1.0
    }

    fn finishes_soonest(&self, wonder: &str) -> bool {
        let mut soonest: Option<(&City, i32)> = None;
        for city in &self.civ.cities {
            let turns = city.city_constructions.turns_to_construction(
                wonder,
                self.ruleset,
                city.current_stats.production,
            );
            if soonest.map_or(true, |(_, best)| turns < best) {
                soonest = Some((city, turns));
            }
        }
        soonest.is_some_and(|(city, _)| city.id == self.city.id)
    }

    fn add_wonders_choice(&mut self) {
        let ruleset = self.ruleset;
        let mut highest_priority: Option<(&'a Building, f32)> = None;
        for wonder in ruleset.buildings.iter().filter(|it| it.is_any_wonder()) {
            if !self.allowed(Construction::Building(wonder)) || !self.is_buildable(Construction::Building(wonder)) {
                continue;
            }
            let priority = self.get_wonder_priority(wonder);
            if highest_priority.map_or(true, |(_, best)| priority > best) {
                highest_priority = Some((wonder, priority));
            }
        }
        let Some((wonder, priority)) = highest_priority else {
            return;
        };

        let cities_building_wonders = self
            .civ
            .cities
            .iter()
            .filter(|it| it.city_constructions.is_building_wonder(ruleset))
            .count();
        let mut modifier = 2.0 * priority / (cities_building_wonders + 1) as f32;
        if !self.city_is_over_average_production {
            modifier /= 5.0;
        }
        self.add_choice(&wonder.name, modifier);
    }

    fn add_worker_choice(&mut self) {
        let Some(worker) = self.cheapest_unit(UniqueType::BuildImprovements) else {
            return;
        };
        // One worker per city for the first three, then a few more for large empires
        let number_of_workers_we_want = if self.cities < 4 {
            self.cities
        } else {
            (self.cities / 3).max(3)
        } as f32;

        if self.workers < number_of_workers_we_want {
            let mut modifier = number_of_workers_we_want / (self.workers + 0.1);
            if !self.city_is_over_average_production {
                modifier /= 5.0;
            }
            self.add_choice(&worker.name, modifier);
        }
    }

    fn add_work_boat_choice(&mut self) {
        let Some(work_boat) = self.cheapest_unit(UniqueType::CreateWaterImprovements) else {
            return;
        };
        let game = self.game;
        let already_has_work_boat = self.city.get_tiles(&game.tile_map).any(|tile| {
            game.units_at(&tile.position)
                .any(|it| it.is_civilian() && it.has_unique(UniqueType::CreateWaterImprovements))
        });
        if already_has_work_boat {
            return;
        }

        let civ_name = self.civ.civ_name.as_str();
        let mut bfs = Bfs::new(&game.tile_map, self.city.location, |tile| {
            (tile.is_water() || tile.is_city_center) && tile.is_owned_by(civ_name)
        });
        for _ in 0..10 {
            bfs.next_step();
        }
        let has_resource_to_improve = bfs.get_reached_tiles().any(|tile| {
            tile.improvement.is_none()
                && tile.is_owned_by(civ_name)
                && tile
                    .resource
                    .as_deref()
                    .and_then(|it| self.ruleset.get_tile_resource(it))
                    .is_some_and(|it| it.improvement.is_some())
        });
        if !has_resource_to_improve {
            return;
        }
        self.add_choice(&work_boat.name, 0.6);
    }

    fn add_military_unit_choice(&mut self) {
        // Infrastructure first
        if !self.is_at_war && !self.city_is_over_average_production {
            return;
        }
        if !self.is_at_war
            && (self.civ.stats_for_next_turn.gold < 0.0 || self.military_units > (self.cities * 2).max(5))
        {
            return;
        }
        if self.civ.gold < -50 {
            return;
        }
        let Some(military_unit) = choose_military_unit(self.game, self.civ, self.city) else {
            return;
        };

        let units_to_cities_ratio = self.cities as f32 / (self.military_units + 1) as f32;
        let mut modifier = units_to_cities_ratio.sqrt() / 2.0;
        if self.civ.wants_to_focus_on(VictoryFocus::Military) || self.is_at_war {
            modifier *= 2.0;
        }
        if afraid_of_barbarians(self.game, self.civ) {
            modifier = 2.0;
        }
        if !self.city_is_over_average_production {
            modifier /= 5.0;
        }
        if self.has_idle_settler_at_center() {
            modifier = 5.0;
        }
        if self.civ.player_type == PlayerType::Human {
            modifier /= 2.0;
        }
        self.add_choice(&military_unit, modifier);
    }

    /// A settler waits on the city center with no military unit of ours nearby.
    fn has_idle_settler_at_center(&self) -> bool {
        let location = self.city.location;
        let settler_waiting = self
            .game
            .units_at(&location)
            .any(|it| it.is_civilian() && it.has_unique(UniqueType::FoundCity));
        settler_waiting
            && !self
                .civ
                .units
                .iter()
                .any(|it| it.is_military() && it.position.aerial_distance_to(&location) <= 5)
    }
}

/// Name of the first choice with the lowest key.
fn first_min_by(choices: &[ConstructionChoice], key: impl Fn(&ConstructionChoice) -> f32) -> String {
    let mut best: Option<(&ConstructionChoice, f32)> = None;
    for choice in choices {
        let value = key(choice);
        if best.map_or(true, |(_, best_value)| value < best_value) {
            best = Some((choice, value));
        }
    }
    best.map(|(it, _)| it.choice.clone())
        .unwrap_or_else(|| PerpetualConstruction::Idle.name().to_string())
}

/// Picks and commits the next construction of `city_id`, notifying its owner.
pub fn choose_next_construction(game: &mut GameInfo, civ_name: &str, city_id: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let Some(city) = civ.get_city(city_id) else {
        return;
    };
    let Some(chosen) = ConstructionAutomation::new(game, civ, city).choose() else {
        return;
    };
    debug!(civ = %civ_name, city = %city.name, construction = %chosen, "Chose next construction");

    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    civ.add_notification(&format!("Work has started on [{}]", chosen), NotificationCategory::Production);
    if let Some(city) = civ.get_city_mut(city_id) {
        city.city_constructions.set_current_construction(&chosen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, add_units, GameBuilder};
    use rules::{Technology, Unique};
    use util::HexCoord;

    fn current(game: &GameInfo, civ_name: &str, city_id: &str) -> String {
        game.get_civilization(civ_name)
            .unwrap()
            .get_city(city_id)
            .unwrap()
            .city_constructions
            .current_construction_name()
            .to_string()
    }

    #[test]
    fn test_science_conversion_without_candidates() {
        let ruleset = Ruleset {
            technologies: vec![Technology {
                name: "Agriculture".to_string(),
                cost: 20,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut game = GameBuilder::new().ruleset(ruleset).major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        game.get_civilization_mut("Rome")
            .unwrap()
            .nation_uniques
            .push(Unique::new(UniqueType::EnablesCivWideStatProduction, &["Science"]));

        choose_next_construction(&mut game, "Rome", &city_id);

        assert_eq!(current(&game, "Rome", &city_id), "Science");
    }

    #[test]
    fn test_idle_when_nothing_buildable_and_no_conversions() {
        let mut game = GameBuilder::new().ruleset(Ruleset::default()).major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());

        choose_next_construction(&mut game, "Rome", &city_id);

        assert_eq!(current(&game, "Rome", &city_id), "Nothing");
    }

    #[test]
    fn test_buildings_without_stats_are_still_chosen() {
        let ruleset = Ruleset {
            buildings: vec![Building {
                name: "Courthouse".to_string(),
                cost: 100,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut game = GameBuilder::new().ruleset(ruleset).major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());

        choose_next_construction(&mut game, "Rome", &city_id);

        assert_eq!(current(&game, "Rome", &city_id), "Courthouse");
    }

    #[test]
    fn test_concrete_construction_is_kept() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        game.get_civilization_mut("Rome")
            .unwrap()
            .get_city_mut(&city_id)
            .unwrap()
            .city_constructions
            .set_current_construction("Warrior");

        choose_next_construction(&mut game, "Rome", &city_id);

        assert_eq!(current(&game, "Rome", &city_id), "Warrior");
        assert!(game.get_civilization("Rome").unwrap().notifications.is_empty());
    }

    #[test]
    fn test_new_city_picks_a_concrete_construction_and_notifies() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());

        choose_next_construction(&mut game, "Rome", &city_id);

        let chosen = current(&game, "Rome", &city_id);
        assert!(game.ruleset.get_construction(&chosen).is_some_and(|it| !it.is_perpetual()));
        let civ = game.get_civilization("Rome").unwrap();
        assert_eq!(
            civ.notifications.last().map(|it| it.text.clone()),
            Some(format!("Work has started on [{}]", chosen))
        );
    }

    #[test]
    fn test_short_term_candidates_use_value_density() {
        let choices = vec![
            ConstructionChoice {
                choice: "Monument".to_string(),
                choice_modifier: 0.5,
                remaining_work: 40,
                production: 2.0,
            },
            ConstructionChoice {
                choice: "Worker".to_string(),
                choice_modifier: 2.0,
                remaining_work: 50,
                production: 2.0,
            },
        ];
        assert_eq!(first_min_by(&choices, |it| it.remaining_work as f32 / it.choice_modifier), "Worker");
        assert_eq!(first_min_by(&choices, |it| it.remaining_work as f32), "Monument");
    }

    #[test]
    fn test_first_minimum_wins_ties() {
        let choice = |name: &str| ConstructionChoice {
            choice: name.to_string(),
            choice_modifier: 1.0,
            remaining_work: 40,
            production: 1.0,
        };
        let choices = vec![choice("Monument"), choice("Shrine")];
        assert_eq!(first_min_by(&choices, |it| it.remaining_work as f32), "Monument");
    }

    #[test]
    fn test_worker_wanted_for_first_city() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        let civ = game.get_civilization("Rome").unwrap();
        let city = civ.get_city(&city_id).unwrap();
        let mut automation = ConstructionAutomation::new(&game, civ, city);
        automation.add_worker_choice();
        let choice = &automation.relative_cost_effectiveness[0];
        assert_eq!(choice.choice, "Worker");
        assert!((choice.choice_modifier - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_idle_settler_makes_military_urgent() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        add_units(&mut game, "Rome", "Settler", HexCoord::default(), 1);
        let civ = game.get_civilization("Rome").unwrap();
        let city = civ.get_city(&city_id).unwrap();
        let mut automation = ConstructionAutomation::new(&game, civ, city);
        automation.add_military_unit_choice();
        let choice = &automation.relative_cost_effectiveness[0];
        assert_eq!(choice.choice, "Warrior");
        assert_eq!(choice.choice_modifier, 5.0);
    }

    #[test]
    fn test_culture_focus_prefers_culture_buildings() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        game.get_civilization_mut("Rome").unwrap().victory_focus = VictoryFocus::Culture;
        let civ = game.get_civilization("Rome").unwrap();
        let city = civ.get_city(&city_id).unwrap();
        let mut automation = ConstructionAutomation::new(&game, civ, city);
        automation.add_culture_building_choice();
        let choice = &automation.relative_cost_effectiveness[0];
        assert_eq!(choice.choice, "Monument");
        assert_eq!(choice.choice_modifier, 1.6);
    }
}
