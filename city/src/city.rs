use std::collections::BTreeSet;

use combat::{city_max_health, city_strength, Combatant};
use map::{Tile, TileMap};
use rules::{Building, HasUniques, Ruleset, Stat, Stats, UniqueType};
use serde::{Deserialize, Serialize};
use tracing::debug;
use util::HexCoord;

use crate::city_constructions::CityConstructions;
use crate::city_focus::CityFocus;
use crate::city_stats::{food_to_next_population, tile_stats};

/// Represents a city in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// The unique ID of the city
    pub id: String,

    /// The name of the city
    pub name: String,

    /// The civilization that owns this city
    pub civ_name: String,

    /// The civilization that founded this city
    pub founding_civ: String,

    /// The location of the city center
    pub location: HexCoord,

    pub population: i32,

    /// Food stored towards the next population
    pub food_stored: i32,

    /// The health of the city
    pub health: i32,

    /// Whether the city is a puppet
    pub is_puppet: bool,

    /// Turns of resistance left after a change of owner
    pub resistance_counter: i32,

    pub is_capital: bool,

    /// The constructions manager for this city
    pub city_constructions: CityConstructions,

    /// Yields computed on the last stats update
    pub current_stats: Stats,

    /// The luxury this city wants
    pub demanded_resource: Option<String>,

    pub focus: CityFocus,

    /// Tiles that have population assigned to them
    pub worked_tiles: BTreeSet<HexCoord>,

    /// Whether the city was attacked this turn
    pub attacked_this_turn: bool,

    /// Whether the city has sold a building this turn
    pub has_sold_building_this_turn: bool,
}

impl City {
    pub fn new(id: &str, name: &str, civ_name: &str, location: HexCoord) -> Self {
        City {
            id: id.to_string(),
            name: name.to_string(),
            civ_name: civ_name.to_string(),
            founding_civ: civ_name.to_string(),
            location,
            population: 1,
            food_stored: 0,
            health: city_max_health(0),
            is_puppet: false,
            resistance_counter: 0,
            is_capital: false,
            city_constructions: CityConstructions::new(),
            current_stats: Stats::default(),
            demanded_resource: None,
            focus: CityFocus::NoFocus,
            worked_tiles: BTreeSet::new(),
            attacked_this_turn: false,
            has_sold_building_this_turn: false,
        }
    }

    pub fn is_in_resistance(&self) -> bool {
        self.resistance_counter > 0
    }

    pub fn get_center_tile<'a>(&self, tile_map: &'a TileMap) -> Option<&'a Tile> {
        tile_map.get(&self.location)
    }

    /// All tiles owned by this city, center included.
    pub fn get_tiles<'a>(&'a self, tile_map: &'a TileMap) -> impl Iterator<Item = &'a Tile> + 'a {
        tile_map.city_tiles(&self.id)
    }

    pub fn is_coastal(&self, tile_map: &TileMap) -> bool {
        tile_map.neighbors(&self.location).any(|it| it.is_water())
    }

    pub fn get_built_buildings<'a>(&'a self, ruleset: &'a Ruleset) -> impl Iterator<Item = &'a Building> + 'a {
        self.city_constructions
            .built_buildings
            .iter()
            .filter_map(move |it| ruleset.get_building(it))
    }

    pub fn get_max_health(&self, ruleset: &Ruleset) -> i32 {
        city_max_health(self.get_built_buildings(ruleset).map(|it| it.city_health).sum())
    }

    /// Defensive strength given how much of the tech tree the owner knows.
    pub fn get_city_strength(&self, ruleset: &Ruleset, techs_percent_known: f32) -> f32 {
        let building_strength = self.get_built_buildings(ruleset).map(|it| it.city_strength).sum();
        city_strength(self.population, building_strength, techs_percent_known)
    }

    pub fn combatant(&self, ruleset: &Ruleset, techs_percent_known: f32) -> Combatant {
        Combatant::city(&self.name, self.get_city_strength(ruleset, techs_percent_known), self.health)
    }

    pub fn has_unique_building(&self, ruleset: &Ruleset, unique_type: UniqueType) -> bool {
        self.get_built_buildings(ruleset).any(|it| it.has_unique(unique_type))
    }

    pub fn annex_city(&mut self) {
        self.is_puppet = false;
        debug!(city = %self.name, "City annexed");
    }

    /// Puts every citizen on the best available tiles for the city's focus.
    pub fn reassign_all_population(&mut self, tile_map: &TileMap, ruleset: &Ruleset) {
        let focus = self.focus;
        let mut candidates: Vec<(&Tile, f32)> = tile_map
            .city_tiles(&self.id)
            .filter(|it| !it.is_city_center && !it.is_impassible())
            .map(|it| (it, focus.rank(&tile_stats(it, ruleset))))
            .collect();
        // Stable sort keeps map order among equally ranked tiles
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
        let worked: BTreeSet<HexCoord> = candidates
            .into_iter()
            .take(self.population.max(0) as usize)
            .map(|(tile, _)| tile.position)
            .collect();
        self.worked_tiles = worked;
    }

    /// Recomputes `current_stats` from tiles, buildings and civ-wide bonuses.
    pub fn update_stats(&mut self, tile_map: &TileMap, ruleset: &Ruleset, civ_wide_bonus: &Stats) {
        let mut stats = Stats::default();
        if let Some(center) = self.get_center_tile(tile_map) {
            stats += tile_stats(center, ruleset);
        }
        for position in &self.worked_tiles {
            if let Some(tile) = tile_map.get(position) {
                stats += tile_stats(tile, ruleset);
            }
        }
        stats.science += self.population as f32;
        stats += *civ_wide_bonus;

        let mut percent_bonus = Stats::default();
        for building in self.get_built_buildings(ruleset) {
            stats += building.stats;
            percent_bonus += building.percent_stat_bonus;
        }
        for stat in Stat::ALL {
            let bonus = percent_bonus.get(stat);
            if bonus != 0.0 {
                let value = stats.get(stat);
                stats.add_stat(stat, value * bonus / 100.0);
            }
        }
        if self.is_puppet {
            stats.science *= 0.75;
            stats.culture *= 0.75;
        }
        stats.food -= (self.population * 2) as f32;
        self.current_stats = stats;
    }

    /// Applies this turn's food surplus. Returns the population change.
    pub fn grow(&mut self, ruleset: &Ruleset) -> i32 {
        self.food_stored += self.current_stats.food as i32;
        if self.food_stored < 0 {
            self.food_stored = 0;
            if self.population > 1 {
                self.population -= 1;
                return -1;
            }
            return 0;
        }
        let needed = food_to_next_population(self.population);
        if self.food_stored < needed {
            return 0;
        }
        self.population += 1;
        let carry_over: f32 = self
            .get_built_buildings(ruleset)
            .flat_map(|it| it.get_matching_uniques(UniqueType::CarryOverFood))
            .filter_map(|it| it.param_f32(0))
            .sum();
        self.food_stored = ((self.food_stored - needed) as f32 + needed as f32 * carry_over / 100.0) as i32;
        debug!(city = %self.name, population = self.population, "City grew");
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map::Terrain;

    fn city_on_map() -> (City, TileMap) {
        let mut tile_map = TileMap::hexagon(2, Terrain::Plains);
        let city = City::new("rome-1", "Rome", "Rome", HexCoord::default());
        for tile in tile_map.tiles_mut() {
            if tile.position.aerial_distance_to(&city.location) <= 1 {
                tile.owner = Some("Rome".to_string());
                tile.owning_city = Some(city.id.clone());
            }
            tile.is_city_center = tile.position == city.location;
        }
        (city, tile_map)
    }

    #[test]
    fn test_reassign_population_prefers_focus() {
        let ruleset = Ruleset::builtin().unwrap();
        let (mut city, mut tile_map) = city_on_map();
        if let Some(tile) = tile_map.get_mut(&HexCoord::new(1, 0)) {
            tile.terrain = Terrain::Hill;
        }
        city.focus = CityFocus::ProductionFocus;
        city.reassign_all_population(&tile_map, &ruleset);
        assert_eq!(city.worked_tiles.len(), 1);
        assert!(city.worked_tiles.contains(&HexCoord::new(1, 0)));
    }

    #[test]
    fn test_building_stats_and_bonus() {
        let ruleset = Ruleset::builtin().unwrap();
        let (mut city, tile_map) = city_on_map();
        city.update_stats(&tile_map, &ruleset, &Stats::default());
        let science_before = city.current_stats.science;
        city.city_constructions.add_building("Library");
        city.update_stats(&tile_map, &ruleset, &Stats::default());
        assert_eq!(city.current_stats.science, (science_before + 1.0) * 1.5);
    }

    #[test]
    fn test_walls_raise_health_and_strength() {
        let ruleset = Ruleset::builtin().unwrap();
        let (mut city, _) = city_on_map();
        let strength = city.get_city_strength(&ruleset, 0.0);
        city.city_constructions.add_building("Walls");
        assert_eq!(city.get_max_health(&ruleset), 300);
        assert!(city.get_city_strength(&ruleset, 0.0) > strength);
    }

    #[test]
    fn test_growth() {
        let ruleset = Ruleset::builtin().unwrap();
        let (mut city, _) = city_on_map();
        city.current_stats.food = 20.0;
        assert_eq!(city.grow(&ruleset), 1);
        assert_eq!(city.population, 2);
        assert_eq!(city.food_stored, 5);
    }
}
