//! Small worlds for tests.

use map::{Terrain, TileMap};
use rules::Ruleset;
use util::HexCoord;

use crate::civilization::{CityStateType, CivKind, Civilization};
use crate::diplomacy_functions::make_civilizations_meet;
use crate::game_info::GameInfo;
use crate::player_type::PlayerType;

/// Builds a game on a hexagonal grassland map with the builtin ruleset.
pub struct GameBuilder {
    ruleset: Ruleset,
    map_radius: i32,
    terrain: Terrain,
    seed: u64,
    civilizations: Vec<Civilization>,
    everyone_meets: bool,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBuilder {
    pub fn new() -> Self {
        GameBuilder {
            ruleset: Ruleset::builtin().unwrap_or_default(),
            map_radius: 10,
            terrain: Terrain::Grassland,
            seed: 42,
            civilizations: Vec::new(),
            everyone_meets: false,
        }
    }

    pub fn ruleset(mut self, ruleset: Ruleset) -> Self {
        self.ruleset = ruleset;
        self
    }

    pub fn map_radius(mut self, radius: i32) -> Self {
        self.map_radius = radius;
        self
    }

    pub fn terrain(mut self, terrain: Terrain) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn major_civ(mut self, name: &str) -> Self {
        self.civilizations.push(Civilization::new(name, CivKind::Major));
        self
    }

    pub fn human_civ(mut self, name: &str) -> Self {
        let mut civ = Civilization::new(name, CivKind::Major);
        civ.player_type = PlayerType::Human;
        self.civilizations.push(civ);
        self
    }

    pub fn city_state(mut self, name: &str, city_state_type: CityStateType) -> Self {
        self.civilizations
            .push(Civilization::new(name, CivKind::CityState(city_state_type)));
        self
    }

    pub fn barbarians(mut self) -> Self {
        self.civilizations.push(Civilization::new("Barbarians", CivKind::Barbarian));
        self
    }

    /// Every non-barbarian pair has met once the game is built.
    pub fn everyone_meets(mut self) -> Self {
        self.everyone_meets = true;
        self
    }

    pub fn build(self) -> GameInfo {
        let mut game = GameInfo::new(
            self.ruleset,
            TileMap::hexagon(self.map_radius, self.terrain),
            self.seed,
        );
        game.civilizations = self.civilizations;
        if self.everyone_meets {
            let names: Vec<String> = game
                .civilizations
                .iter()
                .filter(|it| !it.is_barbarian())
                .map(|it| it.civ_name.clone())
                .collect();
            for (index, civ_name) in names.iter().enumerate() {
                for other_civ_name in &names[index + 1..] {
                    make_civilizations_meet(&mut game, civ_name, other_civ_name);
                }
            }
            for civ in game.civilizations.iter_mut() {
                civ.popup_alerts.clear();
                civ.notifications.clear();
            }
        }
        game
    }
}

/// Founds a city and panics when the tile is unavailable; tests only.
pub fn add_city(game: &mut GameInfo, civ_name: &str, position: HexCoord) -> String {
    match game.found_city(civ_name, position) {
        Some(id) => id,
        None => panic!("cannot found a city for {} at {:?}", civ_name, position),
    }
}

/// Places `count` units of `unit_name`; tests only.
pub fn add_units(game: &mut GameInfo, civ_name: &str, unit_name: &str, position: HexCoord, count: usize) {
    for _ in 0..count {
        if game.place_unit(civ_name, unit_name, position).is_none() {
            panic!("cannot place {} for {}", unit_name, civ_name);
        }
    }
}
