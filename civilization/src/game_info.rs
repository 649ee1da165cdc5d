use std::collections::BTreeMap;
use std::sync::Arc;

use city::City;
use combat::{BattleDamage, CombatEvaluator};
use diplomacy::DiplomacyFlags;
use map::TileMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rules::{Milestone, Ruleset, UniqueType};
use tracing::debug;
use util::HexCoord;

use crate::civilization::Civilization;
use crate::managers::victory_manager::MilestoneProgress;
use crate::managers::Religion;
use crate::map_unit::MapUnit;

/// Radius of the tiles a new city claims.
const CITY_WORK_RADIUS: i32 = 1;
/// Radius revealed around a new city or unit.
const SIGHT_RADIUS: i32 = 2;
/// A new city this close to someone else's counts as settling near them.
const SETTLED_NEAR_DISTANCE: i32 = 6;
const SETTLED_NEAR_FLAG_TURNS: i32 = 30;

/// The world the AI reads and mutates.
///
/// Passed explicitly to every decision; nothing in the engine reaches for
/// global state.
#[derive(Clone)]
pub struct GameInfo {
    pub turns: i32,
    pub seed: u64,
    pub ruleset: Arc<Ruleset>,
    /// Shared with background searches; edits go through [`GameInfo::tile_map_mut`]
    pub tile_map: Arc<TileMap>,
    pub civilizations: Vec<Civilization>,
    /// Pantheons keyed by founding civ, religions keyed by name
    pub religions: BTreeMap<String, Religion>,
    pub religion_enabled: bool,
    /// Each voter's choice in the diplomatic victory vote
    pub diplomatic_votes: BTreeMap<String, Option<String>>,
    pub combat: Arc<dyn CombatEvaluator>,
    pub next_unit_id: u32,
}

impl GameInfo {
    pub fn new(ruleset: Ruleset, tile_map: TileMap, seed: u64) -> Self {
        GameInfo {
            turns: 0,
            seed,
            ruleset: Arc::new(ruleset),
            tile_map: Arc::new(tile_map),
            civilizations: Vec::new(),
            religions: BTreeMap::new(),
            religion_enabled: true,
            diplomatic_votes: BTreeMap::new(),
            combat: Arc::new(BattleDamage::default()),
            next_unit_id: 1,
        }
    }

    pub fn get_civilization(&self, civ_name: &str) -> Option<&Civilization> {
        self.civilizations.iter().find(|it| it.civ_name == civ_name)
    }

    pub fn get_civilization_mut(&mut self, civ_name: &str) -> Option<&mut Civilization> {
        self.civilizations.iter_mut().find(|it| it.civ_name == civ_name)
    }

    fn civ_index(&self, civ_name: &str) -> Option<usize> {
        self.civilizations.iter().position(|it| it.civ_name == civ_name)
    }

    /// Mutable access to two different civilizations at once.
    pub fn civ_pair_mut(&mut self, first: &str, second: &str) -> Option<(&mut Civilization, &mut Civilization)> {
        let first_index = self.civ_index(first)?;
        let second_index = self.civ_index(second)?;
        if first_index == second_index {
            return None;
        }
        if first_index < second_index {
            let (left, right) = self.civilizations.split_at_mut(second_index);
            Some((&mut left[first_index], &mut right[0]))
        } else {
            let (left, right) = self.civilizations.split_at_mut(first_index);
            Some((&mut right[0], &mut left[second_index]))
        }
    }

    /// Names in turn order.
    pub fn civ_names(&self) -> Vec<String> {
        self.civilizations.iter().map(|it| it.civ_name.clone()).collect()
    }

    pub fn get_alive_major_civs(&self) -> impl Iterator<Item = &Civilization> {
        self.civilizations
            .iter()
            .filter(|it| it.is_major_civ() && it.is_alive())
    }

    pub fn get_alive_city_states(&self) -> impl Iterator<Item = &Civilization> {
        self.civilizations
            .iter()
            .filter(|it| it.is_city_state() && it.is_alive())
    }

    pub fn is_wonder_built(&self, building: &str) -> bool {
        self.civilizations
            .iter()
            .flat_map(|it| it.cities.iter())
            .any(|it| it.city_constructions.is_built(building))
    }

    pub fn find_city(&self, city_id: &str) -> Option<(&Civilization, &City)> {
        self.civilizations
            .iter()
            .find_map(|civ| civ.get_city(city_id).map(|city| (civ, city)))
    }

    /// Units of every civilization standing on `position`.
    pub fn units_at<'a>(&'a self, position: &'a HexCoord) -> impl Iterator<Item = &'a MapUnit> + 'a {
        self.civilizations
            .iter()
            .flat_map(|it| it.units.iter())
            .filter(move |it| it.position == *position)
    }

    pub fn tile_map_mut(&mut self) -> &mut TileMap {
        Arc::make_mut(&mut self.tile_map)
    }

    pub fn take_unit_id(&mut self) -> u32 {
        let id = self.next_unit_id;
        self.next_unit_id += 1;
        id
    }

    pub fn pantheons_founded(&self) -> usize {
        self.religions.len()
    }

    /// Religion names from the ruleset nobody has founded yet.
    pub fn available_religion_names(&self) -> Vec<&str> {
        self.ruleset
            .religions
            .iter()
            .filter(|it| !self.religions.contains_key(*it))
            .map(|it| it.as_str())
            .collect()
    }

    pub fn is_belief_taken(&self, belief: &str) -> bool {
        self.religions
            .values()
            .any(|it| it.beliefs.iter().any(|taken| taken == belief))
    }

    /// Next incomplete milestone of every victory for `civ`, in ruleset order.
    pub fn next_milestones(&self, civ: &Civilization) -> Vec<&Milestone> {
        let civ_has_building = |building: &str| civ.cities.iter().any(|it| it.city_constructions.is_built(building));
        let is_built_globally = |building: &str| self.is_wonder_built(building);
        let progress = MilestoneProgress {
            civ_has_building: &civ_has_building,
            is_built_globally: &is_built_globally,
            owns_all_capitals: self.owns_all_capitals(civ),
        };
        self.ruleset
            .victories
            .iter()
            .filter_map(|victory| civ.victory_manager.get_next_milestone(victory, &progress))
            .collect()
    }

    pub fn is_close_to_victory(&self, civ: &Civilization) -> bool {
        let civ_has_building = |building: &str| civ.cities.iter().any(|it| it.city_constructions.is_built(building));
        let is_built_globally = |building: &str| self.is_wonder_built(building);
        let progress = MilestoneProgress {
            civ_has_building: &civ_has_building,
            is_built_globally: &is_built_globally,
            owns_all_capitals: self.owns_all_capitals(civ),
        };
        civ.victory_manager.is_close_to_victory(&self.ruleset.victories, &progress)
    }

    fn owns_all_capitals(&self, civ: &Civilization) -> bool {
        self.civilizations
            .iter()
            .filter(|it| it.is_major_civ() && it.civ_name != civ.civ_name)
            .filter_map(|it| it.original_capital.as_deref())
            .all(|capital| civ.get_city(capital).is_some())
    }

    /// A vote is open once any diplomatic-vote building stands and `civ_name` has not voted yet.
    pub fn may_vote_for_diplomatic_victory(&self, civ_name: &str) -> bool {
        if self.diplomatic_votes.contains_key(civ_name) {
            return false;
        }
        let vote_triggered = self
            .civilizations
            .iter()
            .flat_map(|it| it.cities.iter())
            .any(|city| city.has_unique_building(&self.ruleset, UniqueType::TriggersDiplomaticVote));
        vote_triggered
            && self
                .get_civilization(civ_name)
                .is_some_and(|it| it.is_alive() && !it.is_barbarian())
    }

    pub fn diplomatic_vote_for_civ(&mut self, voter: &str, chosen_civ: Option<String>) {
        debug!(voter = %voter, chosen = ?chosen_civ, "Diplomatic vote cast");
        self.diplomatic_votes.insert(voter.to_string(), chosen_civ);
    }

    /// Founds a city for `civ_name` at `position`, claiming the free tiles around it.
    ///
    /// Returns the new city's id, or `None` when the tile is missing or taken.
    pub fn found_city(&mut self, civ_name: &str, position: HexCoord) -> Option<String> {
        let taken = self.tile_map.get(&position).map(|it| it.owner.is_some() || it.is_water())?;
        if taken {
            return None;
        }
        let city_count: usize = self.civilizations.iter().map(|it| it.cities.len()).sum();
        let civ = self.get_civilization(civ_name)?;
        let id = format!("{}-{}", civ_name, city_count + 1);
        let name = if civ.cities.is_empty() {
            civ_name.to_string()
        } else {
            format!("{} {}", civ_name, civ.cities.len() + 1)
        };

        let tile_map = self.tile_map_mut();
        for tile in tile_map.tiles_mut() {
            if tile.position.aerial_distance_to(&position) <= CITY_WORK_RADIUS && tile.owner.is_none() {
                tile.owner = Some(civ_name.to_string());
                tile.owning_city = Some(id.clone());
            }
            if tile.position == position {
                tile.is_city_center = true;
            }
        }

        let ruleset = self.ruleset.clone();
        let tile_map = self.tile_map.clone();
        let civ = self.get_civilization_mut(civ_name)?;
        let mut city = City::new(&id, &name, civ_name, position);
        if civ.cities.is_empty() {
            city.is_capital = true;
            if civ.original_capital.is_none() {
                civ.original_capital = Some(id.clone());
            }
        }
        city.reassign_all_population(&tile_map, &ruleset);
        civ.cities.push(city);
        civ.explored_tiles.extend(position.positions_in_distance(SIGHT_RADIUS + CITY_WORK_RADIUS));
        debug!(civ = %civ_name, city = %name, "City founded");
        self.mark_settled_near(civ_name, position);
        Some(id)
    }

    /// Majors with a city close to `position` remember that `civ_name` settled near them.
    fn mark_settled_near(&mut self, civ_name: &str, position: HexCoord) {
        let neighbours: Vec<String> = self
            .civilizations
            .iter()
            .filter(|it| it.civ_name != civ_name && it.is_major_civ() && it.knows(civ_name))
            .filter(|it| {
                it.cities
                    .iter()
                    .any(|city| city.location.aerial_distance_to(&position) <= SETTLED_NEAR_DISTANCE)
            })
            .map(|it| it.civ_name.clone())
            .collect();
        for neighbour in neighbours {
            if let Some(manager) = self
                .get_civilization_mut(&neighbour)
                .and_then(|it| it.get_diplomacy_manager_mut(civ_name))
            {
                manager.set_flag(DiplomacyFlags::SettledCitiesNearUs, SETTLED_NEAR_FLAG_TURNS);
            }
        }
    }

    /// Places a new unit of the ruleset's `unit_name` for `civ_name`.
    pub fn place_unit(&mut self, civ_name: &str, unit_name: &str, position: HexCoord) -> Option<u32> {
        let base_unit = self.ruleset.get_unit(unit_name)?.clone();
        let id = self.take_unit_id();
        let civ = self.get_civilization_mut(civ_name)?;
        civ.units.push(MapUnit::new(id, civ_name, base_unit, position));
        civ.explored_tiles.extend(position.positions_in_distance(SIGHT_RADIUS));
        Some(id)
    }

    /// A generator reproducible for this game, turn, civilization and decision.
    pub fn rng_for(&self, civ_name: &str, purpose: &str) -> StdRng {
        // FNV-1a keeps the seed stable across platforms and toolchains
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let turn = self.turns.to_le_bytes();
        for byte in civ_name
            .bytes()
            .chain(purpose.bytes())
            .chain(turn.iter().copied())
        {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        StdRng::seed_from_u64(self.seed ^ hash)
    }
}
