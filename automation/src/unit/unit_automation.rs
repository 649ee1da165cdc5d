use std::sync::Arc;

use city::city_stats::tile_stats;
use civilization::diplomacy_functions::can_pass_through_tiles;
use civilization::map_unit::MAX_UNIT_HEALTH;
use civilization::{Civilization, GameInfo, MapUnit, NotificationCategory};
use combat::CombatEvaluator;
use map::{Bfs, Tile};
use rules::UniqueType;
use tracing::{debug, trace};
use util::HexCoord;

/// Wounded units below this health retreat to a city.
const RETREAT_HEALTH: i32 = MAX_UNIT_HEALTH / 2;
/// How far a settler looks for a city site.
const SETTLER_SEARCH_RADIUS: i32 = 5;
/// Minimum distance between a new city and any existing one.
const MIN_CITY_DISTANCE: i32 = 4;
const CITY_BOMBARD_RANGE: i32 = 2;

/// Whether `civ` fights `other_civ_name` on sight.
fn is_enemy(game: &GameInfo, civ: &Civilization, other_civ_name: &str) -> bool {
    if civ.civ_name == other_civ_name {
        return false;
    }
    civ.is_barbarian()
        || game.get_civilization(other_civ_name).is_some_and(|it| it.is_barbarian())
        || civ.is_at_war_with(other_civ_name)
}

fn unit_priority(unit: &MapUnit) -> i32 {
    let base_unit = &unit.base_unit;
    if base_unit.is_great_general() {
        4
    } else if unit.is_civilian() {
        0
    } else if base_unit.is_air_unit() {
        1
    } else if base_unit.is_ranged() {
        2
    } else if base_unit.is_melee() {
        3
    } else {
        0
    }
}

/// Moves every unit of `civ_name`: civilians first, then air, ranged and melee
/// units, great generals last so they can join the army where it ended up.
pub fn automate_units(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let mut units: Vec<(i32, u32)> = civ.units.iter().map(|it| (unit_priority(it), it.id)).collect();
    units.sort();
    for (_, unit_id) in units {
        automate_unit(game, civ_name, unit_id);
    }
}

fn get_unit<'a>(game: &'a GameInfo, civ_name: &str, unit_id: u32) -> Option<(&'a Civilization, &'a MapUnit)> {
    let civ = game.get_civilization(civ_name)?;
    let unit = civ.units.iter().find(|it| it.id == unit_id)?;
    Some((civ, unit))
}

fn get_unit_mut<'a>(game: &'a mut GameInfo, civ_name: &str, unit_id: u32) -> Option<&'a mut MapUnit> {
    game.get_civilization_mut(civ_name)?
        .units
        .iter_mut()
        .find(|it| it.id == unit_id)
}

pub fn automate_unit(game: &mut GameInfo, civ_name: &str, unit_id: u32) {
    let Some((_, unit)) = get_unit(game, civ_name, unit_id) else {
        return;
    };
    if unit.has_moved {
        return;
    }
    if unit.has_unique(UniqueType::FoundCity) {
        automate_settler(game, civ_name, unit_id);
    } else if unit.has_unique(UniqueType::BuildImprovements) {
        automate_worker(game, civ_name, unit_id);
    } else if unit.base_unit.is_great_general() {
        automate_great_general(game, civ_name, unit_id);
    } else if unit.is_military() {
        automate_military_unit(game, civ_name, unit_id);
    }
    if let Some(unit) = get_unit_mut(game, civ_name, unit_id) {
        unit.has_moved = true;
    }
}

/// Tiles `civ` may walk through: passable land it is allowed to enter.
fn can_enter(game: &GameInfo, civ: &Civilization, tile: &Tile) -> bool {
    if !tile.is_land() || tile.is_impassible() {
        return false;
    }
    match tile.get_owner() {
        None => true,
        Some(owner) => owner == civ.civ_name || can_pass_through_tiles(game, civ, owner),
    }
}

/// Moves the unit up to its movement along a land path towards `destination`.
///
/// Returns whether the unit stands on `destination` afterwards.
fn move_towards(game: &mut GameInfo, civ_name: &str, unit_id: u32, destination: HexCoord) -> bool {
    let Some((civ, unit)) = get_unit(game, civ_name, unit_id) else {
        return false;
    };
    if unit.position == destination {
        return true;
    }
    let mut bfs = Bfs::new(&game.tile_map, unit.position, |tile| {
        tile.position == destination || can_enter(game, civ, tile)
    });
    if !bfs.step_until_destination(&destination) {
        return false;
    }
    let Some(path) = bfs.get_path_to(&destination) else {
        return false;
    };
    // The path runs from the destination back to the unit
    let steps = unit.base_unit.movement.max(1) as usize;
    let new_position = path[path.len().saturating_sub(1 + steps)];
    if let Some(unit) = get_unit_mut(game, civ_name, unit_id) {
        trace!(civ = %civ_name, unit = %unit.name(), to = ?new_position, "Moved unit");
        unit.position = new_position;
    }
    new_position == destination
}

fn closest<'a>(from: &HexCoord, positions: impl Iterator<Item = &'a HexCoord>) -> Option<HexCoord> {
    let mut best: Option<(HexCoord, i32)> = None;
    for position in positions {
        let distance = from.aerial_distance_to(position);
        if best.map_or(true, |(_, it)| distance < it) {
            best = Some((*position, distance));
        }
    }
    best.map(|(it, _)| it)
}

/// Scores a city site by the yields of the tiles it would work.
fn rank_city_site(game: &GameInfo, position: &HexCoord) -> f32 {
    game.tile_map
        .tiles_in_distance(position, 1)
        .iter()
        .map(|tile| {
            let stats = tile_stats(tile, &game.ruleset);
            stats.food + stats.production + stats.gold
        })
        .sum()
}

fn best_city_site(game: &GameInfo, civ: &Civilization, unit: &MapUnit) -> Option<HexCoord> {
    let city_locations: Vec<HexCoord> = game
        .civilizations
        .iter()
        .flat_map(|it| it.cities.iter().map(|city| city.location))
        .collect();
    let mut best: Option<(HexCoord, f32)> = None;
    for tile in game.tile_map.tiles_in_distance(&unit.position, SETTLER_SEARCH_RADIUS) {
        if !tile.is_land() || tile.is_impassible() || tile.owner.is_some() {
            continue;
        }
        if city_locations
            .iter()
            .any(|it| it.aerial_distance_to(&tile.position) < MIN_CITY_DISTANCE)
        {
            continue;
        }
        if !civ.explored_tiles.contains(&tile.position) {
            continue;
        }
        let rank = rank_city_site(game, &tile.position);
        if best.map_or(true, |(_, it)| rank > it) {
            best = Some((tile.position, rank));
        }
    }
    best.map(|(it, _)| it)
}

fn automate_settler(game: &mut GameInfo, civ_name: &str, unit_id: u32) {
    let Some((civ, unit)) = get_unit(game, civ_name, unit_id) else {
        return;
    };
    let Some(site) = best_city_site(game, civ, unit) else {
        return;
    };
    if !move_towards(game, civ_name, unit_id, site) {
        return;
    }
    if game.found_city(civ_name, site).is_some() {
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            civ.units.retain(|it| it.id != unit_id);
            debug!(civ = %civ_name, site = ?site, "Settler founded a city");
        }
    }
}

/// Walks to the closest unimproved resource in our land and improves it.
fn automate_worker(game: &mut GameInfo, civ_name: &str, unit_id: u32) {
    let Some((_, unit)) = get_unit(game, civ_name, unit_id) else {
        return;
    };
    let targets: Vec<(HexCoord, String)> = game
        .tile_map
        .tiles()
        .filter(|it| it.is_owned_by(civ_name))
        .filter_map(|tile| {
            let improvement = tile
                .resource
                .as_deref()
                .and_then(|it| game.ruleset.get_tile_resource(it))
                .and_then(|it| it.improvement.clone())?;
            (tile.improvement.as_ref() != Some(&improvement)).then_some((tile.position, improvement))
        })
        .collect();
    let Some(target) = closest(&unit.position, targets.iter().map(|(it, _)| it)) else {
        return;
    };
    if !move_towards(game, civ_name, unit_id, target) {
        return;
    }
    let Some((_, improvement)) = targets.into_iter().find(|(it, _)| *it == target) else {
        return;
    };
    if let Some(tile) = game.tile_map_mut().get_mut(&target) {
        debug!(civ = %civ_name, tile = ?target, improvement = %improvement, "Improved tile");
        tile.improvement = Some(improvement);
    }
}

/// Follows the closest military unit of ours.
fn automate_great_general(game: &mut GameInfo, civ_name: &str, unit_id: u32) {
    let Some((civ, unit)) = get_unit(game, civ_name, unit_id) else {
        return;
    };
    let army: Vec<HexCoord> = civ.get_military_units().map(|it| it.position).collect();
    let Some(target) = closest(&unit.position, army.iter()) else {
        return;
    };
    move_towards(game, civ_name, unit_id, target);
}

fn automate_military_unit(game: &mut GameInfo, civ_name: &str, unit_id: u32) {
    let Some((civ, unit)) = get_unit(game, civ_name, unit_id) else {
        return;
    };
    let own_cities: Vec<HexCoord> = civ.cities.iter().map(|it| it.location).collect();
    let position = unit.position;

    if unit.health < RETREAT_HEALTH && !own_cities.contains(&position) {
        if let Some(city) = closest(&position, own_cities.iter()) {
            move_towards(game, civ_name, unit_id, city);
            return;
        }
    }
    if try_attack(game, civ_name, unit_id) {
        return;
    }

    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let enemy_cities: Vec<HexCoord> = game
        .civilizations
        .iter()
        .filter(|it| is_enemy(game, civ, &it.civ_name))
        .flat_map(|it| it.cities.iter().map(|city| city.location))
        .collect();
    if let Some(target) = closest(&position, enemy_cities.iter()) {
        move_towards(game, civ_name, unit_id, target);
        try_attack(game, civ_name, unit_id);
        return;
    }

    // Peace time: garrison a city nobody guards
    let unguarded: Vec<HexCoord> = own_cities
        .iter()
        .copied()
        .filter(|city| !civ.get_military_units().any(|it| it.position == *city))
        .collect();
    if let Some(city) = closest(&position, unguarded.iter()) {
        move_towards(game, civ_name, unit_id, city);
    }
}

/// Enemy units within `range` of `position`, weakest first; the first one wins ties.
fn weakest_enemy_in_range(game: &GameInfo, civ: &Civilization, position: &HexCoord, range: i32) -> Option<(String, u32)> {
    let mut best: Option<(&MapUnit, i32)> = None;
    for enemy in game
        .civilizations
        .iter()
        .filter(|it| is_enemy(game, civ, &it.civ_name))
        .flat_map(|it| it.units.iter())
        .filter(|it| it.position.aerial_distance_to(position) <= range)
    {
        if best.map_or(true, |(_, health)| enemy.health < health) {
            best = Some((enemy, enemy.health));
        }
    }
    best.map(|(it, _)| (it.civ_name.clone(), it.id))
}

/// Attacks the weakest enemy unit in reach. Returns whether an attack happened.
fn try_attack(game: &mut GameInfo, civ_name: &str, unit_id: u32) -> bool {
    let Some((civ, unit)) = get_unit(game, civ_name, unit_id) else {
        return false;
    };
    let range = if unit.base_unit.is_ranged() {
        unit.base_unit.range
    } else {
        1
    };
    let Some((defender_civ, defender_id)) = weakest_enemy_in_range(game, civ, &unit.position, range) else {
        return false;
    };
    let Some((_, defender)) = get_unit(game, &defender_civ, defender_id) else {
        return false;
    };
    let combat: Arc<dyn CombatEvaluator> = game.combat.clone();
    let attacker = unit.combatant();
    let defending = defender.combatant();
    let damage_to_defender = combat.calculate_damage_to_defender(&attacker, &defending);
    let damage_to_attacker = combat.calculate_damage_to_attacker(&attacker, &defending);
    let (attacker_name, defender_name) = (unit.name().to_string(), defender.name().to_string());
    debug!(
        civ = %civ_name,
        attacker = %attacker_name,
        defender = %defender_name,
        damage_to_defender,
        damage_to_attacker,
        "Attacked"
    );

    damage_unit(game, &defender_civ, defender_id, damage_to_defender);
    damage_unit(game, civ_name, unit_id, damage_to_attacker);
    true
}

/// Applies `damage`, destroying the unit when its health runs out.
fn damage_unit(game: &mut GameInfo, civ_name: &str, unit_id: u32, damage: i32) {
    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    let Some(unit) = civ.units.iter_mut().find(|it| it.id == unit_id) else {
        return;
    };
    unit.health -= damage;
    if unit.health > 0 {
        return;
    }
    let name = unit.name().to_string();
    civ.units.retain(|it| it.id != unit_id);
    civ.add_notification(&format!("Our [{}] was destroyed", name), NotificationCategory::War);
}

/// Lets city `city_id` shoot at the weakest enemy unit in range, once per turn.
pub fn try_bombard_enemy(game: &mut GameInfo, civ_name: &str, city_id: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let Some(city) = civ.get_city(city_id) else {
        return;
    };
    if city.attacked_this_turn {
        return;
    }
    let Some((target_civ, target_id)) = weakest_enemy_in_range(game, civ, &city.location, CITY_BOMBARD_RANGE) else {
        return;
    };
    let Some((_, target)) = get_unit(game, &target_civ, target_id) else {
        return;
    };
    let techs_percent = civ.tech.researched_techs_percent(&game.ruleset);
    let damage = game
        .combat
        .calculate_damage_to_defender(&city.combatant(&game.ruleset, techs_percent), &target.combatant());
    debug!(civ = %civ_name, city = %city.name, target = %target.name(), damage, "City bombarded");

    damage_unit(game, &target_civ, target_id, damage);
    if let Some(city) = game
        .get_civilization_mut(civ_name)
        .and_then(|it| it.get_city_mut(city_id))
    {
        city.attacked_this_turn = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, add_units, GameBuilder};

    #[test]
    fn test_units_sorted_civilians_first() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        add_units(&mut game, "Rome", "Warrior", HexCoord::default(), 1);
        add_units(&mut game, "Rome", "Archer", HexCoord::default(), 1);
        add_units(&mut game, "Rome", "Worker", HexCoord::default(), 1);
        let rome = game.get_civilization("Rome").unwrap();
        let mut priorities: Vec<(i32, &str)> = rome.units.iter().map(|it| (unit_priority(it), it.name())).collect();
        priorities.sort();
        let order: Vec<&str> = priorities.iter().map(|(_, name)| *name).collect();
        assert_eq!(order, vec!["Worker", "Archer", "Warrior"]);
    }

    #[test]
    fn test_settler_founds_city_away_from_others() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        add_city(&mut game, "Rome", HexCoord::default());
        add_units(&mut game, "Rome", "Settler", HexCoord::new(1, 0), 1);
        game.get_civilization_mut("Rome")
            .unwrap()
            .explored_tiles
            .extend(HexCoord::default().positions_in_distance(6));
        for _ in 0..5 {
            automate_units(&mut game, "Rome");
            for unit in game.get_civilization_mut("Rome").unwrap().units.iter_mut() {
                unit.has_moved = false;
            }
        }
        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.cities.len(), 2);
        assert!(rome.units.is_empty());
        assert!(rome.cities[1].location.aerial_distance_to(&rome.cities[0].location) >= MIN_CITY_DISTANCE);
    }

    #[test]
    fn test_city_bombards_adjacent_barbarian() {
        let mut game = GameBuilder::new().major_civ("Rome").barbarians().build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        add_units(&mut game, "Barbarians", "Warrior", HexCoord::new(1, 0), 1);

        try_bombard_enemy(&mut game, "Rome", &city_id);

        let barbarians = game.get_civilization("Barbarians").unwrap();
        assert!(barbarians.units.iter().all(|it| it.health < MAX_UNIT_HEALTH));
        let rome = game.get_civilization("Rome").unwrap();
        assert!(rome.get_city(&city_id).unwrap().attacked_this_turn);
    }

    #[test]
    fn test_peaceful_units_do_not_attack() {
        let mut game = GameBuilder::new()
            .major_civ("Rome")
            .major_civ("Greece")
            .everyone_meets()
            .build();
        add_units(&mut game, "Rome", "Warrior", HexCoord::default(), 1);
        add_units(&mut game, "Greece", "Warrior", HexCoord::new(1, 0), 1);
        let unit_id = game.get_civilization("Rome").unwrap().units[0].id;
        assert!(!try_attack(&mut game, "Rome", unit_id));
    }

    #[test]
    fn test_wounded_unit_retreats_home() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        add_city(&mut game, "Rome", HexCoord::default());
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(2, 0), 1);
        game.get_civilization_mut("Rome").unwrap().units[0].health = 20;

        automate_units(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.units[0].position, HexCoord::default());
    }
}
