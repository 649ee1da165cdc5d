//! Helpers shared by the city, civilization and unit automations.

use city::City;
use civilization::{CityBuildContext, Civilization, GameInfo};
use map::Bfs;
use rand::seq::IndexedRandom;
use rules::{BaseUnit, Construction, UnitType, VictoryFocus};

/// Barbarian pressure fades after this many turns.
const BARBARIAN_THREAT_TURNS: i32 = 200;
const BARBARIAN_EARLY_TURNS: i32 = 120;

/// Strategic resources a civ keeps back for spaceship parts.
pub fn get_reserved_space_resource_amount(civ: &Civilization) -> i32 {
    if civ.wants_to_focus_on(VictoryFocus::Science) {
        3
    } else {
        2
    }
}

/// A young civ with few units and live barbarians nearby should arm itself first.
pub fn afraid_of_barbarians(game: &GameInfo, civ: &Civilization) -> bool {
    if civ.is_city_state() || civ.is_barbarian() {
        return false;
    }
    let barbarians_active = game
        .civilizations
        .iter()
        .any(|it| it.is_barbarian() && !it.units.is_empty());
    if !barbarians_active || game.turns > BARBARIAN_THREAT_TURNS {
        return false;
    }
    let mut multiplier = 1.0;
    if game.turns > BARBARIAN_EARLY_TURNS {
        multiplier /= 2.0;
    }
    !civ.cities.is_empty() && (civ.units.len() as f32) < 4.0 * multiplier
}

/// Whether building `construction` leaves enough strategic resources for
/// spaceship parts and the other cities' current builds.
pub fn allow_spending_resource(game: &GameInfo, civ: &Civilization, construction: Construction) -> bool {
    if civ.is_city_state() {
        return true;
    }
    let space_resources = game.ruleset.space_resources();
    if space_resources.contains(construction.name()) {
        return true;
    }
    let Some(resource) = construction.required_resource() else {
        return true;
    };
    if !space_resources.contains(resource) {
        return true;
    }
    let future_use = civ
        .cities
        .iter()
        .filter(|city| {
            city.city_constructions
                .get_current_construction(&game.ruleset)
                .required_resource()
                == Some(resource)
        })
        .count() as i32;
    let available = civ.get_resource_amount(&game.ruleset, resource);
    available - 1 - future_use >= get_reserved_space_resource_amount(civ)
}

pub fn allow_automated_construction(game: &GameInfo, civ: &Civilization, construction: Construction) -> bool {
    allow_spending_resource(game, civ, construction)
}

fn is_naval_melee_unit(unit: &BaseUnit) -> bool {
    unit.is_melee() && unit.is_water_unit()
}

/// Picks the military unit `city` should train, if any is buildable.
///
/// Ranged units garrison empty cities in peace time, naval melee units
/// defend coasts lacking ships, otherwise a random strong unit of some type.
pub fn choose_military_unit(game: &GameInfo, civ: &Civilization, city: &City) -> Option<String> {
    let ruleset = &game.ruleset;
    if let Construction::Unit(unit) = city.city_constructions.get_current_construction(ruleset) {
        if unit.is_military() {
            return Some(unit.name.clone());
        }
    }

    let mut remove_ships = true;
    let mut missing_naval_defence = false;
    if city.is_coastal(&game.tile_map) {
        let mut bfs = Bfs::new(&game.tile_map, city.location, |tile| tile.is_water() || tile.is_city_center);
        bfs.step_to_end();
        let reached: Vec<_> = bfs.get_reached_tiles().collect();
        let our_connected_cities = reached
            .iter()
            .filter(|it| it.is_city_center && it.is_owned_by(&civ.civ_name))
            .count();
        let our_naval_melee_units = reached
            .iter()
            .flat_map(|tile| game.units_at(&tile.position))
            .filter(|it| it.civ_name == civ.civ_name && is_naval_melee_unit(&it.base_unit))
            .count();
        missing_naval_defence = our_connected_cities > our_naval_melee_units;
        remove_ships = !reached.iter().any(|tile| {
            (tile.is_city_center && !tile.is_owned_by(&civ.civ_name))
                || game
                    .units_at(&tile.position)
                    .any(|it| it.civ_name != civ.civ_name && it.is_military())
        });
    }

    let context = CityBuildContext::new(game, civ, city);
    let military_units: Vec<&BaseUnit> = ruleset
        .units
        .iter()
        .filter(|it| it.is_military())
        .filter(|it| !remove_ships || !it.is_water_unit())
        .filter(|it| allow_spending_resource(game, civ, Construction::Unit(*it)))
        .filter(|it| Construction::Unit(*it).is_buildable(&context))
        .collect();

    let empty_city_center = civ.cities.iter().any(|city| {
        !game
            .units_at(&city.location)
            .any(|it| it.civ_name == civ.civ_name && it.is_military())
    });
    let chosen = if !civ.is_at_war() && empty_city_center && military_units.iter().any(|it| it.is_ranged()) {
        most_expensive(military_units.iter().copied().filter(|it| it.is_ranged()))
    } else if missing_naval_defence && military_units.iter().any(|it| is_naval_melee_unit(it)) {
        most_expensive(military_units.iter().copied().filter(|it| is_naval_melee_unit(it)))
    } else {
        let mut best_for_type: Vec<(UnitType, &BaseUnit)> = Vec::new();
        for unit in &military_units {
            match best_for_type.iter_mut().find(|(unit_type, _)| *unit_type == unit.unit_type) {
                Some(entry) if entry.1.cost < unit.cost => entry.1 = unit,
                Some(_) => {}
                None => best_for_type.push((unit.unit_type, unit)),
            }
        }
        let best_force = best_for_type.iter().map(|(_, it)| it.get_force_evaluation()).max()?;
        let candidates: Vec<&BaseUnit> = best_for_type
            .iter()
            .map(|(_, it)| *it)
            .filter(|it| it.unique_to.is_some() || it.get_force_evaluation() > best_force / 3)
            .collect();
        let mut rng = game.rng_for(&civ.civ_name, "military unit");
        candidates.choose(&mut rng).copied()
    };
    chosen.map(|it| it.name.clone())
}

/// First unit with the highest cost.
fn most_expensive<'a>(units: impl Iterator<Item = &'a BaseUnit>) -> Option<&'a BaseUnit> {
    let mut best: Option<&BaseUnit> = None;
    for unit in units {
        if best.map_or(true, |it| unit.cost > it.cost) {
            best = Some(unit);
        }
    }
    best
}

/// Switches `city` to a military unit unless it already trains one.
pub fn try_train_military_unit(game: &mut GameInfo, civ_name: &str, city_id: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let Some(city) = civ.get_city(city_id) else {
        return;
    };
    if city.is_puppet {
        return;
    }
    let Some(chosen) = choose_military_unit(game, civ, city) else {
        return;
    };
    if let Some(city) = game
        .get_civilization_mut(civ_name)
        .and_then(|it| it.get_city_mut(city_id))
    {
        city.city_constructions.set_current_construction(&chosen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, add_units, GameBuilder};
    use util::HexCoord;

    #[test]
    fn test_space_science_focus_reserves_more() {
        let mut civ = Civilization::new("Rome", civilization::CivKind::Major);
        assert_eq!(get_reserved_space_resource_amount(&civ), 2);
        civ.victory_focus = VictoryFocus::Science;
        assert_eq!(get_reserved_space_resource_amount(&civ), 3);
    }

    #[test]
    fn test_barbarians_scare_small_civs() {
        let mut game = GameBuilder::new().major_civ("Rome").barbarians().build();
        add_city(&mut game, "Rome", HexCoord::default());
        assert!(!afraid_of_barbarians(&game, game.get_civilization("Rome").unwrap()));
        add_units(&mut game, "Barbarians", "Warrior", HexCoord::new(5, 0), 1);
        assert!(afraid_of_barbarians(&game, game.get_civilization("Rome").unwrap()));
        add_units(&mut game, "Rome", "Warrior", HexCoord::default(), 4);
        assert!(!afraid_of_barbarians(&game, game.get_civilization("Rome").unwrap()));
    }

    #[test]
    fn test_ranged_unit_garrisons_empty_city() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        game.get_civilization_mut("Rome")
            .unwrap()
            .tech
            .techs_researched
            .extend(["Agriculture".to_string(), "Archery".to_string()]);
        let civ = game.get_civilization("Rome").unwrap();
        let city = civ.get_city(&city_id).unwrap();
        assert_eq!(choose_military_unit(&game, civ, city).as_deref(), Some("Archer"));
    }
}
