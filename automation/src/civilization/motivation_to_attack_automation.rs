use std::collections::BTreeSet;

use city::City;
use civilization::diplomacy_functions::{self, can_pass_through_tiles};
use civilization::{Civilization, GameInfo};
use diplomacy::RelationshipLevel;
use map::{Bfs, ReachedTiles, Tile};
use rules::{Construction, UniqueType, VictoryFocus};
use tracing::{debug, info, warn};

/// Added to both sides so tiny militaries do not produce huge ratios.
const BASE_FORCE: f32 = 30.0;

/// Motivation at which we go to war.
const DECLARE_WAR_THRESHOLD: i32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct CityDistance<'a> {
    pub city1: &'a City,
    pub city2: &'a City,
    pub aerial_distance: i32,
}

/// The closest pair of cities between two civs; the first pair found wins ties.
pub fn get_closest_cities<'a>(civ1: &'a Civilization, civ2: &'a Civilization) -> Option<CityDistance<'a>> {
    let mut closest: Option<CityDistance<'a>> = None;
    for city1 in &civ1.cities {
        for city2 in &civ2.cities {
            let aerial_distance = city1.location.aerial_distance_to(&city2.location);
            if closest.map_or(true, |it| aerial_distance < it.aerial_distance) {
                closest = Some(CityDistance {
                    city1,
                    city2,
                    aerial_distance,
                });
            }
        }
    }
    closest
}

pub fn get_min_distance_between_cities(civ1: &Civilization, civ2: &Civilization) -> i32 {
    get_closest_cities(civ1, civ2).map_or(i32::MAX, |it| it.aerial_distance)
}

fn combat_strength(game: &GameInfo, civ: &Civilization) -> f32 {
    let capital_strength = civ.get_capital().map_or(0.0, |capital| {
        capital.get_city_strength(&game.ruleset, civ.tech.researched_techs_percent(&game.ruleset))
    });
    civ.get_force() as f32 + BASE_FORCE + capital_strength
}

/// Owners whose tiles `civ` may cross on the way to `other_civ`.
fn passable_owners(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> BTreeSet<String> {
    game.civilizations
        .iter()
        .map(|it| it.civ_name.as_str())
        .filter(|owner| *owner == other_civ.civ_name || can_pass_through_tiles(game, civ, owner))
        .map(str::to_string)
        .collect()
}

fn can_move_through(tile: &Tile, passable_owners: &BTreeSet<String>) -> bool {
    !tile.is_impassible() && tile.get_owner().map_or(true, |owner| passable_owners.contains(owner))
}

/// How much `civ` wants to attack `other_civ`; 0 means not at all.
///
/// Zero when they are stronger, when none of our units survives attacking
/// their closest city, or when no path from our capital reaches any of
/// their cities. Otherwise a sum of independent modifiers.
pub fn motivation_to_attack(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> i32 {
    let Some(closest_cities) = get_closest_cities(civ, other_civ) else {
        return 0;
    };
    let Some(our_capital) = civ.get_capital() else {
        return 0;
    };
    let ruleset = &game.ruleset;

    let our_combat_strength = combat_strength(game, civ);
    let mut their_combat_strength = combat_strength(game, other_civ);
    if other_civ.is_city_state() {
        their_combat_strength += other_civ
            .get_protector_civ_names()
            .iter()
            .filter(|it| **it != civ.civ_name)
            .filter_map(|it| game.get_civilization(it))
            .map(|it| it.get_force() as f32)
            .sum::<f32>();
    }
    if their_combat_strength > our_combat_strength {
        return 0;
    }

    let our_city = closest_cities.city1;
    let their_city = closest_cities.city2;

    let their_city_combatant = their_city.combatant(ruleset, other_civ.tech.researched_techs_percent(ruleset));
    let can_attack_without_dying = civ.get_military_units().any(|unit| {
        game.combat
            .calculate_damage_to_attacker(&unit.combatant(), &their_city_combatant)
            < 100
    });
    if !can_attack_without_dying {
        return 0;
    }

    let passable_owners = passable_owners(game, civ, other_civ);

    // The capital-wide search runs on its own thread while we trace the land path here
    let capital_search = {
        let passable_owners = passable_owners.clone();
        ReachedTiles::spawn(game.tile_map.clone(), our_capital.location, move |tile| {
            can_move_through(tile, &passable_owners)
        })
    };

    let mut land_path_bfs = Bfs::new(&game.tile_map, our_city.location, |tile| {
        tile.is_land() && can_move_through(tile, &passable_owners)
    });
    land_path_bfs.step_until_destination(&their_city.location);
    let has_land_path = land_path_bfs.has_reached_tile(&their_city.location);

    let reachable_enemy_cities = match capital_search {
        Ok(handle) => match handle.join() {
            Ok(reached) => other_civ
                .cities
                .iter()
                .filter(|it| reached.has_reached_tile(&it.location))
                .count(),
            Err(_) => {
                warn!(civ = %civ.civ_name, target = %other_civ.civ_name, "Reachability search panicked");
                0
            }
        },
        Err(error) => {
            warn!(civ = %civ.civ_name, %error, "Could not spawn reachability search");
            0
        }
    };
    if reachable_enemy_cities == 0 {
        return 0;
    }

    let mut modifiers: Vec<(&str, i32)> = Vec::new();

    let combat_strength_ratio = our_combat_strength / their_combat_strength;
    let combat_strength_modifier = match combat_strength_ratio {
        ratio if ratio > 3.0 => 30,
        ratio if ratio > 2.5 => 25,
        ratio if ratio > 2.0 => 20,
        ratio if ratio > 1.5 => 10,
        _ => 0,
    };
    modifiers.push(("Relative combat strength", combat_strength_modifier));

    if closest_cities.aerial_distance > 7 {
        modifiers.push(("Far away cities", -10));
    }
    if !has_land_path {
        modifiers.push(("No land path", -10));
    }

    if let Some(diplomacy_manager) = civ.get_diplomacy_manager(&other_civ.civ_name) {
        if diplomacy_manager.has_flag(diplomacy::DiplomacyFlags::ResearchAgreement) {
            modifiers.push(("Research Agreement", -5));
        }
        if diplomacy_manager.has_flag(diplomacy::DiplomacyFlags::DeclarationOfFriendship) {
            modifiers.push(("Declaration of Friendship", -10));
        }
        if diplomacy_manager.resources_from_trade().values().any(|it| *it > 0) {
            modifiers.push(("Receiving trade resources", -5));
        }
    }

    let relationship_modifier = match civ.get_relationship_level(&other_civ.civ_name) {
        RelationshipLevel::Unforgivable => 10,
        RelationshipLevel::Enemy => 5,
        // Ally with a DoF can still be attacked for an isolated city
        RelationshipLevel::Ally => -5,
        _ => 0,
    };
    modifiers.push(("Relationship", relationship_modifier));

    let is_isolated = !their_city.get_tiles(&game.tile_map).any(|tile| {
        game.tile_map.neighbors(&tile.position).any(|neighbor| {
            neighbor.is_owned_by(&other_civ.civ_name) && neighbor.owning_city.as_deref() != Some(their_city.id.as_str())
        })
    });
    if is_isolated {
        modifiers.push(("Isolated city", 15));
    }

    if other_civ.is_city_state() {
        modifiers.push(("City-state", -20));
        if other_civ.ally_civ.as_deref() == Some(civ.civ_name.as_str()) {
            modifiers.push(("Allied City-state", -20));
        }
    }

    let about_to_win = other_civ.cities.iter().any(|city| {
        let construction = city.city_constructions.get_current_construction(ruleset);
        match construction {
            Construction::Building(_) => construction.has_unique(UniqueType::TriggersCulturalVictory),
            Construction::Unit(_) => construction.has_unique(UniqueType::AddInCapital),
            Construction::Perpetual(_) => false,
        }
    });
    if about_to_win {
        modifiers.push(("About to win", 15));
    }

    let motivation = modifiers.iter().map(|(_, it)| *it).sum();
    debug!(civ = %civ.civ_name, target = %other_civ.civ_name, motivation, ?modifiers, "Motivation to attack");
    motivation
}

/// Declares war on the civ we are most motivated to attack, if motivated enough.
pub fn declare_war(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if civ.wants_to_focus_on(VictoryFocus::Culture) {
        return;
    }
    if civ.cities.is_empty() || civ.diplomacy.is_empty() {
        return;
    }
    if civ.is_at_war() || civ.happiness <= 0 {
        return;
    }

    let our_military_units = civ.units.iter().filter(|it| !it.is_civilian()).count();
    if our_military_units < civ.cities.len() {
        return;
    }
    // Nobody is set up well enough this early
    if our_military_units < 4 {
        return;
    }
    if civ.cities.len() < 3 {
        return;
    }

    // Without a known city to march on, an army just piles up at home
    let enemy_civs = civ
        .get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|other_civ| {
            other_civ.civ_name != civ_name
                && !other_civ.cities.is_empty()
                && civ
                    .get_diplomacy_manager(&other_civ.civ_name)
                    .is_some_and(|it| it.can_declare_war())
                && other_civ
                    .cities
                    .iter()
                    .any(|city| civ.explored_tiles.contains(&city.location))
        });

    let mut best: Option<(String, i32)> = None;
    for other_civ in enemy_civs {
        let motivation = motivation_to_attack(game, civ, other_civ);
        if best.as_ref().map_or(true, |(_, it)| motivation > *it) {
            best = Some((other_civ.civ_name.clone(), motivation));
        }
    }
    let Some((target, motivation)) = best else {
        return;
    };
    if motivation >= DECLARE_WAR_THRESHOLD {
        info!(civ = %civ_name, %target, motivation, "Declaring war");
        diplomacy_functions::declare_war(game, civ_name, &target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, add_units, GameBuilder};
    use util::HexCoord;

    /// Rome with three cities and a big army, Greece with one city nearby.
    fn war_ready_game() -> GameInfo {
        let mut game = GameBuilder::new()
            .map_radius(12)
            .major_civ("Rome")
            .major_civ("Greece")
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-6, 0));
        add_city(&mut game, "Rome", HexCoord::new(-6, 4));
        add_city(&mut game, "Rome", HexCoord::new(-2, -4));
        add_city(&mut game, "Greece", HexCoord::new(1, 0));
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-6, 0), 8);
        let rome = game.get_civilization_mut("Rome").unwrap();
        rome.happiness = 5;
        rome.explored_tiles.insert(HexCoord::new(1, 0));
        game
    }

    fn motivation(game: &GameInfo) -> i32 {
        motivation_to_attack(
            game,
            game.get_civilization("Rome").unwrap(),
            game.get_civilization("Greece").unwrap(),
        )
    }

    #[test]
    fn test_closest_cities_first_minimum_wins() {
        let mut game = GameBuilder::new().major_civ("Rome").major_civ("Greece").build();
        add_city(&mut game, "Rome", HexCoord::new(-3, 0));
        add_city(&mut game, "Rome", HexCoord::new(3, 0));
        add_city(&mut game, "Greece", HexCoord::new(0, 0));
        let closest = get_closest_cities(
            game.get_civilization("Rome").unwrap(),
            game.get_civilization("Greece").unwrap(),
        )
        .unwrap();
        assert_eq!(closest.aerial_distance, 3);
        assert_eq!(closest.city1.location, HexCoord::new(-3, 0));
    }

    #[test]
    fn test_no_cities_means_no_motivation() {
        let game = GameBuilder::new().major_civ("Rome").major_civ("Greece").build();
        assert_eq!(motivation(&game), 0);
        assert_eq!(
            get_min_distance_between_cities(
                game.get_civilization("Rome").unwrap(),
                game.get_civilization("Greece").unwrap()
            ),
            i32::MAX
        );
    }

    #[test]
    fn test_stronger_target_means_no_motivation() {
        let mut game = war_ready_game();
        add_units(&mut game, "Greece", "Swordsman", HexCoord::new(1, 0), 12);
        assert_eq!(motivation(&game), 0);
    }

    #[test]
    fn test_weak_isolated_target_is_tempting() {
        let game = war_ready_game();
        assert!(motivation(&game) >= DECLARE_WAR_THRESHOLD);
    }

    #[test]
    fn test_city_state_target_is_discounted() {
        let mut game = war_ready_game();
        let major = motivation(&game);
        game.get_civilization_mut("Greece").unwrap().kind = civilization::CivKind::CityState(civilization::CityStateType::Militaristic);
        assert_eq!(motivation(&game), major - 20);
    }

    #[test]
    fn test_declares_war_when_motivated() {
        let mut game = war_ready_game();
        declare_war(&mut game, "Rome");
        assert!(game.get_civilization("Rome").unwrap().is_at_war_with("Greece"));
    }

    #[test]
    fn test_each_precondition_blocks_war() {
        let setups: [(&str, fn(&mut GameInfo)); 6] = [
            ("too few cities", |game| {
                game.get_civilization_mut("Rome").unwrap().cities.truncate(2);
            }),
            ("fewer than four military units", |game| {
                game.get_civilization_mut("Rome").unwrap().units.truncate(3);
            }),
            ("fewer military units than cities", |game| {
                add_city(game, "Rome", HexCoord::new(-10, 2));
                add_city(game, "Rome", HexCoord::new(-3, 8));
                game.get_civilization_mut("Rome").unwrap().units.truncate(4);
            }),
            ("already at war", |game| {
                game.civilizations.push(Civilization::new("Persia", civilization::CivKind::Major));
                civilization::diplomacy_functions::make_civilizations_meet(game, "Rome", "Persia");
                civilization::diplomacy_functions::declare_war(game, "Rome", "Persia");
            }),
            ("unhappy", |game| {
                game.get_civilization_mut("Rome").unwrap().happiness = 0;
            }),
            ("culture focus", |game| {
                game.get_civilization_mut("Rome").unwrap().victory_focus = VictoryFocus::Culture;
            }),
        ];
        for (reason, setup) in setups {
            let mut game = war_ready_game();
            setup(&mut game);
            // Only the precondition may stop us, not a lack of motivation
            assert!(motivation(&game) >= DECLARE_WAR_THRESHOLD, "{}", reason);
            declare_war(&mut game, "Rome");
            assert!(!game.get_civilization("Rome").unwrap().is_at_war_with("Greece"), "{}", reason);
        }
    }

    #[test]
    fn test_city_state_protectors_count_towards_its_strength() {
        let mut game = war_ready_game();
        game.get_civilization_mut("Greece").unwrap().kind =
            civilization::CivKind::CityState(civilization::CityStateType::Militaristic);
        game.civilizations.push(Civilization::new("Persia", civilization::CivKind::Major));
        civilization::diplomacy_functions::make_civilizations_meet(&mut game, "Greece", "Persia");
        add_units(&mut game, "Persia", "Swordsman", HexCoord::new(6, -3), 12);
        assert!(motivation(&game) > 0);

        civilization::city_state_functions::add_protector_civ(&mut game, "Greece", "Persia");
        assert!(game.get_civilization("Greece").unwrap().is_protected_by("Persia"));
        assert_eq!(motivation(&game), 0);
    }
}
