use civilization::city_state_functions::{
    add_protector_civ, can_be_married_by, can_provide_stat, diplomatic_marriage, get_tribute_willingness,
    other_civ_can_pledge_protection, other_civ_can_withdraw_protection, receive_gold_gift, remove_protector_civ,
    tribute_gold, tribute_worker,
};
use civilization::turn::purchase_construction;
use civilization::{Civilization, GameInfo};
use diplomacy::{DiplomaticStatus, RelationshipLevel};
use rules::{Stat, UniqueType, VictoryFocus};
use tracing::debug;

use crate::civilization::motivation_to_attack_automation::get_min_distance_between_cities;

const SMALL_GIFT: i32 = 250;
const LARGE_GIFT: i32 = 500;

fn influence_with(city_state: &Civilization, civ_name: &str) -> f32 {
    city_state
        .get_diplomacy_manager(civ_name)
        .map_or(0.0, |it| it.influence)
}

fn known_city_state_names(game: &GameInfo, civ: &Civilization) -> Vec<String> {
    civ.get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|it| it.is_city_state())
        .map(|it| it.civ_name.clone())
        .collect()
}

/// Gifts gold to `city_state_name`: a small gift while influence is low,
/// otherwise a large one once we can afford it.
pub fn try_gain_influence(game: &mut GameInfo, civ_name: &str, city_state_name: &str) {
    let (Some(civ), Some(city_state)) = (game.get_civilization(civ_name), game.get_civilization(city_state_name)) else {
        return;
    };
    // Save up
    if civ.gold < SMALL_GIFT {
        return;
    }
    if influence_with(city_state, civ_name) < 20.0 {
        receive_gold_gift(game, city_state_name, civ_name, SMALL_GIFT);
        return;
    }
    // Not worth it until we can afford two gifts' worth
    if civ.gold < LARGE_GIFT {
        return;
    }
    receive_gold_gift(game, city_state_name, civ_name, LARGE_GIFT);
}

/// Spends gold on city-state marriages, influence and purchases in cities.
pub fn use_gold(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let city_states = known_city_state_names(game, civ);

    if civ.happiness > 0 && civ.has_unique(&game.ruleset, UniqueType::CityStateCanBeBoughtForGold) {
        for city_state_name in &city_states {
            let (Some(civ), Some(city_state)) = (game.get_civilization(civ_name), game.get_civilization(city_state_name))
            else {
                continue;
            };
            if can_be_married_by(game, city_state, civ) {
                diplomatic_marriage(game, city_state_name, civ_name);
            }
            // Each marriage costs happiness
            if game.get_civilization(civ_name).map_or(true, |it| it.happiness <= 0) {
                break;
            }
        }
    }

    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if let Some(city_state_name) = influence_target(game, civ, &city_states) {
        try_gain_influence(game, civ_name, &city_state_name);
        return;
    }

    let mut cities: Vec<(String, i32)> = civ.cities.iter().map(|it| (it.id.clone(), it.population)).collect();
    cities.sort_by(|a, b| b.1.cmp(&a.1));
    for (city_id, _) in cities {
        let Some(civ) = game.get_civilization(civ_name) else {
            return;
        };
        let Some(city) = civ.get_city(&city_id) else {
            continue;
        };
        let construction = city.city_constructions.get_current_construction(&game.ruleset);
        if construction.is_perpetual() {
            continue;
        }
        let Some(cost) = construction.gold_cost() else {
            continue;
        };
        if civ.gold / 3 >= cost && purchase_construction(game, civ_name, &city_id) {
            debug!(civ = %civ_name, city = %city_id, cost, "Bought construction");
        }
    }
}

/// The city-state worth a gold gift this turn, if any.
fn influence_target(game: &GameInfo, civ: &Civilization, city_states: &[String]) -> Option<String> {
    let civ_name = civ.civ_name.as_str();
    if civ.wants_to_focus_on(VictoryFocus::Culture) {
        let wooed = city_states.iter().find(|name| {
            game.get_civilization(name).is_some_and(|city_state| {
                can_provide_stat(city_state, Stat::Culture) && influence_with(city_state, civ_name) < 40.0
            })
        });
        if wooed.is_some() {
            return wooed.cloned();
        }
    }
    if civ.is_city_state() {
        return None;
    }

    let mut best: Option<(&Civilization, i32)> = None;
    for city_state in city_states.iter().filter_map(|it| game.get_civilization(it)) {
        let value = value_city_state_alliance(game, civ, city_state);
        if best.map_or(true, |(_, it)| value > it) {
            best = Some((city_state, value));
        }
    }
    let (city_state, value) = best?;
    if city_state.ally_civ.as_deref() != Some(civ_name) && value > 0 {
        Some(city_state.civ_name.clone())
    } else {
        None
    }
}

/// How much `civ` stands to gain from allying `city_state`; may be negative.
pub fn value_city_state_alliance(game: &GameInfo, civ: &Civilization, city_state: &Civilization) -> i32 {
    let mut value = 0;

    if civ.wants_to_focus_on(VictoryFocus::Culture) && can_provide_stat(city_state, Stat::Culture) {
        value += 10;
    } else if civ.wants_to_focus_on(VictoryFocus::Science) && can_provide_stat(city_state, Stat::Science) {
        value += 10;
    } else if civ.wants_to_focus_on(VictoryFocus::Military) {
        if !city_state.is_alive() {
            value -= 5;
        } else {
            // Close city-states are better conquered than allied
            let distance = get_min_distance_between_cities(civ, city_state);
            if distance < 20 {
                value -= (20 - distance) / 4;
            }
        }
    } else if civ.wants_to_focus_on(VictoryFocus::Diplomacy) {
        value += 5;
    }

    if civ.happiness < 5 && can_provide_stat(city_state, Stat::Happiness) {
        value += 10 - civ.happiness;
    }
    if civ.happiness > 5 && can_provide_stat(city_state, Stat::Food) {
        value += 5;
    }

    if !city_state.is_alive() || city_state.cities.is_empty() || civ.cities.is_empty() {
        return value;
    }

    // Bullying for cash is the better deal when broke
    if civ.gold < 100 {
        value -= 5;
    }

    if let Some(ally) = city_state.ally_civ.as_deref().filter(|it| *it != civ.civ_name) {
        let third_civ_influence = influence_with(city_state, ally) as i32;
        value -= (third_civ_influence - 60) / 10;
    }

    let our_luxuries = civ.owned_luxuries(&game.ruleset);
    value += city_state
        .owned_luxuries(&game.ruleset)
        .iter()
        .filter(|it| !our_luxuries.contains(*it))
        .count() as i32;

    value
}

/// Pledges protection to city-states that like us, withdraws it from the rest.
pub fn protect_city_states(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let mut pledges = Vec::new();
    let mut withdrawals = Vec::new();
    for city_state in civ
        .get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|it| !it.is_defeated() && it.is_city_state())
    {
        let relationship = city_state.get_relationship_level(civ_name);
        if relationship >= RelationshipLevel::Friend && other_civ_can_pledge_protection(city_state, civ) {
            pledges.push(city_state.civ_name.clone());
        } else if relationship < RelationshipLevel::Friend && other_civ_can_withdraw_protection(city_state, civ) {
            withdrawals.push(city_state.civ_name.clone());
        }
    }
    for city_state_name in pledges {
        add_protector_civ(game, &city_state_name, civ_name);
    }
    for city_state_name in withdrawals {
        remove_protector_civ(game, &city_state_name, civ_name, false);
    }
}

/// Demands tribute from city-states we do not care for and that would pay.
pub fn bully_city_states(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let mut demands = Vec::new();
    for city_state in civ
        .get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|it| !it.is_defeated() && it.is_city_state())
    {
        let at_peace = city_state
            .get_diplomacy_manager(civ_name)
            .is_some_and(|it| it.diplomatic_status == DiplomaticStatus::Peace);
        if city_state.get_relationship_level(civ_name) < RelationshipLevel::Friend
            && at_peace
            && value_city_state_alliance(game, civ, city_state) <= 0
            && get_tribute_willingness(game, city_state, civ, false) >= 0
        {
            let demand_worker = get_tribute_willingness(game, city_state, civ, true) > 0;
            demands.push((city_state.civ_name.clone(), demand_worker));
        }
    }
    for (city_state_name, demand_worker) in demands {
        if demand_worker {
            tribute_worker(game, &city_state_name, civ_name);
        } else {
            tribute_gold(game, &city_state_name, civ_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, GameBuilder};
    use civilization::CityStateType;
    use util::HexCoord;

    fn game() -> GameInfo {
        let mut game = GameBuilder::new()
            .major_civ("Rome")
            .city_state("Geneva", CityStateType::Cultured)
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-5, 0));
        add_city(&mut game, "Geneva", HexCoord::new(5, 0));
        game
    }

    #[test]
    fn test_small_gift_while_influence_is_low() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().gold = 300;
        try_gain_influence(&mut game, "Rome", "Geneva");
        assert_eq!(game.get_civilization("Rome").unwrap().gold, 50);
        let geneva = game.get_civilization("Geneva").unwrap();
        assert!(influence_with(geneva, "Rome") > 0.0);
    }

    #[test]
    fn test_no_gift_when_poor() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().gold = 200;
        try_gain_influence(&mut game, "Rome", "Geneva");
        assert_eq!(game.get_civilization("Rome").unwrap().gold, 200);
    }

    #[test]
    fn test_culture_focus_values_cultured_city_states() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().victory_focus = VictoryFocus::Culture;
        game.get_civilization_mut("Rome").unwrap().gold = 1000;
        let rome = game.get_civilization("Rome").unwrap();
        let geneva = game.get_civilization("Geneva").unwrap();
        assert!(value_city_state_alliance(&game, rome, geneva) >= 10);
    }

    #[test]
    fn test_rich_civ_buys_current_construction() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        {
            let rome = game.get_civilization_mut("Rome").unwrap();
            rome.gold = 5000;
            rome.get_city_mut(&city_id)
                .unwrap()
                .city_constructions
                .set_current_construction("Monument");
        }
        use_gold(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        assert!(rome.get_city(&city_id).unwrap().city_constructions.is_built("Monument"));
        assert!(rome.gold < 5000);
    }
}
