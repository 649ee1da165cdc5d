//! Yields and bookkeeping applied at the end of a civilization's turn.

use rules::{Construction, HasUniques, PerpetualConstruction, Stat, Stats, UniqueType};
use tracing::debug;
use trade::RESEARCH_AGREEMENT;

use crate::city_state_functions::{city_state_bonuses_for, update_ally_civ_for_city_state};
use crate::civilization::Civilization;
use crate::game_info::GameInfo;
use crate::notification::NotificationCategory;

const FREE_UNITS: usize = 3;
const BASE_UNIT_COST: f32 = 0.5;
const UNIT_HEAL_PER_TURN: i32 = 10;
const CITY_HEAL_PER_TURN: i32 = 20;
/// Production spent per point of gold or science on a conversion build
const PRODUCTION_CONVERSION_RATE: f32 = 4.0;

/// Gold owed each turn for units beyond the free allowance, growing with game progress.
pub fn unit_upkeep(unit_count: usize, turns: i32) -> i32 {
    let paid_units = unit_count.saturating_sub(FREE_UNITS) as f32;
    if paid_units == 0.0 {
        return 0;
    }
    let game_progress = (turns as f32 / 500.0).min(1.0);
    let cost = paid_units * BASE_UNIT_COST * (1.0 + game_progress);
    cost.powf(1.0 + game_progress / 3.0) as i32
}

/// Stats each city following our pantheon or religion gains.
fn religion_bonus(game: &GameInfo, civ: &Civilization) -> Stats {
    civ.religion_manager
        .religion
        .as_ref()
        .and_then(|it| game.religions.get(it))
        .map(|it| it.stats(&game.ruleset))
        .unwrap_or_default()
}

fn conversion_stat(perpetual: PerpetualConstruction) -> Option<Stat> {
    match perpetual {
        PerpetualConstruction::Science => Some(Stat::Science),
        PerpetualConstruction::Gold => Some(Stat::Gold),
        PerpetualConstruction::Culture => Some(Stat::Culture),
        PerpetualConstruction::Faith => Some(Stat::Faith),
        PerpetualConstruction::Idle => None,
    }
}

/// Recomputes city yields and the civ-wide `stats_for_next_turn`.
pub fn update_stats_for_next_turn(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let religion_bonus = religion_bonus(game, civ);
    let city_state_bonus = if civ.is_major_civ() {
        city_state_bonuses_for(game, civ)
    } else {
        Stats::default()
    };
    let upkeep = unit_upkeep(civ.units.len(), game.turns);
    let gold_from_trades: i32 = civ.diplomacy.values().map(|it| it.gold_per_turn_from_trade()).sum();

    let ruleset = game.ruleset.clone();
    let tile_map = game.tile_map.clone();
    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    let mut total = Stats::default();
    for city in civ.cities.iter_mut() {
        city.update_stats(&tile_map, &ruleset, &religion_bonus);
        total += city.current_stats;
        if let Construction::Perpetual(perpetual) = city.city_constructions.get_current_construction(&ruleset) {
            if let Some(stat) = conversion_stat(perpetual) {
                total.add_stat(stat, city.current_stats.production / PRODUCTION_CONVERSION_RATE);
            }
        }
    }
    total += city_state_bonus;
    total.gold += (gold_from_trades - upkeep) as f32;
    civ.stats_for_next_turn = total;
    civ.update_happiness(&ruleset);
    civ.happiness += city_state_bonus.happiness as i32;
}

/// Applies one turn of yields, production, research and countdowns for `civ_name`.
pub fn end_turn(game: &mut GameInfo, civ_name: &str) {
    update_stats_for_next_turn(game, civ_name);
    let ruleset = game.ruleset.clone();

    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    let stats = civ.stats_for_next_turn;
    civ.add_gold(stats.gold as i32);
    civ.policies.stored_culture += stats.culture as i32;
    civ.religion_manager.add_faith(stats.faith as i32);

    let mut finished_trades = Vec::new();
    for manager in civ.diplomacy.values_mut() {
        finished_trades.extend(manager.next_turn().ended_trades);
    }
    let agreement_science: i32 = finished_trades
        .iter()
        .filter(|it| it.is_research_agreement())
        .flat_map(|it| it.our_offers.iter().chain(it.their_offers.iter()))
        .filter(|it| it.name == RESEARCH_AGREEMENT)
        .map(|it| it.amount)
        .max()
        .unwrap_or(0);

    let science = stats.science as i32 + agreement_science;
    let completed_techs = civ.tech.add_science(science, &ruleset);
    for tech in &completed_techs {
        civ.add_notification(&format!("Research of [{}] has completed!", tech), NotificationCategory::General);
    }

    for (_, turns) in civ.civ_flags.iter_mut() {
        *turns -= 1;
    }
    civ.civ_flags.retain(|_, turns| *turns > 0);

    for unit in civ.units.iter_mut() {
        unit.heal(UNIT_HEAL_PER_TURN);
        unit.has_moved = false;
    }

    let mut completed = Vec::new();
    for city in civ.cities.iter_mut() {
        let max_health = city.get_max_health(&ruleset);
        city.health = (city.health + CITY_HEAL_PER_TURN).min(max_health);
        city.attacked_this_turn = false;
        city.has_sold_building_this_turn = false;
        if city.resistance_counter > 0 {
            city.resistance_counter -= 1;
        }
        let production = city.current_stats.production as i32;
        if let Some(name) = city.city_constructions.add_production_points(production, &ruleset) {
            completed.push((city.id.clone(), city.location, name));
        }
        city.grow(&ruleset);
    }

    let tile_map = game.tile_map.clone();
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        for city in civ.cities.iter_mut() {
            city.reassign_all_population(&tile_map, &ruleset);
        }
    }

    for (city_id, location, name) in completed {
        complete_construction(game, civ_name, &city_id, location, &name);
    }

    if game.get_civilization(civ_name).is_some_and(|it| it.is_city_state()) {
        if let Some(city_state) = game.get_civilization_mut(civ_name) {
            for manager in city_state.diplomacy.values_mut() {
                manager.decay_influence(0.0);
            }
        }
        update_ally_civ_for_city_state(game, civ_name);
    }

    let tile_map = game.tile_map.clone();
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.update_civ_resources(&tile_map, &ruleset);
        civ.update_happiness(&ruleset);
    }
    debug!(civ = %civ_name, gold = stats.gold, science, "Turn ended");
}

/// Buys the current construction of `city_id` outright with gold.
///
/// Returns false when it cannot be bought or the civ cannot afford it.
pub fn purchase_construction(game: &mut GameInfo, civ_name: &str, city_id: &str) -> bool {
    let ruleset = game.ruleset.clone();
    let Some(civ) = game.get_civilization(civ_name) else {
        return false;
    };
    let Some(city) = civ.get_city(city_id) else {
        return false;
    };
    let Some(cost) = city.city_constructions.get_current_construction(&ruleset).gold_cost() else {
        return false;
    };
    if civ.gold < cost {
        return false;
    }
    let location = city.location;

    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return false;
    };
    let Some(name) = civ
        .get_city_mut(city_id)
        .and_then(|it| it.city_constructions.complete_current_construction())
    else {
        return false;
    };
    civ.add_gold(-cost);
    debug!(civ = %civ_name, city = %city_id, construction = %name, cost, "Construction purchased");
    complete_construction(game, civ_name, city_id, location, &name);
    true
}

fn complete_construction(game: &mut GameInfo, civ_name: &str, city_id: &str, location: util::HexCoord, name: &str) {
    let ruleset = game.ruleset.clone();
    if ruleset.get_building(name).is_some() {
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            if let Some(city) = civ.get_city_mut(city_id) {
                city.city_constructions.add_building(name);
            }
            civ.add_notification(&format!("[{}] has been built", name), NotificationCategory::Production);
        }
        return;
    }
    let Some(unit) = ruleset.get_unit(name) else {
        return;
    };
    if unit.has_unique(UniqueType::SpaceshipPart) {
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            civ.victory_manager.add_spaceship_part(name);
            civ.add_notification(&format!("[{}] has been added to the spaceship", name), NotificationCategory::Production);
        }
        return;
    }
    if game.place_unit(civ_name, name, location).is_some() {
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            civ.add_notification(&format!("[{}] has been trained", name), NotificationCategory::Units);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civilization::{CityStateType, CivFlags};
    use crate::testing::{add_city, add_units, GameBuilder};
    use trade::{Trade, TradeOffer, TradeOfferType};
    use util::HexCoord;

    fn game_with_city() -> (GameInfo, String) {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        let city_id = add_city(&mut game, "Rome", HexCoord::default());
        (game, city_id)
    }

    #[test]
    fn test_upkeep_starts_after_free_units() {
        assert_eq!(unit_upkeep(3, 0), 0);
        assert_eq!(unit_upkeep(5, 0), 1);
        assert!(unit_upkeep(13, 400) > unit_upkeep(13, 0));
    }

    #[test]
    fn test_finished_building_is_added_to_city() {
        let (mut game, city_id) = game_with_city();
        {
            let city = game.get_civilization_mut("Rome").unwrap().get_city_mut(&city_id).unwrap();
            city.city_constructions.set_current_construction("Monument");
            city.city_constructions.in_progress_constructions.insert("Monument".to_string(), 39);
        }
        end_turn(&mut game, "Rome");
        let city = game.get_civilization("Rome").unwrap().get_city(&city_id).unwrap();
        assert!(city.city_constructions.is_built("Monument"));
        assert_eq!(city.city_constructions.current_construction_name(), "Nothing");
    }

    #[test]
    fn test_finished_unit_appears_in_city() {
        let (mut game, city_id) = game_with_city();
        {
            let city = game.get_civilization_mut("Rome").unwrap().get_city_mut(&city_id).unwrap();
            city.city_constructions.set_current_construction("Warrior");
            city.city_constructions.in_progress_constructions.insert("Warrior".to_string(), 39);
        }
        end_turn(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.units.len(), 1);
        assert_eq!(rome.units[0].position, HexCoord::default());
    }

    #[test]
    fn test_unit_upkeep_costs_gold() {
        let (mut game, _) = game_with_city();
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(1, 0), 3);
        update_stats_for_next_turn(&mut game, "Rome");
        let without_upkeep = game.get_civilization("Rome").unwrap().stats_for_next_turn.gold;
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(1, 0), 4);
        update_stats_for_next_turn(&mut game, "Rome");
        let with_upkeep = game.get_civilization("Rome").unwrap().stats_for_next_turn.gold;
        assert_eq!(without_upkeep - with_upkeep, unit_upkeep(7, 0) as f32);
    }

    #[test]
    fn test_civ_flags_count_down() {
        let (mut game, _) = game_with_city();
        game.get_civilization_mut("Rome").unwrap().set_flag(CivFlags::RecentlyBullied, 2);
        end_turn(&mut game, "Rome");
        assert!(game.get_civilization("Rome").unwrap().has_flag(CivFlags::RecentlyBullied));
        end_turn(&mut game, "Rome");
        assert!(!game.get_civilization("Rome").unwrap().has_flag(CivFlags::RecentlyBullied));
    }

    #[test]
    fn test_research_agreement_pays_out_science() {
        let mut game = GameBuilder::new().major_civ("Rome").major_civ("Greece").everyone_meets().build();
        add_city(&mut game, "Rome", HexCoord::default());
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::with_duration(RESEARCH_AGREEMENT, TradeOfferType::Treaty, 200, 1));
        trade.their_offers.push(TradeOffer::with_duration(RESEARCH_AGREEMENT, TradeOfferType::Treaty, 200, 1));
        {
            let rome = game.get_civilization_mut("Rome").unwrap();
            rome.tech.techs_to_research = vec!["Agriculture".to_string(), "Pottery".to_string()];
            rome.get_diplomacy_manager_mut("Greece").unwrap().trades.push(trade);
        }
        end_turn(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        assert!(rome.tech.is_researched("Agriculture"));
        assert!(rome.tech.is_researched("Pottery"));
        assert!(rome.get_diplomacy_manager("Greece").unwrap().trades.is_empty());
    }

    #[test]
    fn test_city_state_influence_decays() {
        let mut game = GameBuilder::new()
            .major_civ("Rome")
            .city_state("Monaco", CityStateType::Cultured)
            .everyone_meets()
            .build();
        add_city(&mut game, "Monaco", HexCoord::default());
        game.get_civilization_mut("Monaco")
            .unwrap()
            .get_diplomacy_manager_mut("Rome")
            .unwrap()
            .influence = 30.0;
        end_turn(&mut game, "Monaco");
        let influence = game
            .get_civilization("Monaco")
            .unwrap()
            .get_diplomacy_manager("Rome")
            .unwrap()
            .influence;
        assert!(influence < 30.0);
    }
}
