use std::collections::BTreeMap;

use civilization::city_state_functions::{
    get_free_tech_for_city_state, update_ally_civ_for_city_state, update_diplomatic_relationship_for_city_state,
};
use civilization::diplomacy_functions::{
    agree_not_to_settle_near, refuse_demand_not_to_settle_near, sign_declaration_of_friendship,
};
use civilization::{threat_assessment, AlertType, GameInfo, NotificationCategory, PopupAlert, ThreatLevel};
use diplomacy::{DiplomacyFlags, DiplomaticModifiers, RelationshipLevel};
use rand::seq::IndexedRandom;
use rules::{BaseUnit, Building, Construction, HasUniques, MilestoneType, UniqueType, VictoryFocus};
use tracing::{debug, trace};

use crate::automation::{get_reserved_space_resource_amount, try_train_military_unit};
use crate::city::construction_automation::choose_next_construction;
use crate::civilization::motivation_to_attack_automation::declare_war;
use crate::civilization::religion_automation::{choose_religious_beliefs, spend_faith_on_religion};
use crate::civilization::trade_automation::{
    exchange_luxuries, offer_peace_treaty, offer_research_agreement, respond_to_trade_requests,
};
use crate::civilization::use_gold_automation::{bully_city_states, protect_city_states, use_gold};
use crate::unit::unit_automation::{automate_units, try_bombard_enemy};

/// Cities bigger than this stop being puppets.
const ANNEX_POPULATION: i32 = 9;
const IGNORE_SETTLING_TURNS: i32 = 100;
const BETRAYED_PROMISE_PENALTY: f32 = -20.0;
/// Happiness a civ keeps above its city count before founding more.
const SETTLER_HAPPINESS_MARGIN: i32 = 5;

/// Plays one AI turn for `civ_name`.
///
/// Diplomacy comes first so wars and trades are settled before gold is spent
/// and units move; cities choose their builds last so they see the outcome.
pub fn automate_civ_moves(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if civ.is_barbarian() {
        automate_units(game, civ_name);
        return;
    }
    let is_major = civ.is_major_civ();
    let is_city_state = civ.is_city_state();
    debug!(civ = %civ_name, turn = game.turns, "Automating civilization");

    respond_to_popup_alerts(game, civ_name);
    respond_to_trade_requests(game, civ_name);

    if is_major {
        declare_war(game, civ_name);
        offer_peace_treaty(game, civ_name);
        if game.religion_enabled {
            spend_faith_on_religion(game, civ_name);
        }
        offer_research_agreement(game, civ_name);
        exchange_luxuries(game, civ_name);
        issue_requests(game, civ_name);
        adopt_policy(game, civ_name);
        free_up_space_resources(game, civ_name);
    } else if is_city_state {
        get_free_tech_for_city_state(game, civ_name);
        update_ally_civ_for_city_state(game, civ_name);
        update_diplomatic_relationship_for_city_state(game, civ_name);
    }

    choose_tech_to_research(game, civ_name);
    automate_city_bombardment(game, civ_name);
    use_gold(game, civ_name);
    if !is_city_state {
        protect_city_states(game, civ_name);
        bully_city_states(game, civ_name);
    }
    automate_units(game, civ_name);

    if is_major && game.religion_enabled {
        // Prophets bought this turn decide what there is to choose
        choose_religious_beliefs(game, civ_name);
    }

    automate_cities(game, civ_name);
    train_settler(game, civ_name);
    try_vote_for_diplomatic_victory(game, civ_name);
}

/// Answers the alerts that need a decision and drops the rest.
pub fn respond_to_popup_alerts(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let alerts: Vec<PopupAlert> = civ.popup_alerts.clone();
    for alert in alerts {
        match alert.alert_type {
            AlertType::DemandToStopSettlingCitiesNear => {
                let (Some(civ), Some(demander)) =
                    (game.get_civilization(civ_name), game.get_civilization(&alert.value))
                else {
                    continue;
                };
                if threat_assessment(civ, demander) >= ThreatLevel::High {
                    agree_not_to_settle_near(game, civ_name, &alert.value);
                } else {
                    refuse_demand_not_to_settle_near(game, civ_name, &alert.value);
                }
            }
            AlertType::DeclarationOfFriendship => respond_to_declaration_of_friendship(game, civ_name, &alert.value),
            _ => {}
        }
    }
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.popup_alerts.clear();
    }
}

fn respond_to_declaration_of_friendship(game: &mut GameInfo, civ_name: &str, requester_name: &str) {
    let (Some(civ), Some(requester)) = (game.get_civilization(civ_name), game.get_civilization(requester_name)) else {
        return;
    };
    let denounced_us = requester
        .get_diplomacy_manager(civ_name)
        .is_some_and(|it| it.has_flag(DiplomacyFlags::Denunciation));
    let accepted = civ.get_relationship_level(requester_name) > RelationshipLevel::Neutral && !denounced_us;
    let text = if accepted {
        sign_declaration_of_friendship(game, civ_name, requester_name);
        format!("We have signed a Declaration of Friendship with [{}]!", civ_name)
    } else {
        format!("[{}] has denied our Declaration of Friendship!", civ_name)
    };
    if let Some(requester) = game.get_civilization_mut(requester_name) {
        requester.add_notification(&text, NotificationCategory::Diplomacy);
    }
}

/// Complains to civs that settled near our cities.
pub fn issue_requests(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let settlers_near_us: Vec<String> = civ
        .get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|it| it.is_major_civ() && !civ.is_at_war_with(&it.civ_name))
        .filter(|it| {
            civ.get_diplomacy_manager(&it.civ_name)
                .is_some_and(|manager| manager.has_flag(DiplomacyFlags::SettledCitiesNearUs))
        })
        .map(|it| it.civ_name.clone())
        .collect();
    for other_civ_name in settlers_near_us {
        on_city_settled_near_borders(game, civ_name, &other_civ_name);
    }
}

/// Demands that `other_civ_name` stops settling near us, or holds them to an earlier promise.
fn on_city_settled_near_borders(game: &mut GameInfo, civ_name: &str, other_civ_name: &str) {
    let (Some(civ), Some(other_civ)) = (game.get_civilization(civ_name), game.get_civilization(other_civ_name)) else {
        return;
    };
    let Some(manager) = civ.get_diplomacy_manager(other_civ_name) else {
        return;
    };
    let ignoring = manager.has_flag(DiplomacyFlags::IgnoreThemSettlingNearUs);
    let promised = manager.has_flag(DiplomacyFlags::AgreedToNotSettleNearUs);
    let threat = threat_assessment(civ, other_civ);

    let Some((civ, other_civ)) = game.civ_pair_mut(civ_name, other_civ_name) else {
        return;
    };
    let Some(manager) = civ.get_diplomacy_manager_mut(other_civ_name) else {
        return;
    };
    manager.remove_flag(DiplomacyFlags::SettledCitiesNearUs);
    if ignoring {
        return;
    }
    if promised {
        manager.remove_flag(DiplomacyFlags::AgreedToNotSettleNearUs);
        manager.set_flag(DiplomacyFlags::IgnoreThemSettlingNearUs, IGNORE_SETTLING_TURNS);
        manager.set_modifier(DiplomaticModifiers::BetrayedPromiseToNotSettleCitiesNearUs, BETRAYED_PROMISE_PENALTY);
        other_civ
            .popup_alerts
            .push(PopupAlert::new(AlertType::CitySettledNearOtherCivDespiteOurPromise, civ_name));
        return;
    }
    if threat < ThreatLevel::High {
        other_civ
            .popup_alerts
            .push(PopupAlert::new(AlertType::DemandToStopSettlingCitiesNear, civ_name));
    }
}

/// Adopts policies while culture allows: the branch with the highest priority,
/// then the most complete one, then a random one among those left.
pub fn adopt_policy(game: &mut GameInfo, civ_name: &str) {
    let ruleset = game.ruleset.clone();
    loop {
        let Some(civ) = game.get_civilization(civ_name) else {
            return;
        };
        let number_of_cities = civ.cities.len();
        if !civ.policies.can_adopt_policy(&ruleset, number_of_cities) {
            return;
        }
        let priorities = civ.policies.branch_priorities(&ruleset, civ.victory_focus);
        let Some(max_priority) = priorities.values().copied().max() else {
            return;
        };
        let mut branches: Vec<&String> = priorities
            .iter()
            .filter(|(_, priority)| **priority == max_priority)
            .map(|(name, _)| name)
            .collect();
        if branches.len() > 1 {
            let completion = civ.policies.branch_completion(&ruleset);
            let most_complete = branches.iter().filter_map(|it| completion.get(*it)).copied().max().unwrap_or(0);
            branches.retain(|it| completion.get(*it).copied().unwrap_or(0) == most_complete);
        }

        let mut rng = game.rng_for(
            civ_name,
            &format!("policy {}", civ.policies.number_of_adopted_policies()),
        );
        let Some(branch) = branches.choose(&mut rng).and_then(|it| ruleset.get_policy_branch(it)) else {
            return;
        };
        let adoptable = civ.policies.adoptable_policies(branch);
        let Some(policy) = adoptable.choose(&mut rng).map(|it| it.to_string()) else {
            return;
        };

        let Some(civ) = game.get_civilization_mut(civ_name) else {
            return;
        };
        civ.policies.adopt(&policy, number_of_cities);
        debug!(civ = %civ_name, policy = %policy, "Adopted policy");
    }
}

/// While adding spaceship parts to the capital is the next step of a victory,
/// gives up one unit and one building per space resource we are short of.
pub fn free_up_space_resources(game: &mut GameInfo, civ_name: &str) {
    let ruleset = game.ruleset.clone();
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let adding_parts = game
        .next_milestones(civ)
        .iter()
        .any(|it| it.milestone_type == MilestoneType::AddedSSPartsInCapital);
    if !adding_parts {
        return;
    }

    for resource in ruleset.space_resources() {
        let Some(civ) = game.get_civilization(civ_name) else {
            return;
        };
        if civ.get_resource_amount(&ruleset, &resource) >= get_reserved_space_resource_amount(civ) {
            continue;
        }

        let mut weakest_unit: Option<(u32, i32)> = None;
        for unit in civ.units.iter().filter(|it| it.requires_resource(&resource)) {
            let force = unit.get_force_evaluation();
            if weakest_unit.map_or(true, |(_, it)| force < it) {
                weakest_unit = Some((unit.id, force));
            }
        }

        let mut rng = game.rng_for(civ_name, &format!("sell {}", resource));
        let mut to_sell: Option<(String, String, i32)> = None;
        for city in civ.cities.iter().filter(|it| !it.has_sold_building_this_turn) {
            let sellable: Vec<&Building> = city
                .get_built_buildings(&ruleset)
                .filter(|it| it.required_resource.as_deref() == Some(resource.as_str()) && !it.is_any_wonder())
                .collect();
            if let Some(building) = sellable.choose(&mut rng) {
                to_sell = Some((city.id.clone(), building.name.clone(), building.cost / 10));
                break;
            }
        }

        let Some(civ) = game.get_civilization_mut(civ_name) else {
            return;
        };
        if let Some((unit_id, _)) = weakest_unit {
            civ.units.retain(|it| it.id != unit_id);
            debug!(civ = %civ_name, resource = %resource, "Disbanded unit to free a space resource");
        }
        if let Some((city_id, building, price)) = to_sell {
            if let Some(city) = civ.get_city_mut(&city_id) {
                city.city_constructions.remove_building(&building);
                city.has_sold_building_this_turn = true;
                civ.add_gold(price);
                debug!(civ = %civ_name, building = %building, "Sold building to free a space resource");
            }
        }
    }
}

/// Queues a random technology among the one or two cheapest cost tiers.
pub fn choose_tech_to_research(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if !civ.tech.techs_to_research.is_empty() {
        return;
    }
    let mut tiers: BTreeMap<i32, Vec<String>> = BTreeMap::new();
    for tech in civ.tech.researchable_techs(&game.ruleset) {
        tiers.entry(tech.cost).or_default().push(tech.name.clone());
    }
    let mut tiers = tiers.into_values();
    let Some(mut candidates) = tiers.next() else {
        return;
    };
    // A lone cheapest tech competes with the next tier
    if candidates.len() == 1 {
        if let Some(next_tier) = tiers.next() {
            candidates.extend(next_tier);
        }
    }
    let mut rng = game.rng_for(civ_name, "tech");
    let Some(chosen) = candidates.choose(&mut rng).cloned() else {
        return;
    };
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        trace!(civ = %civ_name, tech = %chosen, "Queued research");
        civ.tech.techs_to_research.push(chosen);
    }
}

pub fn automate_city_bombardment(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let city_ids: Vec<String> = civ.cities.iter().map(|it| it.id.clone()).collect();
    for city_id in city_ids {
        try_bombard_enemy(game, civ_name, &city_id);
    }
}

/// Annexes grown puppets, reassigns workers and picks what every city builds.
pub fn automate_cities(game: &mut GameInfo, civ_name: &str) {
    let ruleset = game.ruleset.clone();
    let tile_map = game.tile_map.clone();
    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    let mut damaged_cities = Vec::new();
    for city in civ.cities.iter_mut() {
        if city.is_puppet && city.population > ANNEX_POPULATION && !city.is_in_resistance() {
            city.annex_city();
        }
        city.reassign_all_population(&tile_map, &ruleset);
        if city.health < city.get_max_health(&ruleset) {
            damaged_cities.push(city.id.clone());
        }
    }
    let city_ids: Vec<String> = civ.cities.iter().map(|it| it.id.clone()).collect();

    for city_id in city_ids {
        if damaged_cities.contains(&city_id) {
            // Defence before anything else
            try_train_military_unit(game, civ_name, &city_id);
            let training_military = game
                .get_civilization(civ_name)
                .and_then(|it| it.get_city(&city_id))
                .is_some_and(|city| {
                    matches!(
                        city.city_constructions.get_current_construction(&ruleset),
                        Construction::Unit(unit) if unit.is_military()
                    )
                });
            if training_military {
                continue;
            }
        }
        choose_next_construction(game, civ_name, &city_id);
    }
}

/// Starts a settler in our most productive established city when we have room to grow.
pub fn train_settler(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if civ.is_city_state() || civ.is_at_war() {
        return;
    }
    if civ.wants_to_focus_on(VictoryFocus::Culture) && civ.cities.len() > 3 {
        return;
    }
    if civ.cities.is_empty() || civ.happiness <= civ.cities.len() as i32 + SETTLER_HAPPINESS_MARGIN {
        return;
    }
    if civ.units.iter().any(|it| it.has_unique(UniqueType::FoundCity)) {
        return;
    }
    let builds_settler = |construction: Construction| {
        matches!(construction, Construction::Unit(unit) if unit.has_unique(UniqueType::FoundCity))
    };
    if civ
        .cities
        .iter()
        .any(|it| builds_settler(it.city_constructions.get_current_construction(&game.ruleset)))
    {
        return;
    }

    let mut best_city = None;
    for city in civ.cities.iter().filter(|it| !it.is_puppet) {
        let production = city.current_stats.production;
        if best_city.map_or(true, |(_, it)| production > it) {
            best_city = Some((city, production));
        }
    }
    let Some((city, _)) = best_city else {
        return;
    };
    if city.city_constructions.built_buildings.len() < 2 {
        return;
    }
    let context = civilization::CityBuildContext::new(game, civ, city);
    let mut settler = None;
    for unit in game
        .ruleset
        .units
        .iter()
        .filter(|it| it.has_unique(UniqueType::FoundCity))
        .filter(|it| Construction::Unit(*it).is_buildable(&context))
    {
        if settler.map_or(true, |it: &BaseUnit| unit.cost < it.cost) {
            settler = Some(unit);
        }
    }
    let Some(settler) = settler.map(|it| it.name.clone()) else {
        return;
    };
    let city_id = city.id.clone();
    if let Some(city) = game
        .get_civilization_mut(civ_name)
        .and_then(|it| it.get_city_mut(&city_id))
    {
        debug!(civ = %civ_name, city = %city.name, "Training settler");
        city.city_constructions.set_current_construction(&settler);
    }
}

/// Majors vote for the known major they like best; city-states for their ally.
pub fn try_vote_for_diplomatic_victory(game: &mut GameInfo, civ_name: &str) {
    if !game.may_vote_for_diplomatic_victory(civ_name) {
        return;
    }
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let chosen = if civ.is_major_civ() {
        let opinions: Vec<(&str, f32)> = civ
            .get_known_civ_names()
            .filter(|it| {
                game.get_civilization(it)
                    .is_some_and(|other| other.is_major_civ() && !other.is_defeated())
            })
            .filter_map(|it| civ.get_diplomacy_manager(it).map(|manager| (it, manager.opinion_of_other_civ())))
            .collect();
        let highest = opinions.iter().map(|(_, it)| *it).fold(f32::MIN, f32::max);
        let favorites: Vec<&str> = opinions
            .iter()
            .filter(|(_, opinion)| *opinion == highest)
            .map(|(name, _)| *name)
            .collect();
        let mut rng = game.rng_for(civ_name, "vote");
        favorites.choose(&mut rng).map(|it| it.to_string())
    } else {
        civ.ally_civ.clone()
    };
    game.diplomatic_vote_for_civ(civ_name, chosen);
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, add_units, GameBuilder};
    use rules::Ruleset;
    use util::HexCoord;

    fn game() -> GameInfo {
        let mut game = GameBuilder::new()
            .major_civ("Rome")
            .major_civ("Greece")
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-5, 0));
        add_city(&mut game, "Greece", HexCoord::new(5, 0));
        game
    }

    #[test]
    fn test_weak_civ_agrees_to_stop_settling() {
        let mut game = game();
        add_units(&mut game, "Greece", "Warrior", HexCoord::new(5, 0), 6);
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-5, 0), 1);
        game.get_civilization_mut("Rome")
            .unwrap()
            .popup_alerts
            .push(PopupAlert::new(AlertType::DemandToStopSettlingCitiesNear, "Greece"));

        respond_to_popup_alerts(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        let manager = greece.get_diplomacy_manager("Rome").unwrap();
        assert!(manager.has_flag(DiplomacyFlags::AgreedToNotSettleNearUs));
        assert!(game.get_civilization("Rome").unwrap().popup_alerts.is_empty());
    }

    #[test]
    fn test_strong_civ_refuses_to_stop_settling() {
        let mut game = game();
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-5, 0), 6);
        game.get_civilization_mut("Rome")
            .unwrap()
            .popup_alerts
            .push(PopupAlert::new(AlertType::DemandToStopSettlingCitiesNear, "Greece"));

        respond_to_popup_alerts(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        let manager = greece.get_diplomacy_manager("Rome").unwrap();
        assert!(manager.has_flag(DiplomacyFlags::IgnoreThemSettlingNearUs));
    }

    #[test]
    fn test_friendship_denied_at_neutral() {
        let mut game = game();
        game.get_civilization_mut("Rome")
            .unwrap()
            .popup_alerts
            .push(PopupAlert::new(AlertType::DeclarationOfFriendship, "Greece"));

        respond_to_popup_alerts(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        assert!(greece
            .notifications
            .iter()
            .any(|it| it.text == "[Rome] has denied our Declaration of Friendship!"));
    }

    #[test]
    fn test_friendship_accepted_when_favorable() {
        let mut game = game();
        game.get_civilization_mut("Rome")
            .unwrap()
            .get_diplomacy_manager_mut("Greece")
            .unwrap()
            .add_modifier(DiplomaticModifiers::YearsOfPeace, 30.0);
        game.get_civilization_mut("Rome")
            .unwrap()
            .popup_alerts
            .push(PopupAlert::new(AlertType::DeclarationOfFriendship, "Greece"));

        respond_to_popup_alerts(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert!(rome
            .get_diplomacy_manager("Greece")
            .unwrap()
            .has_flag(DiplomacyFlags::DeclarationOfFriendship));
    }

    #[test]
    fn test_settling_near_us_triggers_demand() {
        let mut game = game();
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-5, 0), 2);
        add_units(&mut game, "Greece", "Warrior", HexCoord::new(5, 0), 2);
        game.found_city("Greece", HexCoord::new(-1, 0));
        assert!(game
            .get_civilization("Rome")
            .unwrap()
            .get_diplomacy_manager("Greece")
            .unwrap()
            .has_flag(DiplomacyFlags::SettledCitiesNearUs));

        issue_requests(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        assert!(greece
            .popup_alerts
            .iter()
            .any(|it| it.alert_type == AlertType::DemandToStopSettlingCitiesNear && it.value == "Rome"));
        let rome_manager = game.get_civilization("Rome").unwrap().get_diplomacy_manager("Greece").unwrap();
        assert!(!rome_manager.has_flag(DiplomacyFlags::SettledCitiesNearUs));
        // Only a broken promise makes us stop complaining
        assert!(!rome_manager.has_flag(DiplomacyFlags::IgnoreThemSettlingNearUs));
    }

    #[test]
    fn test_tech_chosen_from_cheapest_tiers() {
        let mut game = game();
        choose_tech_to_research(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        let queued = rome.tech.techs_to_research.first().unwrap();
        let cost = game.ruleset.get_technology(queued).unwrap().cost;
        let cheapest = rome.tech.researchable_techs(&game.ruleset).map(|it| it.cost).min().unwrap();
        assert!(rome.tech.researchable_techs(&game.ruleset).filter(|it| it.cost < cost).all(|it| it.cost == cheapest));
    }

    #[test]
    fn test_policy_adopted_with_enough_culture() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().policies.stored_culture = 30;
        adopt_policy(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.policies.number_of_adopted_policies(), 1);
    }

    #[test]
    fn test_automated_turn_keeps_every_city_building() {
        let mut game = game();
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-5, 0), 1);
        automate_civ_moves(&mut game, "Rome");
        let rome = game.get_civilization("Rome").unwrap();
        for city in &rome.cities {
            assert!(!city.city_constructions.current_construction_name().is_empty());
        }
        assert!(!rome.tech.techs_to_research.is_empty());
    }

    fn space_game() -> GameInfo {
        let mut ruleset = Ruleset::builtin().unwrap();
        for unit in ruleset.units.iter_mut().filter(|it| it.name == "Swordsman") {
            unit.required_resource = Some("Aluminum".to_string());
        }
        for building in ruleset.buildings.iter_mut().filter(|it| it.name == "Walls") {
            building.required_resource = Some("Aluminum".to_string());
        }
        let mut game = GameBuilder::new().ruleset(ruleset).major_civ("Rome").build();
        add_city(&mut game, "Rome", HexCoord::new(-5, 0));
        add_city(&mut game, "Rome", HexCoord::new(5, 0));
        add_units(&mut game, "Rome", "Swordsman", HexCoord::new(-5, 0), 2);
        game
    }

    fn add_building_everywhere(game: &mut GameInfo, civ_name: &str, building: &str) {
        for city in game.get_civilization_mut(civ_name).unwrap().cities.iter_mut() {
            city.city_constructions.add_building(building);
        }
    }

    #[test]
    fn test_space_resources_kept_when_plentiful() {
        let mut game = space_game();
        add_building_everywhere(&mut game, "Rome", "Apollo Program");
        add_building_everywhere(&mut game, "Rome", "Walls");
        game.get_civilization_mut("Rome")
            .unwrap()
            .owned_resources
            .insert("Aluminum".to_string(), 20);

        free_up_space_resources(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.units.len(), 2);
        assert!(rome.cities.iter().all(|it| it.city_constructions.is_built("Walls")));
    }

    #[test]
    fn test_space_resources_untouched_before_parts_are_needed() {
        let mut game = space_game();
        add_building_everywhere(&mut game, "Rome", "Walls");

        free_up_space_resources(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.units.len(), 2);
        assert!(rome.cities.iter().all(|it| it.city_constructions.is_built("Walls")));
    }

    #[test]
    fn test_short_space_resource_frees_one_unit_and_one_building() {
        let mut game = space_game();
        add_building_everywhere(&mut game, "Rome", "Apollo Program");
        add_building_everywhere(&mut game, "Rome", "Walls");
        let healthy_id = {
            let rome = game.get_civilization_mut("Rome").unwrap();
            rome.units[0].health = 40;
            rome.units[1].id
        };
        let walls_price = game.ruleset.get_building("Walls").unwrap().cost / 10;

        free_up_space_resources(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.units.len(), 1);
        assert_eq!(rome.units[0].id, healthy_id);
        let with_walls = rome.cities.iter().filter(|it| it.city_constructions.is_built("Walls")).count();
        assert_eq!(with_walls, 1);
        assert_eq!(rome.gold, walls_price);
    }

    fn settler_game(happiness: i32) -> GameInfo {
        let mut game = game();
        add_building_everywhere(&mut game, "Rome", "Monument");
        add_building_everywhere(&mut game, "Rome", "Granary");
        game.get_civilization_mut("Rome").unwrap().happiness = happiness;
        game
    }

    fn training_settler(game: &GameInfo, civ_name: &str) -> bool {
        game.get_civilization(civ_name)
            .unwrap()
            .cities
            .iter()
            .any(|it| it.city_constructions.current_construction_name() == "Settler")
    }

    #[test]
    fn test_settler_needs_happiness_above_city_count_plus_five() {
        let mut game = settler_game(6);
        train_settler(&mut game, "Rome");
        assert!(!training_settler(&game, "Rome"));

        game.get_civilization_mut("Rome").unwrap().happiness = 7;
        train_settler(&mut game, "Rome");
        assert!(training_settler(&game, "Rome"));
    }

    #[test]
    fn test_settler_trained_without_military_units() {
        let mut game = settler_game(20);
        assert_eq!(game.get_civilization("Rome").unwrap().military_unit_count(), 0);
        train_settler(&mut game, "Rome");
        assert!(training_settler(&game, "Rome"));
    }

    #[test]
    fn test_culture_civ_stops_settling_after_four_cities() {
        let mut game = settler_game(50);
        for position in [HexCoord::new(-5, 5), HexCoord::new(0, -5), HexCoord::new(-9, -2)] {
            add_city(&mut game, "Rome", position);
        }
        add_building_everywhere(&mut game, "Rome", "Monument");
        add_building_everywhere(&mut game, "Rome", "Granary");
        game.get_civilization_mut("Rome").unwrap().victory_focus = VictoryFocus::Culture;
        train_settler(&mut game, "Rome");
        assert!(!training_settler(&game, "Rome"));

        game.get_civilization_mut("Rome").unwrap().victory_focus = VictoryFocus::Neutral;
        train_settler(&mut game, "Rome");
        assert!(training_settler(&game, "Rome"));
    }
}
