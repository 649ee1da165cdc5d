use diplomacy::{DiplomacyFlags, DiplomaticModifiers, DiplomaticStatus, RelationshipLevel};
use rand::seq::IndexedRandom;
use rules::{HasUniques, Stat, Stats, UniqueType};
use tracing::debug;

use crate::civilization::{CityStateType, CivFlags, Civilization};
use crate::diplomacy_functions::{declare_war, make_civilizations_meet};
use crate::game_info::GameInfo;
use crate::notification::NotificationCategory;
use crate::player_type::PlayerType;
use crate::popup_alert::{AlertType, PopupAlert};

const ALLY_INFLUENCE: f32 = 60.0;
const DIPLOMATIC_MARRIAGE_COST: i32 = 500;
const TRIBUTE_GLOBAL_MODIFIER: i32 = 100;
const TRIBUTE_LOCAL_MODIFIER: i32 = 1000;
const TRIBUTE_SCALING_INTERVAL: i32 = 6;
const BULLY_RANGE: i32 = 5;
const RECENTLY_BULLIED_DURATION: i32 = 20;
const MARRIAGE_COOLDOWN: i32 = 5;

/// Yields a city-state hands to a major civ at the given relationship.
pub fn city_state_bonus_stats(city_state_type: CityStateType, relationship: RelationshipLevel) -> Stats {
    let mut stats = Stats::default();
    let amount = match relationship {
        RelationshipLevel::Ally => 2.0,
        RelationshipLevel::Friend => 1.0,
        _ => return stats,
    };
    match city_state_type {
        CityStateType::Cultured => stats.culture = 3.0 * amount,
        CityStateType::Maritime => stats.food = 2.0 * amount,
        CityStateType::Mercantile => stats.happiness = 2.0 * amount,
        CityStateType::Religious => stats.faith = 2.0 * amount,
        CityStateType::Militaristic => {}
    }
    stats
}

pub fn can_provide_stat(city_state: &Civilization, stat: Stat) -> bool {
    city_state
        .city_state_type()
        .is_some_and(|it| city_state_bonus_stats(it, RelationshipLevel::Ally).get(stat) > 0.0)
}

/// Bonus yields `civ` receives from every city-state that likes it.
pub fn city_state_bonuses_for(game: &GameInfo, civ: &Civilization) -> Stats {
    let mut stats = Stats::default();
    for city_state in game.get_alive_city_states() {
        if let Some(city_state_type) = city_state.city_state_type() {
            stats += city_state_bonus_stats(city_state_type, city_state.get_relationship_level(&civ.civ_name));
        }
    }
    stats
}

pub fn influence_gained_by_gift(game: &GameInfo, gift_amount: i32) -> i32 {
    let mut influence_gained = (gift_amount as f32).powf(1.01) / 9.8;
    let game_progress_approximate = f32::min(game.turns as f32 / 400.0, 1.0);
    influence_gained *= 1.0 - (2.0 / 3.0) * game_progress_approximate;
    influence_gained -= influence_gained % 5.0;
    if influence_gained < 5.0 {
        influence_gained = 5.0;
    }
    influence_gained as i32
}

pub fn receive_gold_gift(game: &mut GameInfo, city_state_name: &str, donor_name: &str, gift_amount: i32) {
    let influence = influence_gained_by_gift(game, gift_amount);
    let Some((city_state, donor)) = game.civ_pair_mut(city_state_name, donor_name) else {
        return;
    };
    if !city_state.is_city_state() {
        return;
    }
    donor.add_gold(-gift_amount);
    city_state.add_gold(gift_amount);
    if let Some(manager) = city_state.get_diplomacy_manager_mut(donor_name) {
        manager.add_influence(influence as f32);
    }
    debug!(city_state = %city_state_name, donor = %donor_name, gift_amount, influence, "Gold gift received");
    update_ally_civ_for_city_state(game, city_state_name);
}

pub fn other_civ_can_pledge_protection(city_state: &Civilization, other_civ: &Civilization) -> bool {
    if !city_state.is_city_state() || !other_civ.is_major_civ() || other_civ.is_defeated() {
        return false;
    }
    let Some(manager) = city_state.get_diplomacy_manager(&other_civ.civ_name) else {
        return false;
    };
    !manager.has_flag(DiplomacyFlags::RecentlyWithdrewProtection)
        && manager.influence >= 0.0
        && !manager.is_at_war()
        && manager.diplomatic_status != DiplomaticStatus::Protector
}

pub fn other_civ_can_withdraw_protection(city_state: &Civilization, other_civ: &Civilization) -> bool {
    if !city_state.is_city_state() || !other_civ.is_major_civ() || other_civ.is_defeated() {
        return false;
    }
    city_state
        .get_diplomacy_manager(&other_civ.civ_name)
        .is_some_and(|it| {
            !it.has_flag(DiplomacyFlags::RecentlyPledgedProtection)
                && it.diplomatic_status == DiplomaticStatus::Protector
        })
}

pub fn add_protector_civ(game: &mut GameInfo, city_state_name: &str, protector_name: &str) {
    let (Some(city_state), Some(protector)) = (
        game.get_civilization(city_state_name),
        game.get_civilization(protector_name),
    ) else {
        return;
    };
    if !other_civ_can_pledge_protection(city_state, protector) {
        return;
    }
    if let Some(manager) = game
        .get_civilization_mut(city_state_name)
        .and_then(|it| it.get_diplomacy_manager_mut(protector_name))
    {
        manager.diplomatic_status = DiplomaticStatus::Protector;
        manager.set_flag(DiplomacyFlags::RecentlyPledgedProtection, 10);
    }
}

pub fn remove_protector_civ(game: &mut GameInfo, city_state_name: &str, protector_name: &str, forced: bool) {
    let (Some(city_state), Some(protector)) = (
        game.get_civilization(city_state_name),
        game.get_civilization(protector_name),
    ) else {
        return;
    };
    if !forced && !other_civ_can_withdraw_protection(city_state, protector) {
        return;
    }
    if let Some(manager) = game
        .get_civilization_mut(city_state_name)
        .and_then(|it| it.get_diplomacy_manager_mut(protector_name))
    {
        manager.diplomatic_status = DiplomaticStatus::Peace;
        manager.set_flag(DiplomacyFlags::RecentlyWithdrewProtection, 20);
        manager.add_influence(-20.0);
    }
}

/// Re-evaluates which major civ the city-state is allied with.
pub fn update_ally_civ_for_city_state(game: &mut GameInfo, city_state_name: &str) {
    let Some(city_state) = game.get_civilization(city_state_name) else {
        return;
    };
    if !city_state.is_city_state() {
        return;
    }
    let mut new_ally_name: Option<String> = None;
    let mut max_influence = ALLY_INFLUENCE;
    for (name, manager) in &city_state.diplomacy {
        let is_candidate = game
            .get_civilization(name)
            .is_some_and(|it| it.is_major_civ() && it.is_alive());
        // Ties keep the earlier civ
        let beats_current = match new_ally_name {
            None => manager.influence >= max_influence,
            Some(_) => manager.influence > max_influence,
        };
        if is_candidate && beats_current {
            max_influence = manager.influence;
            new_ally_name = Some(name.clone());
        }
    }
    let old_ally_name = city_state.ally_civ.clone();
    if old_ally_name == new_ally_name {
        return;
    }

    if let Some(city_state) = game.get_civilization_mut(city_state_name) {
        city_state.ally_civ = new_ally_name.clone();
    }

    if let Some(new_ally_name) = &new_ally_name {
        let ruleset = game.ruleset.clone();
        if let Some(new_ally) = game.get_civilization_mut(new_ally_name) {
            new_ally.add_notification(
                &format!("We have allied with [{}].", city_state_name),
                NotificationCategory::Diplomacy,
            );
            let cooldown = new_ally
                .get_matching_uniques(&ruleset, UniqueType::CityStateCanBeBoughtForGold)
                .first()
                .map(|it| it.param(0).and_then(|turns| turns.parse::<i32>().ok()).unwrap_or(MARRIAGE_COOLDOWN));
            if let Some(cooldown) = cooldown {
                if let Some(manager) = new_ally.get_diplomacy_manager_mut(city_state_name) {
                    manager.set_flag(DiplomacyFlags::MarriageCooldown, cooldown);
                }
            }
        }

        // Join the wars of the new ally
        let new_enemies: Vec<String> = game
            .civilizations
            .iter()
            .filter(|it| it.is_alive() && it.civ_name != city_state_name && it.is_at_war_with(new_ally_name))
            .map(|it| it.civ_name.clone())
            .collect();
        for enemy in new_enemies {
            let already_at_war = game
                .get_civilization(city_state_name)
                .is_some_and(|it| it.is_at_war_with(&enemy));
            if !already_at_war {
                make_civilizations_meet(game, city_state_name, &enemy);
                declare_war(game, city_state_name, &enemy);
            }
        }
    }

    if let Some(old_ally_name) = &old_ally_name {
        if let Some(old_ally) = game.get_civilization_mut(old_ally_name) {
            old_ally.add_notification(
                &format!("We have lost alliance with [{}].", city_state_name),
                NotificationCategory::Diplomacy,
            );
        }
    }
    debug!(city_state = %city_state_name, ally = ?new_ally_name, "City-state ally changed");
}

pub fn get_diplomatic_marriage_cost(_city_state: &Civilization) -> i32 {
    DIPLOMATIC_MARRIAGE_COST / 5 * 5
}

pub fn can_be_married_by(game: &GameInfo, city_state: &Civilization, other_civ: &Civilization) -> bool {
    city_state.is_alive()
        && city_state.is_city_state()
        && !city_state.cities.is_empty()
        && city_state.ally_civ.as_deref() == Some(other_civ.civ_name.as_str())
        && !other_civ
            .get_diplomacy_manager(&city_state.civ_name)
            .is_some_and(|it| it.has_flag(DiplomacyFlags::MarriageCooldown))
        && other_civ.has_unique(&game.ruleset, UniqueType::CityStateCanBeBoughtForGold)
        && other_civ.gold >= get_diplomatic_marriage_cost(city_state)
}

/// The city-state's cities become puppets of `other_civ_name` and its units change hands.
pub fn diplomatic_marriage(game: &mut GameInfo, city_state_name: &str, other_civ_name: &str) {
    let (Some(city_state), Some(other_civ)) = (
        game.get_civilization(city_state_name),
        game.get_civilization(other_civ_name),
    ) else {
        return;
    };
    if !can_be_married_by(game, city_state, other_civ) {
        return;
    }
    let cost = get_diplomatic_marriage_cost(city_state);
    let witnesses: Vec<String> = game
        .civilizations
        .iter()
        .filter(|it| it.civ_name != other_civ_name && it.civ_name != city_state_name)
        .map(|it| it.civ_name.clone())
        .collect();

    let Some((city_state, other_civ)) = game.civ_pair_mut(city_state_name, other_civ_name) else {
        return;
    };
    other_civ.add_gold(-cost);
    other_civ.add_notification(
        &format!(
            "We have married into the ruling family of [{}], bringing them under our control.",
            city_state_name
        ),
        NotificationCategory::Diplomacy,
    );
    for mut unit in std::mem::take(&mut city_state.units) {
        unit.civ_name = other_civ_name.to_string();
        other_civ.units.push(unit);
    }
    let mut city_ids = Vec::new();
    for mut city in std::mem::take(&mut city_state.cities) {
        city.civ_name = other_civ_name.to_string();
        city.founding_civ = String::new();
        city.is_capital = false;
        city.is_puppet = true;
        city_ids.push(city.id.clone());
        other_civ.cities.push(city);
    }
    city_state.ally_civ = None;

    let tile_map = game.tile_map_mut();
    for tile in tile_map.tiles_mut() {
        if tile.owning_city.as_ref().is_some_and(|it| city_ids.contains(it)) {
            tile.owner = Some(other_civ_name.to_string());
        }
    }
    for witness in witnesses {
        if let Some(civ) = game.get_civilization_mut(&witness) {
            civ.add_notification(
                &format!(
                    "[{}] has married into the ruling family of [{}], bringing them under their control.",
                    other_civ_name, city_state_name
                ),
                NotificationCategory::Diplomacy,
            );
        }
    }
    debug!(city_state = %city_state_name, civ = %other_civ_name, "Diplomatic marriage");
}

/// Named terms of how willing a city-state is to pay tribute; their sum decides.
pub fn get_tribute_modifiers(
    game: &GameInfo,
    city_state: &Civilization,
    demanding_civ: &Civilization,
    demanding_worker: bool,
) -> Vec<(&'static str, i32)> {
    let mut modifiers = Vec::new();
    if !city_state.is_city_state() {
        modifiers.push(("Major Civ", -999));
        return modifiers;
    }
    let Some(capital) = city_state.get_capital() else {
        modifiers.push(("No Cities", -999));
        return modifiers;
    };

    modifiers.push(("Base value", -110));
    if city_state
        .ally_civ
        .as_ref()
        .is_some_and(|it| *it != demanding_civ.civ_name)
    {
        modifiers.push(("Has Ally", -10));
    }
    if city_state
        .get_protector_civ_names()
        .iter()
        .any(|it| *it != demanding_civ.civ_name)
    {
        modifiers.push(("Has Protector", -20));
    }
    if demanding_worker {
        modifiers.push(("Demanding a Worker", -30));
        if capital.population < 4 {
            modifiers.push(("Demanding a Worker from small City-State", -300));
        }
    }
    if let Some(recent_bullying) = city_state.civ_flags.get(&CivFlags::RecentlyBullied) {
        if *recent_bullying > 10 {
            modifiers.push(("Very recently paid tribute", -300));
        } else if *recent_bullying > 0 {
            modifiers.push(("Recently paid tribute", -40));
        }
    }
    if city_state
        .get_diplomacy_manager(&demanding_civ.civ_name)
        .is_some_and(|it| it.influence < -30.0)
    {
        modifiers.push(("Influence below -30", -300));
    }

    let mut majors: Vec<&Civilization> = game.get_alive_major_civs().collect();
    majors.sort_by_key(|it| -it.get_force());
    let force_rank = majors
        .iter()
        .position(|it| it.civ_name == demanding_civ.civ_name)
        .unwrap_or(majors.len()) as i32;
    let players = majors.len().max(1) as i32;
    modifiers.push((
        "Military Rank",
        TRIBUTE_GLOBAL_MODIFIER - (TRIBUTE_GLOBAL_MODIFIER / players) * force_rank,
    ));

    let near = |unit_position: &util::HexCoord| {
        let distance = unit_position.aerial_distance_to(&capital.location);
        (1..=BULLY_RANGE).contains(&distance)
    };
    let force_near_city: i32 = demanding_civ
        .get_military_units()
        .filter(|it| near(&it.position))
        .map(|it| it.get_force_evaluation())
        .sum();
    let techs_percent = city_state.tech.researched_techs_percent(&game.ruleset);
    let city_state_force = (capital.get_city_strength(&game.ruleset, techs_percent)).powf(1.5) as i32
        + city_state
            .get_military_units()
            .filter(|it| near(&it.position))
            .map(|it| it.get_force_evaluation())
            .sum::<i32>();
    let force_ratio = force_near_city as f32 / city_state_force.max(1) as f32;
    let local = match force_ratio {
        r if r > 3.0 => TRIBUTE_LOCAL_MODIFIER,
        r if r > 2.0 => TRIBUTE_LOCAL_MODIFIER * 4 / 5,
        r if r > 1.5 => TRIBUTE_LOCAL_MODIFIER * 3 / 5,
        r if r > 1.0 => TRIBUTE_LOCAL_MODIFIER * 2 / 5,
        r if r > 0.5 => TRIBUTE_LOCAL_MODIFIER / 5,
        _ => 0,
    };
    modifiers.push(("Military near City-State", local));
    modifiers
}

pub fn get_tribute_willingness(
    game: &GameInfo,
    city_state: &Civilization,
    demanding_civ: &Civilization,
    demanding_worker: bool,
) -> i32 {
    get_tribute_modifiers(game, city_state, demanding_civ, demanding_worker)
        .iter()
        .map(|(_, value)| value)
        .sum()
}

pub fn gold_gained_by_tribute(game: &GameInfo) -> i32 {
    50 + 5 * (game.turns / TRIBUTE_SCALING_INTERVAL)
}

pub fn tribute_gold(game: &mut GameInfo, city_state_name: &str, demanding_civ_name: &str) {
    let gold = gold_gained_by_tribute(game);
    let Some((city_state, demanding_civ)) = game.civ_pair_mut(city_state_name, demanding_civ_name) else {
        return;
    };
    if !city_state.is_city_state() {
        return;
    }
    demanding_civ.add_gold(gold);
    if let Some(manager) = city_state.get_diplomacy_manager_mut(demanding_civ_name) {
        manager.add_influence(-15.0);
    }
    city_state_bullied(game, city_state_name, demanding_civ_name);
}

pub fn tribute_worker(game: &mut GameInfo, city_state_name: &str, demanding_civ_name: &str) {
    let Some(city_state) = game.get_civilization(city_state_name) else {
        return;
    };
    let Some(location) = city_state.get_capital().map(|it| it.location) else {
        return;
    };
    let workers: Vec<String> = game
        .ruleset
        .units
        .iter()
        .filter(|it| it.has_unique(UniqueType::BuildImprovements) && it.is_civilian())
        .map(|it| it.name.clone())
        .collect();
    let mut rng = game.rng_for(city_state_name, "tribute worker");
    let Some(worker) = workers.choose(&mut rng).cloned() else {
        return;
    };
    game.place_unit(demanding_civ_name, &worker, location);
    if let Some(manager) = game
        .get_civilization_mut(city_state_name)
        .and_then(|it| it.get_diplomacy_manager_mut(demanding_civ_name))
    {
        manager.add_influence(-50.0);
    }
    city_state_bullied(game, city_state_name, demanding_civ_name);
}

/// Protectors resent the bully; the city-state remembers.
fn city_state_bullied(game: &mut GameInfo, city_state_name: &str, bully_name: &str) {
    let Some(city_state) = game.get_civilization_mut(city_state_name) else {
        return;
    };
    city_state.set_flag(CivFlags::RecentlyBullied, RECENTLY_BULLIED_DURATION);
    if let Some(manager) = city_state.get_diplomacy_manager_mut(bully_name) {
        manager.set_flag(DiplomacyFlags::Bullied, 20);
    }
    let protectors = city_state.get_protector_civ_names();

    for protector_name in protectors.iter().filter(|it| *it != bully_name) {
        let Some(protector) = game.get_civilization_mut(protector_name) else {
            continue;
        };
        let Some(manager) = protector.get_diplomacy_manager_mut(bully_name) else {
            continue;
        };
        manager.add_modifier(DiplomaticModifiers::BulliedProtectedMinor, -15.0);
        if protector.player_type == PlayerType::Human {
            protector.popup_alerts.push(PopupAlert::new(
                AlertType::BulliedProtectedMinor,
                &format!("{}@{}", bully_name, city_state_name),
            ));
        } else if let Some(bully) = game.get_civilization_mut(bully_name) {
            bully.add_notification(
                &format!(
                    "[{}] is upset that you demanded tribute from [{}], whom they have pledged to protect!",
                    protector_name, city_state_name
                ),
                NotificationCategory::Diplomacy,
            );
        }
    }
}

/// Major civs with units inside our borders lose influence.
pub fn update_diplomatic_relationship_for_city_state(game: &mut GameInfo, city_state_name: &str) {
    let Some(city_state) = game.get_civilization(city_state_name) else {
        return;
    };
    let mut intruders = Vec::new();
    for other_name in city_state.get_known_civ_names() {
        let Some(other_civ) = game.get_civilization(other_name) else {
            continue;
        };
        if !other_civ.is_major_civ() || city_state.is_at_war_with(other_name) {
            continue;
        }
        let units_in_border = other_civ
            .get_military_units()
            .filter(|unit| {
                game.tile_map
                    .get(&unit.position)
                    .is_some_and(|tile| tile.is_owned_by(city_state_name))
            })
            .count();
        if units_in_border > 0 && city_state.get_relationship_level(other_name) < RelationshipLevel::Friend {
            intruders.push(other_name.to_string());
        }
    }

    for intruder in intruders {
        let Some((city_state, other_civ)) = game.civ_pair_mut(city_state_name, &intruder) else {
            continue;
        };
        let Some(manager) = city_state.get_diplomacy_manager_mut(&intruder) else {
            continue;
        };
        manager.add_influence(-10.0);
        if !manager.has_flag(DiplomacyFlags::BorderConflict) {
            manager.set_flag(DiplomacyFlags::BorderConflict, 10);
            other_civ
                .popup_alerts
                .push(PopupAlert::new(AlertType::BorderConflict, city_state_name));
        }
    }
}

/// City-states learn every technology at least half of the major civs know.
pub fn get_free_tech_for_city_state(game: &mut GameInfo, city_state_name: &str) {
    let majors: Vec<&Civilization> = game.get_alive_major_civs().collect();
    let Some(city_state) = game.get_civilization(city_state_name) else {
        return;
    };
    let free_techs: Vec<String> = city_state
        .tech
        .researchable_techs(&game.ruleset)
        .filter(|tech| majors.iter().filter(|it| it.tech.is_researched(&tech.name)).count() * 2 >= majors.len().max(1))
        .map(|tech| tech.name.clone())
        .collect();
    if let Some(city_state) = game.get_civilization_mut(city_state_name) {
        for tech in free_techs {
            city_state.tech.add_technology(&tech);
        }
    }
}
