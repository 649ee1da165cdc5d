use std::collections::BTreeMap;

use civilization::managers::{Religion, ReligionManager, ReligionState};
use civilization::{Civilization, GameInfo, NotificationCategory};
use rand::seq::IndexedRandom;
use rules::{Belief, BeliefType, HasUniques, Stat, VictoryFocus};
use tracing::debug;

/// Buys a great prophet whenever one can found or enhance our religion.
pub fn spend_faith_on_religion(game: &mut GameInfo, civ_name: &str) {
    let religions_left = game.available_religion_names().len();
    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    if civ.cities.is_empty() {
        return;
    }
    if civ.religion_manager.can_buy_great_prophet(religions_left) {
        civ.religion_manager.buy_great_prophet();
    }
}

fn focus_stat(focus: VictoryFocus) -> Option<Stat> {
    match focus {
        VictoryFocus::Culture => Some(Stat::Culture),
        VictoryFocus::Science => Some(Stat::Science),
        VictoryFocus::Military => Some(Stat::Production),
        VictoryFocus::Diplomacy => Some(Stat::Gold),
        VictoryFocus::Neutral => None,
    }
}

/// How much `civ` would gain from `belief`, scaled by its number of cities.
pub fn rate_belief(civ: &Civilization, belief: &Belief) -> f32 {
    let mut score = belief.stats.sum();
    if let Some(stat) = focus_stat(civ.victory_focus) {
        score += belief.stats.get(stat);
    }
    score += belief.uniques().len() as f32;
    score * civ.cities.len().max(1) as f32
}

/// Best untaken belief of `belief_type`; the first best one wins ties.
fn choose_belief_of_type<'a>(
    game: &'a GameInfo,
    civ: &Civilization,
    belief_type: BeliefType,
    excluded: &[&str],
) -> Option<&'a Belief> {
    let mut best: Option<(&Belief, f32)> = None;
    for belief in game
        .ruleset
        .beliefs
        .iter()
        .filter(|it| it.belief_type != BeliefType::Any && it.is_of_type(belief_type))
        .filter(|it| !excluded.contains(&it.name.as_str()) && !game.is_belief_taken(&it.name))
    {
        let rating = rate_belief(civ, belief);
        if best.map_or(true, |(_, it)| rating > it) {
            best = Some((belief, rating));
        }
    }
    best.map(|(it, _)| it)
}

fn choose_beliefs(game: &GameInfo, civ: &Civilization, to_choose: &BTreeMap<BeliefType, usize>) -> Vec<String> {
    let mut chosen: Vec<String> = Vec::new();
    for (belief_type, count) in to_choose {
        for _ in 0..*count {
            let excluded: Vec<&str> = chosen.iter().map(String::as_str).collect();
            let Some(belief) = choose_belief_of_type(game, civ, *belief_type, &excluded) else {
                continue;
            };
            chosen.push(belief.name.clone());
        }
    }
    chosen
}

/// Picks beliefs for whatever our religion state asks for:
/// a pantheon, a newly founded religion, an enhancement, then free beliefs.
pub fn choose_religious_beliefs(game: &mut GameInfo, civ_name: &str) {
    choose_pantheon(game, civ_name);
    found_religion(game, civ_name);
    enhance_religion(game, civ_name);
    choose_free_beliefs(game, civ_name);
}

fn choose_pantheon(game: &mut GameInfo, civ_name: &str) {
    let pantheons_founded = game.pantheons_founded();
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if !civ.religion_manager.can_found_pantheon(pantheons_founded) {
        return;
    }
    let Some(belief) = choose_belief_of_type(game, civ, BeliefType::Pantheon, &[]) else {
        return;
    };
    let mut pantheon = Religion::new(civ_name, civ_name);
    pantheon.beliefs.push(belief.name.clone());
    game.religions.insert(civ_name.to_string(), pantheon);

    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    civ.religion_manager.stored_faith -= ReligionManager::faith_for_pantheon(pantheons_founded);
    civ.religion_manager.religion_state = ReligionState::Pantheon;
    civ.religion_manager.religion = Some(civ_name.to_string());
    civ.add_notification("We have founded a pantheon", NotificationCategory::Religion);
    debug!(civ = %civ_name, "Pantheon founded");
}

fn found_religion(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if civ.religion_manager.religion_state != ReligionState::FoundingReligion {
        return;
    }
    let available = game.available_religion_names();
    let religion_name = match civ.favored_religion.as_deref() {
        Some(favored) if available.contains(&favored) => favored.to_string(),
        _ => {
            let mut rng = game.rng_for(civ_name, "religion name");
            let Some(name) = available.choose(&mut rng) else {
                return;
            };
            name.to_string()
        }
    };
    let beliefs = choose_beliefs(game, civ, &civ.religion_manager.beliefs_to_choose());

    let mut religion = game
        .religions
        .remove(civ_name)
        .map(|pantheon| Religion {
            name: religion_name.clone(),
            founding_civ: civ_name.to_string(),
            beliefs: pantheon.beliefs,
        })
        .unwrap_or_else(|| Religion::new(&religion_name, civ_name));
    religion.beliefs.extend(beliefs);
    game.religions.insert(religion_name.clone(), religion);

    let Some(civ) = game.get_civilization_mut(civ_name) else {
        return;
    };
    civ.religion_manager.religion_state = ReligionState::Religion;
    civ.religion_manager.religion = Some(religion_name.clone());
    civ.add_notification(
        &format!("We have founded [{}]", religion_name),
        NotificationCategory::Religion,
    );
    debug!(civ = %civ_name, religion = %religion_name, "Religion founded");
}

fn enhance_religion(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if civ.religion_manager.religion_state != ReligionState::EnhancingReligion {
        return;
    }
    let beliefs = choose_beliefs(game, civ, &civ.religion_manager.beliefs_to_choose());
    let religion_name = civ.religion_manager.religion.clone();
    if let Some(religion) = religion_name.as_ref().and_then(|it| game.religions.get_mut(it)) {
        religion.beliefs.extend(beliefs);
    }
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.religion_manager.religion_state = ReligionState::EnhancedReligion;
    }
}

fn choose_free_beliefs(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let free_beliefs = civ.religion_manager.free_beliefs;
    let Some(religion_name) = civ.religion_manager.religion.clone() else {
        return;
    };
    if free_beliefs == 0 {
        return;
    }
    let beliefs = choose_beliefs(game, civ, &BTreeMap::from([(BeliefType::Any, free_beliefs)]));
    if let Some(religion) = game.religions.get_mut(&religion_name) {
        religion.beliefs.extend(beliefs);
    }
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.religion_manager.free_beliefs = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, GameBuilder};
    use util::HexCoord;

    fn game() -> GameInfo {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        add_city(&mut game, "Rome", HexCoord::default());
        game
    }

    #[test]
    fn test_pantheon_founded_with_enough_faith() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().religion_manager.stored_faith = 10;
        choose_religious_beliefs(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.religion_manager.religion_state, ReligionState::Pantheon);
        assert_eq!(rome.religion_manager.stored_faith, 0);
        let pantheon = game.religions.get("Rome").unwrap();
        assert!(pantheon.is_pantheon());
        assert_eq!(pantheon.beliefs.len(), 1);
    }

    #[test]
    fn test_prophet_founds_religion_keeping_pantheon() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().religion_manager.stored_faith = 10;
        choose_religious_beliefs(&mut game, "Rome");
        game.get_civilization_mut("Rome").unwrap().religion_manager.stored_faith = 200;

        spend_faith_on_religion(&mut game, "Rome");
        choose_religious_beliefs(&mut game, "Rome");

        let rome = game.get_civilization("Rome").unwrap();
        assert_eq!(rome.religion_manager.religion_state, ReligionState::Religion);
        let religion_name = rome.religion_manager.religion.clone().unwrap();
        let religion = game.religions.get(&religion_name).unwrap();
        assert!(!religion.is_pantheon());
        // Pantheon, founder and follower
        assert_eq!(religion.beliefs.len(), 3);
        assert!(!game.religions.contains_key("Rome"));
    }

    #[test]
    fn test_favored_religion_is_preferred() {
        let mut game = game();
        {
            let rome = game.get_civilization_mut("Rome").unwrap();
            rome.favored_religion = Some("Taoism".to_string());
            rome.religion_manager.religion_state = ReligionState::FoundingReligion;
        }
        choose_religious_beliefs(&mut game, "Rome");
        assert!(game.religions.contains_key("Taoism"));
    }

    #[test]
    fn test_taken_beliefs_are_skipped() {
        let mut game = game();
        let rome = game.get_civilization("Rome").unwrap();
        let best = choose_belief_of_type(&game, rome, BeliefType::Pantheon, &[]).unwrap().name.clone();
        let mut other = Religion::new("Greece", "Greece");
        other.beliefs.push(best.clone());
        game.religions.insert("Greece".to_string(), other);
        let rome = game.get_civilization("Rome").unwrap();
        let next = choose_belief_of_type(&game, rome, BeliefType::Pantheon, &[]).unwrap();
        assert_ne!(next.name, best);
    }
}
