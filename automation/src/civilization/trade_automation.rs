use civilization::diplomacy_functions::{can_sign_research_agreement, can_sign_research_agreements_with, research_agreement_cost};
use civilization::trade::trade_evaluation::{
    evaluate_buy_cost, evaluate_peace_cost_for_them, evaluate_sell_cost, get_trade_acceptability, is_trade_acceptable,
    is_trade_valid,
};
use civilization::trade::TradeLogic;
use civilization::{Civilization, GameInfo, NotificationCategory, PlayerType};
use diplomacy::{DiplomacyFlags, RelationshipLevel};
use rand::Rng;
use trade::{Trade, TradeOffer, TradeOfferType, TradeRequest, GOLD, PEACE_DURATION, PEACE_TREATY, RESEARCH_AGREEMENT};
use tracing::{debug, warn};

use crate::civilization::motivation_to_attack_automation::motivation_to_attack;

/// Leftover favor above which we hand some of it back as gold.
const SWEETENER_THRESHOLD: i32 = 100;

/// Below this motivation we would rather pay for peace.
const PEACE_MOTIVATION: i32 = 10;

/// Answers every pending request in `civ_name`'s queue, then empties it.
pub fn respond_to_trade_requests(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let trade_requests = civ.trade_requests.clone();

    for trade_request in trade_requests {
        let requester_name = trade_request.requesting_civ.as_str();
        let (Some(civ), Some(other_civ)) = (game.get_civilization(civ_name), game.get_civilization(requester_name))
        else {
            continue;
        };
        if !is_trade_valid(game, &trade_request.trade, civ, other_civ) {
            continue;
        }

        let mut trade_logic = TradeLogic::new(game, civ, other_civ);
        trade_logic.current_trade.set(&trade_request.trade);
        let acceptable = is_trade_acceptable(game, &trade_logic.current_trade, civ, other_civ);
        let counteroffer = if acceptable {
            None
        } else {
            get_counteroffer(game, civ, &trade_request)
        };

        // Evicted before committing so the request does not count against our resources twice
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            civ.trade_requests.retain(|it| *it != trade_request);
        }

        if acceptable {
            if let Err(error) = trade_logic.accept_trade(game) {
                warn!(civ = %civ_name, requester = %requester_name, %error, "Could not accept trade");
                continue;
            }
            notify(game, requester_name, &format!("[{}] has accepted your trade request", civ_name));
        } else if let Some(counteroffer) = counteroffer {
            debug!(civ = %civ_name, requester = %requester_name, "Counteroffer made");
            notify(
                game,
                requester_name,
                &format!("[{}] has made a counteroffer to your trade request", civ_name),
            );
            if let Some(other_civ) = game.get_civilization_mut(requester_name) {
                other_civ.trade_requests.push(counteroffer);
            }
        } else {
            decline_trade_request(game, civ_name, &trade_request);
            notify(game, requester_name, &format!("[{}] has denied your trade request", civ_name));
        }
    }

    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.trade_requests.clear();
    }
}

fn notify(game: &mut GameInfo, civ_name: &str, text: &str) {
    if let Some(civ) = game.get_civilization_mut(civ_name) {
        civ.add_notification(text, NotificationCategory::Trade);
    }
}

/// Marks the requester's side so it does not ask again right away.
pub fn decline_trade_request(game: &mut GameInfo, declining_civ_name: &str, trade_request: &TradeRequest) {
    let Some(manager) = game
        .get_civilization_mut(&trade_request.requesting_civ)
        .and_then(|it| it.get_diplomacy_manager_mut(declining_civ_name))
    else {
        return;
    };
    let trade = &trade_request.trade;
    if trade.is_luxury_exchange() {
        manager.set_flag(DiplomacyFlags::DeclinedLuxExchange, 20);
    }
    if trade.is_research_agreement() {
        manager.set_flag(DiplomacyFlags::DeclinedResearchAgreement, 20);
    }
    if trade.is_peace_treaty() {
        manager.set_flag(DiplomacyFlags::DeclinedPeace, 5);
    }
}

/// First entry with the lowest value.
fn cheapest(offers: &[(TradeOffer, i32)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, (_, value)) in offers.iter().enumerate() {
        if best.map_or(true, |it| *value < offers[it].1) {
            best = Some(index);
        }
    }
    best
}

/// Returns a request with the same offers of ours as `trade_request` but with
/// enough of theirs added to make the deal acceptable.
///
/// Finds a valid counteroffer if any exists, not the best or closest one.
pub fn get_counteroffer(game: &GameInfo, civ: &Civilization, trade_request: &TradeRequest) -> Option<TradeRequest> {
    let other_civ = game.get_civilization(&trade_request.requesting_civ)?;
    // AIs would ping-pong counteroffers forever
    if other_civ.player_type == PlayerType::AI {
        return None;
    }
    let mut delta_in_our_favor = get_trade_acceptability(game, &trade_request.trade, civ, other_civ);
    if delta_in_our_favor > 0 {
        // They seem very interested, push it a bit
        delta_in_our_favor = (delta_in_our_favor as f32 / 1.1) as i32;
    }

    let mut trade_logic = TradeLogic::new(game, civ, other_civ);
    trade_logic.current_trade.set(&trade_request.trade);

    let mut potential_asks: Vec<(TradeOffer, i32)> = Vec::new();
    for offer in &trade_logic.their_available_offers {
        if offer.offer_type.is_gold()
            && trade_request
                .trade
                .our_offers
                .iter()
                .any(|it| it.offer_type == offer.offer_type)
        {
            continue;
        }
        if !offer.is_tradable() || offer.offer_type == TradeOfferType::City || offer.offer_type == TradeOfferType::Treaty {
            continue;
        }
        if trade_logic.current_trade.their_offers.iter().any(|it| it.is_same_kind(offer)) {
            continue;
        }
        let value = evaluate_buy_cost(game, offer, civ, other_civ);
        if value > 0 {
            potential_asks.push((offer.clone(), value));
        }
    }

    // Keep adding their least valuable offer until the deal works for us
    let mut counteroffer_asks: Vec<(TradeOffer, i32)> = Vec::new();
    while delta_in_our_favor < 0 {
        let Some(index) = cheapest(&potential_asks) else {
            break;
        };
        let ask = potential_asks.remove(index);
        delta_in_our_favor = delta_in_our_favor.saturating_add(ask.1);
        counteroffer_asks.push(ask);
    }
    if delta_in_our_favor < 0 {
        return None;
    }

    // Drop the most valuable ask we can afford to until the deal is barely acceptable
    while delta_in_our_favor > 0 {
        let mut to_remove: Option<usize> = None;
        for (index, (_, value)) in counteroffer_asks.iter().enumerate() {
            if *value <= delta_in_our_favor && to_remove.map_or(true, |it| *value > counteroffer_asks[it].1) {
                to_remove = Some(index);
            }
        }
        let Some(index) = to_remove else {
            break;
        };
        delta_in_our_favor -= counteroffer_asks.remove(index).1;
    }

    // Only ask for as many copies of a resource as the price needs
    for (ask, original_value) in counteroffer_asks.iter_mut() {
        if !ask.offer_type.is_resource() {
            continue;
        }
        while ask.amount > 1
            && *original_value == evaluate_buy_cost(game, &ask.clone_with_amount(ask.amount - 1), civ, other_civ)
        {
            ask.amount -= 1;
        }
    }

    // Gold per turn first, then lump sums
    let mut gold_ask_indices: Vec<usize> = (0..counteroffer_asks.len())
        .filter(|it| counteroffer_asks[*it].0.offer_type.is_gold())
        .collect();
    gold_ask_indices.sort_by(|a, b| counteroffer_asks[*b].0.offer_type.cmp(&counteroffer_asks[*a].0.offer_type));
    let mut to_remove = Vec::new();
    for index in gold_ask_indices {
        let (gold_ask, value) = &mut counteroffer_asks[index];
        let value_of_one = evaluate_buy_cost(game, &gold_ask.clone_with_amount(1), civ, other_civ);
        if value_of_one <= 0 {
            continue;
        }
        let amount_can_be_removed = delta_in_our_favor / value_of_one;
        if amount_can_be_removed >= gold_ask.amount {
            delta_in_our_favor -= *value;
            to_remove.push(index);
        } else {
            delta_in_our_favor -= value_of_one * amount_can_be_removed;
            gold_ask.amount -= amount_can_be_removed;
            *value -= value_of_one * amount_can_be_removed;
        }
    }
    to_remove.sort_unstable_by(|a, b| b.cmp(a));
    for index in to_remove {
        counteroffer_asks.remove(index);
    }

    // Still far in our favor: give some of it back, they are the ones asking
    let mut counteroffer_gifts = Vec::new();
    if delta_in_our_favor >= SWEETENER_THRESHOLD {
        delta_in_our_favor = delta_in_our_favor * 2 / 3;
        let mut our_gold: Vec<&TradeOffer> = trade_logic
            .our_available_offers
            .iter()
            .filter(|it| it.is_tradable() && it.offer_type.is_gold())
            .collect();
        our_gold.sort_by(|a, b| b.offer_type.cmp(&a.offer_type));
        for gold in our_gold {
            let already_offered = trade_logic
                .current_trade
                .their_offers
                .iter()
                .chain(counteroffer_asks.iter().map(|(it, _)| it))
                .any(|it| it.offer_type == gold.offer_type);
            if already_offered {
                continue;
            }
            let value_of_one = evaluate_sell_cost(game, &gold.clone_with_amount(1), civ, other_civ);
            if value_of_one <= 0 {
                continue;
            }
            let amount_to_give = (delta_in_our_favor / value_of_one).min(gold.amount);
            if amount_to_give > 0 {
                delta_in_our_favor -= amount_to_give * value_of_one;
                counteroffer_gifts.push(gold.clone_with_amount(amount_to_give));
            }
        }
    }

    let mut counteroffer = trade_logic.current_trade.clone();
    counteroffer
        .their_offers
        .extend(counteroffer_asks.into_iter().map(|(it, _)| it));
    let without_gifts = counteroffer.clone();
    counteroffer.our_offers.extend(counteroffer_gifts);
    if get_trade_acceptability(game, &counteroffer, civ, other_civ) < 0 {
        counteroffer = without_gifts;
        if get_trade_acceptability(game, &counteroffer, civ, other_civ) < 0 {
            return None;
        }
    }

    // Reversed: once they receive it our offers become theirs
    Some(TradeRequest::new(&civ.civ_name, counteroffer.reverse()))
}

/// 1-for-1 luxury swaps, luxuries demanded by more of our cities first.
pub fn potential_luxury_trades(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> Vec<Trade> {
    let trade_logic = TradeLogic::new(game, civ, other_civ);
    let is_luxury = |it: &&TradeOffer| it.offer_type == TradeOfferType::LuxuryResource;
    let lacks = |offers: &[TradeOffer], name: &str| !offers.iter().any(|it| it.name == name && is_luxury(&it));

    let we_have_they_dont: Vec<&TradeOffer> = trade_logic
        .our_available_offers
        .iter()
        .filter(is_luxury)
        .filter(|it| it.amount > 1 && lacks(&trade_logic.their_available_offers, &it.name))
        .collect();
    let demand = |name: &str| {
        civ.cities
            .iter()
            .filter(|city| city.demanded_resource.as_deref() == Some(name))
            .count()
    };
    let mut they_have_we_dont: Vec<&TradeOffer> = trade_logic
        .their_available_offers
        .iter()
        .filter(is_luxury)
        .filter(|it| it.amount > 1 && lacks(&trade_logic.our_available_offers, &it.name))
        .collect();
    // Luxuries our cities demand come first
    they_have_we_dont.sort_by(|a, b| demand(&b.name).cmp(&demand(&a.name)));

    we_have_they_dont
        .into_iter()
        .zip(they_have_we_dont)
        .map(|(ours, theirs)| {
            let mut trade = Trade::new();
            trade.our_offers.push(ours.clone_with_amount(1));
            trade.their_offers.push(theirs.clone_with_amount(1));
            trade
        })
        .collect()
}

/// Proposes luxury swaps to every friendly enough major civ.
///
/// Denied swaps are not retried while the decline flag lasts, and at most
/// one batch of requests is pending per partner.
pub fn exchange_luxuries(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    let mut requests: Vec<(String, TradeRequest)> = Vec::new();
    for other_civ in civ.get_known_civ_names().filter_map(|it| game.get_civilization(it)) {
        if !other_civ.is_major_civ() || other_civ.is_at_war_with(civ_name) {
            continue;
        }
        if civ
            .get_diplomacy_manager(&other_civ.civ_name)
            .is_some_and(|it| it.has_flag(DiplomacyFlags::DeclinedLuxExchange))
        {
            continue;
        }
        if civ.get_relationship_level(&other_civ.civ_name) <= RelationshipLevel::Enemy {
            continue;
        }
        if other_civ.trade_requests.iter().any(|it| it.requesting_civ == civ_name) {
            continue;
        }
        for trade in potential_luxury_trades(game, civ, other_civ) {
            requests.push((other_civ.civ_name.clone(), TradeRequest::new(civ_name, trade.reverse())));
        }
    }
    push_requests(game, requests);
}

fn push_requests(game: &mut GameInfo, requests: Vec<(String, TradeRequest)>) {
    for (receiver, request) in requests {
        debug!(from = %request.requesting_civ, to = %receiver, "Trade request sent");
        if let Some(other_civ) = game.get_civilization_mut(&receiver) {
            other_civ.trade_requests.push(request);
        }
    }
}

/// Offers research agreements to friends who can afford one, highest science first.
pub fn offer_research_agreement(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if !can_sign_research_agreement(game, civ) {
        return;
    }
    let mut candidates: Vec<&Civilization> = civ
        .get_known_civ_names()
        .filter_map(|it| game.get_civilization(it))
        .filter(|other_civ| {
            can_sign_research_agreements_with(game, civ, other_civ)
                && !civ
                    .get_diplomacy_manager(&other_civ.civ_name)
                    .is_some_and(|it| it.has_flag(DiplomacyFlags::DeclinedResearchAgreement))
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.stats_for_next_turn
            .science
            .total_cmp(&a.stats_for_next_turn.science)
    });

    let mut rng = game.rng_for(civ_name, "research agreement");
    let mut requests = Vec::new();
    for other_civ in candidates {
        if rng.random_range(1..=10) > 5 {
            continue;
        }
        let cost = research_agreement_cost(game, civ, other_civ);
        let mut trade = Trade::new();
        trade
            .our_offers
            .push(TradeOffer::new(RESEARCH_AGREEMENT, TradeOfferType::Treaty, cost));
        trade
            .their_offers
            .push(TradeOffer::new(RESEARCH_AGREEMENT, TradeOfferType::Treaty, cost));
        requests.push((other_civ.civ_name.clone(), TradeRequest::new(civ_name, trade.reverse())));
    }
    push_requests(game, requests);
}

/// Pays for peace with enemies we no longer want to fight.
pub fn offer_peace_treaty(game: &mut GameInfo, civ_name: &str) {
    let Some(civ) = game.get_civilization(civ_name) else {
        return;
    };
    if !civ.is_at_war() || civ.cities.is_empty() || civ.diplomacy.is_empty() {
        return;
    }

    let enemies: Vec<&Civilization> = civ
        .diplomacy
        .values()
        .filter(|it| it.is_at_war())
        .filter_map(|it| game.get_civilization(&it.other_civ_name))
        .filter(|enemy| enemy.civ_name != civ_name && !enemy.is_barbarian() && !enemy.cities.is_empty())
        .filter(|enemy| {
            !civ.get_diplomacy_manager(&enemy.civ_name)
                .is_some_and(|it| it.has_flag(DiplomacyFlags::DeclinedPeace))
        })
        // No peace for city-states whose ally we are fighting
        .filter(|enemy| {
            !(enemy.is_city_state()
                && enemy
                    .ally_civ
                    .as_deref()
                    .is_some_and(|ally| civ.is_at_war_with(ally)))
        })
        .filter(|enemy| {
            !enemy
                .trade_requests
                .iter()
                .any(|it| it.requesting_civ == civ_name && it.trade.is_peace_treaty())
        })
        .collect();

    let mut requests = Vec::new();
    for enemy in enemies {
        if motivation_to_attack(game, civ, enemy) >= PEACE_MOTIVATION {
            continue;
        }
        let mut trade = Trade::new();
        let peace_treaty = TradeOffer::with_duration(PEACE_TREATY, TradeOfferType::Treaty, 1, PEACE_DURATION);
        trade.our_offers.push(peace_treaty.clone());
        trade.their_offers.push(peace_treaty);

        let money_we_need_to_pay = -evaluate_peace_cost_for_them(civ, enemy);
        if civ.gold > 0 && money_we_need_to_pay > 0 {
            trade
                .our_offers
                .push(TradeOffer::new(GOLD, TradeOfferType::Gold, money_we_need_to_pay.min(civ.gold)));
        }
        requests.push((enemy.civ_name.clone(), TradeRequest::new(civ_name, trade.reverse())));
    }
    push_requests(game, requests);
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, GameBuilder};
    use util::HexCoord;

    fn give_resource(game: &mut GameInfo, civ_name: &str, resource: &str, amount: i32) {
        game.get_civilization_mut(civ_name)
            .unwrap()
            .owned_resources
            .insert(resource.to_string(), amount);
    }

    fn luxury_game() -> GameInfo {
        let mut game = GameBuilder::new()
            .major_civ("Rome")
            .major_civ("Greece")
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-4, 0));
        add_city(&mut game, "Greece", HexCoord::new(4, 0));
        give_resource(&mut game, "Rome", "Silk", 2);
        give_resource(&mut game, "Greece", "Wine", 3);
        give_resource(&mut game, "Greece", "Spices", 2);
        game
    }

    #[test]
    fn test_exchange_luxuries_proposes_one_swap() {
        let mut game = luxury_game();
        {
            let rome = game.get_civilization_mut("Rome").unwrap();
            rome.cities[0].demanded_resource = Some("Spices".to_string());
        }

        exchange_luxuries(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        assert_eq!(greece.trade_requests.len(), 1);
        let request = &greece.trade_requests[0];
        assert_eq!(request.requesting_civ, "Rome");
        // Written from Greece's side: Greece gives Spices, receives Silk
        assert_eq!(request.trade.our_offers, vec![TradeOffer::new("Spices", TradeOfferType::LuxuryResource, 1)]);
        assert_eq!(request.trade.their_offers, vec![TradeOffer::new("Silk", TradeOfferType::LuxuryResource, 1)]);
    }

    #[test]
    fn test_demanded_luxury_is_asked_for_first() {
        let mut game = luxury_game();
        game.get_civilization_mut("Rome").unwrap().cities[0].demanded_resource = Some("Wine".to_string());

        let trades = potential_luxury_trades(
            &game,
            game.get_civilization("Rome").unwrap(),
            game.get_civilization("Greece").unwrap(),
        );
        assert_eq!(trades[0].their_offers[0].name, "Wine");
    }

    #[test]
    fn test_declined_luxury_exchange_is_not_repeated() {
        let mut game = luxury_game();
        game.get_civilization_mut("Rome")
            .unwrap()
            .get_diplomacy_manager_mut("Greece")
            .unwrap()
            .set_flag(DiplomacyFlags::DeclinedLuxExchange, 20);

        exchange_luxuries(&mut game, "Rome");

        assert!(game.get_civilization("Greece").unwrap().trade_requests.is_empty());
    }

    #[test]
    fn test_ai_requests_are_never_countered() {
        let mut game = luxury_game();
        game.get_civilization_mut("Rome").unwrap().gold = 100;
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Wine", TradeOfferType::LuxuryResource, 1));
        trade.their_offers.push(TradeOffer::new(GOLD, TradeOfferType::Gold, 1));
        let request = TradeRequest::new("Rome", trade);
        game.get_civilization_mut("Greece").unwrap().trade_requests.push(request.clone());

        let greece = game.get_civilization("Greece").unwrap();
        assert!(get_counteroffer(&game, greece, &request).is_none());

        respond_to_trade_requests(&mut game, "Greece");
        let rome = game.get_civilization("Rome").unwrap();
        assert!(rome.trade_requests.is_empty());
        assert_eq!(
            rome.notifications.last().map(|it| it.text.as_str()),
            Some("[Greece] has denied your trade request")
        );
        assert!(game.get_civilization("Greece").unwrap().trade_requests.is_empty());
    }

    #[test]
    fn test_human_request_gets_acceptable_counteroffer() {
        let mut game = GameBuilder::new()
            .human_civ("Rome")
            .major_civ("Greece")
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-4, 0));
        add_city(&mut game, "Greece", HexCoord::new(4, 0));
        give_resource(&mut game, "Greece", "Wine", 3);
        game.get_civilization_mut("Rome").unwrap().gold = 1000;

        // Rome asks for Wine and offers nothing
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Wine", TradeOfferType::LuxuryResource, 1));
        let request = TradeRequest::new("Rome", trade);

        let greece = game.get_civilization("Greece").unwrap();
        let counteroffer = get_counteroffer(&game, greece, &request).expect("gold makes the deal work");
        assert_eq!(counteroffer.requesting_civ, "Greece");
        let rome = game.get_civilization("Rome").unwrap();
        // Rome's view of the counteroffer; from Greece's view it must be acceptable
        let greece_view = counteroffer.trade.reverse();
        assert!(get_trade_acceptability(&game, &greece_view, greece, rome) >= 0);
        assert!(greece_view.their_offers.iter().any(|it| it.offer_type == TradeOfferType::Gold));
    }

    #[test]
    fn test_declining_peace_sets_flag_on_requester() {
        let mut game = luxury_game();
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new(PEACE_TREATY, TradeOfferType::Treaty, 1));
        trade.their_offers.push(TradeOffer::new(PEACE_TREATY, TradeOfferType::Treaty, 1));
        decline_trade_request(&mut game, "Greece", &TradeRequest::new("Rome", trade));

        let manager = game
            .get_civilization("Rome")
            .unwrap()
            .get_diplomacy_manager("Greece")
            .unwrap();
        assert_eq!(manager.get_flag(DiplomacyFlags::DeclinedPeace), Some(5));
    }

    #[test]
    fn test_outmatched_civ_offers_ten_turn_peace() {
        let mut game = luxury_game();
        game.place_unit("Greece", "Warrior", HexCoord::new(4, 0));
        civilization::diplomacy_functions::declare_war(&mut game, "Rome", "Greece");
        offer_peace_treaty(&mut game, "Rome");

        let greece = game.get_civilization("Greece").unwrap();
        let request = greece
            .trade_requests
            .iter()
            .find(|it| it.requesting_civ == "Rome")
            .expect("Rome cannot win this war");
        assert!(request.trade.is_peace_treaty());
        let treaties: Vec<&TradeOffer> = request
            .trade
            .our_offers
            .iter()
            .chain(request.trade.their_offers.iter())
            .filter(|it| it.name == PEACE_TREATY)
            .collect();
        assert_eq!(treaties.len(), 2);
        assert!(treaties.iter().all(|it| it.duration == PEACE_DURATION));
    }
}
