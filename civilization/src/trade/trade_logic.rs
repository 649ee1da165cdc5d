use diplomacy::DiplomacyFlags;
use rules::{HasUniques, ResourceType, UniqueType};
use trade::{Trade, TradeOffer, TradeOfferType, GOLD, GOLD_PER_TURN, OPEN_BORDERS, PEACE_TREATY, RESEARCH_AGREEMENT};
use tracing::{debug, info};
use util::{Result, UncivError};

use crate::civilization::Civilization;
use crate::diplomacy_functions::{declare_war, make_civilizations_meet, make_peace};
use crate::game_info::GameInfo;
use crate::popup_alert::{AlertType, PopupAlert};
use crate::trade::trade_evaluation::is_trade_valid;

/// A deal being put together between two civilizations.
#[derive(Debug, Clone)]
pub struct TradeLogic {
    pub our_civ_name: String,
    pub other_civ_name: String,
    /// Everything we could offer, whether offered or not
    pub our_available_offers: Vec<TradeOffer>,
    pub their_available_offers: Vec<TradeOffer>,
    pub current_trade: Trade,
}

impl TradeLogic {
    pub fn new(game: &GameInfo, our_civ: &Civilization, other_civ: &Civilization) -> Self {
        TradeLogic {
            our_civ_name: our_civ.civ_name.clone(),
            other_civ_name: other_civ.civ_name.clone(),
            our_available_offers: get_available_offers(game, our_civ, other_civ),
            their_available_offers: get_available_offers(game, other_civ, our_civ),
            current_trade: Trade::new(),
        }
    }

    /// Commits the current trade for both sides.
    ///
    /// Nothing is applied when the trade is no longer valid.
    pub fn accept_trade(&self, game: &mut GameInfo) -> Result<()> {
        accept_trade(game, &self.our_civ_name, &self.other_civ_name, &self.current_trade)
    }
}

/// Everything `civ` could put on the table for `other_civ`.
pub fn get_available_offers(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> Vec<TradeOffer> {
    let ruleset = &game.ruleset;
    let mut offers = Vec::new();
    if civ.is_city_state() && other_civ.is_city_state() {
        return offers;
    }
    if civ.is_at_war_with(&other_civ.civ_name) {
        offers.push(TradeOffer::with_duration(PEACE_TREATY, TradeOfferType::Treaty, 1, trade::PEACE_DURATION));
    }

    let has_open_borders = other_civ
        .get_diplomacy_manager(&civ.civ_name)
        .is_some_and(|it| it.has_open_borders);
    if !has_open_borders
        && !other_civ.is_city_state()
        && civ.has_unique(ruleset, UniqueType::EnablesOpenBorders)
        && other_civ.has_unique(ruleset, UniqueType::EnablesOpenBorders)
    {
        offers.push(TradeOffer::new(OPEN_BORDERS, TradeOfferType::Agreement, 1));
    }

    for (resource_name, amount) in civ.get_tradable_resources(ruleset) {
        let Some(resource) = ruleset.get_tile_resource(&resource_name) else {
            continue;
        };
        let offer_type = if resource.resource_type == ResourceType::Luxury {
            TradeOfferType::LuxuryResource
        } else {
            TradeOfferType::StrategicResource
        };
        offers.push(TradeOffer::new(&resource_name, offer_type, amount));
    }

    offers.push(TradeOffer::new(GOLD, TradeOfferType::Gold, civ.gold));
    offers.push(TradeOffer::new(
        GOLD_PER_TURN,
        TradeOfferType::GoldPerTurn,
        civ.stats_for_next_turn.gold as i32,
    ));

    if !civ.is_city_state() && !other_civ.is_city_state() {
        for city in civ.cities.iter().filter(|it| !it.is_capital && !it.is_in_resistance()) {
            offers.push(TradeOffer::new(&city.id, TradeOfferType::City, 1));
        }
    }

    let other_civs_we_know: Vec<&Civilization> = civ
        .get_known_civ_names()
        .filter(|it| *it != other_civ.civ_name)
        .filter_map(|it| game.get_civilization(it))
        .filter(|it| it.is_major_civ() && !it.is_defeated())
        .collect();

    if ruleset.mod_options.has_unique(UniqueType::TradeCivIntroductions) {
        for third_civ in other_civs_we_know.iter().filter(|it| !other_civ.knows(&it.civ_name)) {
            offers.push(TradeOffer::new(&third_civ.civ_name, TradeOfferType::Introduction, 1));
        }
    }

    if !civ.is_city_state() && !other_civ.is_city_state() {
        for third_civ in other_civs_we_know.iter().filter(|it| other_civ.knows(&it.civ_name)) {
            let can_declare_war = civ
                .get_diplomacy_manager(&third_civ.civ_name)
                .is_some_and(|it| it.can_declare_war());
            if can_declare_war {
                offers.push(TradeOffer::new(&third_civ.civ_name, TradeOfferType::WarDeclaration, 1));
            }
        }
    }
    offers
}

/// Commits `trade`, seen from `our_civ_name`, to both sides.
///
/// Validity is checked first and nothing changes on error. Cities change
/// hands before any treaty takes effect.
pub fn accept_trade(game: &mut GameInfo, our_civ_name: &str, other_civ_name: &str, trade: &Trade) -> Result<()> {
    let invalid = || UncivError::InvalidTrade(our_civ_name.to_string(), other_civ_name.to_string());
    let our_civ = game
        .get_civilization(our_civ_name)
        .ok_or_else(|| UncivError::UnknownCivilization(our_civ_name.to_string()))?;
    let other_civ = game
        .get_civilization(other_civ_name)
        .ok_or_else(|| UncivError::UnknownCivilization(other_civ_name.to_string()))?;
    if our_civ_name == other_civ_name
        || !our_civ.knows(other_civ_name)
        || !other_civ.knows(our_civ_name)
        || !is_trade_valid(game, trade, our_civ, other_civ)
    {
        return Err(invalid());
    }

    {
        let (our_civ, other_civ) = game.civ_pair_mut(our_civ_name, other_civ_name).ok_or_else(invalid)?;
        if let Some(manager) = our_civ.get_diplomacy_manager_mut(other_civ_name) {
            manager.trades.push(trade.clone());
            manager.update_has_open_borders();
        }
        if let Some(manager) = other_civ.get_diplomacy_manager_mut(our_civ_name) {
            manager.trades.push(trade.reverse());
            manager.update_has_open_borders();
        }
    }

    let not_treaty = |it: &&TradeOffer| it.offer_type != TradeOfferType::Treaty;
    let is_treaty = |it: &&TradeOffer| it.offer_type == TradeOfferType::Treaty;
    for offer in trade.their_offers.iter().filter(not_treaty) {
        transfer_offer(game, other_civ_name, our_civ_name, offer);
    }
    for offer in trade.our_offers.iter().filter(not_treaty) {
        transfer_offer(game, our_civ_name, other_civ_name, offer);
    }
    for offer in trade.their_offers.iter().filter(is_treaty) {
        transfer_offer(game, other_civ_name, our_civ_name, offer);
    }
    for offer in trade.our_offers.iter().filter(is_treaty) {
        transfer_offer(game, our_civ_name, other_civ_name, offer);
    }

    let ruleset = game.ruleset.clone();
    for civ_name in [our_civ_name, other_civ_name] {
        if let Some(civ) = game.get_civilization_mut(civ_name) {
            civ.update_happiness(&ruleset);
        }
    }
    info!(civ = %our_civ_name, other = %other_civ_name, "Trade accepted");
    Ok(())
}

/// Applies one offer handed from `from` to `to`.
fn transfer_offer(game: &mut GameInfo, from: &str, to: &str, offer: &TradeOffer) {
    match offer.offer_type {
        TradeOfferType::Gold => {
            if let Some((from_civ, to_civ)) = game.civ_pair_mut(from, to) {
                to_civ.add_gold(offer.amount);
                from_civ.add_gold(-offer.amount);
            }
        }
        TradeOfferType::Technology => {
            if let Some(to_civ) = game.get_civilization_mut(to) {
                to_civ.tech.add_technology(&offer.name);
            }
        }
        TradeOfferType::City => transfer_city(game, from, to, &offer.name),
        TradeOfferType::Treaty => {
            if offer.name == PEACE_TREATY {
                make_peace(game, to, from);
            }
            if offer.name == RESEARCH_AGREEMENT {
                if let Some(to_civ) = game.get_civilization_mut(to) {
                    to_civ.add_gold(-offer.amount);
                    if let Some(manager) = to_civ.get_diplomacy_manager_mut(from) {
                        manager.set_flag(DiplomacyFlags::ResearchAgreement, offer.duration);
                    }
                }
            }
        }
        TradeOfferType::Introduction => make_civilizations_meet(game, to, &offer.name),
        TradeOfferType::WarDeclaration => declare_war(game, from, &offer.name),
        // Timed offers act through the trade stored on the relation edges
        TradeOfferType::GoldPerTurn
        | TradeOfferType::Agreement
        | TradeOfferType::LuxuryResource
        | TradeOfferType::StrategicResource => {}
    }
}

fn transfer_city(game: &mut GameInfo, from: &str, to: &str, city_id: &str) {
    let Some((from_civ, to_civ)) = game.civ_pair_mut(from, to) else {
        return;
    };
    let Some(index) = from_civ.cities.iter().position(|it| it.id == city_id) else {
        return;
    };
    let mut city = from_civ.cities.remove(index);
    city.civ_name = to.to_string();
    city.is_capital = false;
    // Liberation is only offered to humans, for cities founded by a third party
    if to_civ.is_human() && !city.founding_civ.is_empty() && city.founding_civ != from && city.founding_civ != to {
        to_civ
            .popup_alerts
            .push(PopupAlert::new(AlertType::CityTraded, &city.id));
    }
    to_civ.cities.push(city);

    let tile_map = game.tile_map_mut();
    for tile in tile_map.tiles_mut() {
        if tile.owning_city.as_deref() == Some(city_id) {
            tile.owner = Some(to.to_string());
        }
    }
    debug!(city = %city_id, from = %from, to = %to, "City changed hands");
}
