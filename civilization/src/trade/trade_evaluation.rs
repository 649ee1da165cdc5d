use std::collections::BTreeSet;

use city::City;
use diplomacy::{DiplomacyFlags, RelationshipLevel};
use rules::{Construction, RejectionReasonType, UniqueType};
use trade::{Trade, TradeOffer, TradeOfferType, OPEN_BORDERS, PEACE_TREATY, RESEARCH_AGREEMENT};

use crate::civilization::Civilization;
use crate::construction_context::CityBuildContext;
use crate::game_info::GameInfo;
use crate::threat::{threat_assessment, ThreatLevel};

/// Gold a civ with only a copy left wants for trading a luxury away.
const LAST_LUXURY_SELL_COST: i32 = 600;
const SPARE_LUXURY_SELL_COST: i32 = 250;

/// Checks that neither side gives away what it no longer has.
pub fn is_trade_valid(game: &GameInfo, trade: &Trade, offerer: &Civilization, trade_partner: &Civilization) -> bool {
    // A civ that founded its capital may not trade away every city it has
    let gives_all_cities = |civ: &Civilization, offers: &[TradeOffer]| {
        civ.original_capital.is_some()
            && offers.iter().filter(|it| it.offer_type == TradeOfferType::City).count() == civ.cities.len()
    };
    if gives_all_cities(offerer, &trade.our_offers) || gives_all_cities(trade_partner, &trade.their_offers) {
        return false;
    }

    trade
        .our_offers
        .iter()
        .all(|offer| is_offer_valid(game, offer, offerer, trade_partner))
        && trade
            .their_offers
            .iter()
            .all(|offer| is_offer_valid(game, offer, trade_partner, offerer))
}

fn is_offer_valid(game: &GameInfo, offer: &TradeOffer, offerer: &Civilization, trade_partner: &Civilization) -> bool {
    let has_resource = || offerer.get_resource_amount(&game.ruleset, &offer.name) >= offer.amount;

    match offer.offer_type {
        // Going a little negative is fine, promising the same gold to many is not
        TradeOfferType::Gold => (offer.amount as f32 * 0.9) < offerer.gold as f32,
        TradeOfferType::GoldPerTurn => (offer.amount as f32 * 0.9) < offerer.stats_for_next_turn.gold,
        TradeOfferType::Treaty => match offer.name.as_str() {
            PEACE_TREATY => offerer.is_at_war_with(&trade_partner.civ_name),
            RESEARCH_AGREEMENT => !offerer
                .get_diplomacy_manager(&trade_partner.civ_name)
                .is_some_and(|it| it.has_flag(DiplomacyFlags::ResearchAgreement)),
            _ => true,
        },
        TradeOfferType::Agreement => true,
        TradeOfferType::LuxuryResource | TradeOfferType::StrategicResource => has_resource(),
        TradeOfferType::Technology => !trade_partner.tech.is_researched(&offer.name),
        TradeOfferType::Introduction => !trade_partner.knows(&offer.name),
        TradeOfferType::WarDeclaration => offerer
            .get_diplomacy_manager(&offer.name)
            .is_some_and(|it| it.can_declare_war()),
        TradeOfferType::City => offerer.cities.iter().any(|it| it.id == offer.name),
    }
}

pub fn is_trade_acceptable(game: &GameInfo, trade: &Trade, evaluator: &Civilization, trade_partner: &Civilization) -> bool {
    get_trade_acceptability(game, trade, evaluator, trade_partner) >= 0
}

/// Favorability delta of `trade` for `evaluator`, in gold.
pub fn get_trade_acceptability(
    game: &GameInfo,
    trade: &Trade,
    evaluator: &Civilization,
    trade_partner: &Civilization,
) -> i32 {
    let cities_asked_to_surrender = trade
        .our_offers
        .iter()
        .filter(|it| it.offer_type == TradeOfferType::City)
        .count();
    let max_cities_to_surrender = evaluator.cities.len().div_ceil(5);
    if cities_asked_to_surrender > max_cities_to_surrender {
        return i32::MIN;
    }

    // Treaties count once, on our side
    let sum_of_their_offers = trade
        .their_offers
        .iter()
        .filter(|it| it.offer_type != TradeOfferType::Treaty)
        .map(|it| evaluate_buy_cost(game, it, evaluator, trade_partner))
        .fold(0i32, i32::saturating_add);

    let mut sum_of_our_offers = trade
        .our_offers
        .iter()
        .map(|it| evaluate_sell_cost(game, it, evaluator, trade_partner))
        .fold(0i32, i32::saturating_add);

    // No haggling harder with people we hate when we just want peace
    let has_treaty = trade
        .our_offers
        .iter()
        .chain(trade.their_offers.iter())
        .any(|it| it.name == PEACE_TREATY || it.name == RESEARCH_AGREEMENT);
    if !has_treaty {
        match evaluator.get_relationship_level(&trade_partner.civ_name) {
            RelationshipLevel::Enemy => sum_of_our_offers = (sum_of_our_offers as f32 * 1.5) as i32,
            RelationshipLevel::Unforgivable => sum_of_our_offers = sum_of_our_offers.saturating_mul(2),
            _ => {}
        }
    }

    sum_of_their_offers.saturating_sub(sum_of_our_offers)
}

/// What `offer` is worth to `civ` when `trade_partner` hands it over.
pub fn evaluate_buy_cost(game: &GameInfo, offer: &TradeOffer, civ: &Civilization, trade_partner: &Civilization) -> i32 {
    let ruleset = &game.ruleset;
    match offer.offer_type {
        TradeOfferType::Gold => offer.amount,
        TradeOfferType::GoldPerTurn => offer.amount.saturating_mul(offer.duration),
        TradeOfferType::Treaty => match offer.name.as_str() {
            PEACE_TREATY => evaluate_peace_cost_for_them(civ, trade_partner),
            RESEARCH_AGREEMENT => -offer.amount,
            _ => 1000,
        },
        TradeOfferType::Agreement => {
            if offer.name == OPEN_BORDERS {
                100
            } else {
                0
            }
        }
        TradeOfferType::LuxuryResource => {
            if civ.has_resource(ruleset, &offer.name) {
                // Luxuries do not stack, one copy is all we want
                return 0;
            }
            let we_love_the_king_potential = civ
                .cities
                .iter()
                .filter(|it| it.demanded_resource.as_deref() == Some(offer.name.as_str()))
                .count() as i32
                * 50;
            we_love_the_king_potential
                + match civ.happiness {
                    happiness if happiness < 0 => 450,
                    happiness if happiness < 10 => 350,
                    // Above the sell price, both sides gain from a swap
                    _ => 300,
                }
        }
        TradeOfferType::StrategicResource => {
            let amount_willing_to_buy = 2 - civ.get_resource_amount(ruleset, &offer.name);
            if amount_willing_to_buy <= 0 || !can_use_resource(game, civ, &offer.name) {
                return 0;
            }
            50 * amount_willing_to_buy.min(offer.amount)
        }
        TradeOfferType::Technology => tech_value(game, &offer.name),
        TradeOfferType::Introduction => ruleset.introduction_value(),
        TradeOfferType::WarDeclaration => {
            let Some(target) = game.get_civilization(&offer.name) else {
                return 0;
            };
            if !civ.is_at_war_with(&target.civ_name) {
                return 0;
            }
            match threat_assessment(civ, target) {
                ThreatLevel::VeryLow | ThreatLevel::Low => 0,
                ThreatLevel::Medium => 100,
                ThreatLevel::High => 500,
                ThreatLevel::VeryHigh => 1000,
            }
        }
        TradeOfferType::City => {
            let Some(city) = trade_partner.get_city(&offer.name) else {
                return 0;
            };
            let city_happiness = city.get_built_buildings(ruleset).map(|it| it.stats.happiness).sum::<f32>() as i32
                - (3 + city.population);
            if civ.happiness + city_happiness < 0 {
                return 0;
            }
            let surrounded = surrounded_by_our_cities(game, city, civ);
            let buildings = city.city_constructions.built_buildings.len() as i32;
            (city.population * 4 + buildings + 4 + surrounded).saturating_mul(100)
        }
    }
}

/// What giving `offer` to `trade_partner` costs `civ`.
pub fn evaluate_sell_cost(game: &GameInfo, offer: &TradeOffer, civ: &Civilization, trade_partner: &Civilization) -> i32 {
    let ruleset = &game.ruleset;
    match offer.offer_type {
        TradeOfferType::Gold => offer.amount,
        TradeOfferType::GoldPerTurn => offer.amount.saturating_mul(offer.duration),
        TradeOfferType::Treaty => match offer.name.as_str() {
            PEACE_TREATY => evaluate_peace_cost_for_them(civ, trade_partner),
            RESEARCH_AGREEMENT => -offer.amount,
            _ => 1000,
        },
        TradeOfferType::Agreement => {
            if offer.name != OPEN_BORDERS {
                return 0;
            }
            match civ.get_relationship_level(&trade_partner.civ_name) {
                RelationshipLevel::Unforgivable => 10000,
                RelationshipLevel::Enemy => 2000,
                RelationshipLevel::Competitor => 500,
                RelationshipLevel::Neutral => 200,
                RelationshipLevel::Favorable | RelationshipLevel::Friend | RelationshipLevel::Ally => 100,
            }
        }
        TradeOfferType::LuxuryResource => {
            if civ.get_resource_amount(ruleset, &offer.name) > 1 {
                SPARE_LUXURY_SELL_COST
            } else {
                let retained = civ.retained_luxury_happiness_percent(ruleset);
                LAST_LUXURY_SELL_COST - (retained / 100.0 * 350.0) as i32
            }
        }
        TradeOfferType::StrategicResource => {
            let space_race = civ.has_unique(ruleset, UniqueType::EnablesConstructionOfSpaceshipParts)
                || trade_partner.has_unique(ruleset, UniqueType::EnablesConstructionOfSpaceshipParts);
            if space_race && ruleset.space_resources().contains(&offer.name) {
                return i32::MAX;
            }
            if !civ.is_at_war() || !can_use_resource(game, civ, &offer.name) {
                return 50 * offer.amount;
            }
            // Each unit under the five-unit baseline costs 100 more than the last
            let amount_left = civ.get_resource_amount(ruleset, &offer.name);
            let mut total_cost = 0i32;
            for number_of_resource in (amount_left - offer.amount + 1)..=amount_left {
                total_cost = total_cost.saturating_add(if number_of_resource > 5 {
                    100
                } else {
                    (6 - number_of_resource) * 100
                });
            }
            total_cost
        }
        TradeOfferType::Technology => tech_value(game, &offer.name),
        TradeOfferType::Introduction => ruleset.introduction_value(),
        TradeOfferType::WarDeclaration => {
            let Some(target) = game.get_civilization(&offer.name) else {
                return 0;
            };
            match threat_assessment(civ, target) {
                ThreatLevel::VeryLow => 100,
                ThreatLevel::Low => 250,
                ThreatLevel::Medium => 500,
                ThreatLevel::High => 1000,
                // Declaring war on them would be suicide
                ThreatLevel::VeryHigh => 10000,
            }
        }
        TradeOfferType::City => {
            let Some(city) = civ.get_city(&offer.name) else {
                return i32::MAX;
            };
            let distance_bonus = distance_city_trade_modifier(game, civ, city);
            let buildings = city.city_constructions.built_buildings.len() as i32;
            (city.population * 4 + buildings + 4 + distance_bonus)
                .saturating_mul(100)
                .max(1000)
        }
    }
}

/// Gold the other side should pay us for peace, negative when we should pay.
pub fn evaluate_peace_cost_for_them(our_civ: &Civilization, other_civ: &Civilization) -> i32 {
    let our_combat_strength = our_civ.get_force();
    let their_combat_strength = other_civ.get_force();
    if our_combat_strength == their_combat_strength {
        return 0;
    }
    if our_combat_strength == 0 {
        return -1000;
    }
    if their_combat_strength == 0 {
        return 1000;
    }
    if our_combat_strength > their_combat_strength {
        let absolute_advantage = our_combat_strength - their_combat_strength;
        let percentage_advantage = absolute_advantage as f32 / their_combat_strength as f32;
        ((absolute_advantage as f32 * percentage_advantage) as i32).saturating_mul(10)
    } else {
        let absolute_advantage = their_combat_strength - our_combat_strength;
        let percentage_advantage = absolute_advantage as f32 / our_combat_strength as f32;
        -((absolute_advantage as f32 * percentage_advantage) as i32).saturating_mul(10)
    }
}

fn tech_value(game: &GameInfo, tech_name: &str) -> i32 {
    game.ruleset
        .get_technology(tech_name)
        .map(|it| (it.cost as f32).sqrt() as i32 * 20)
        .unwrap_or(0)
}

/// Whether any of our cities could build something consuming `resource` once we have it.
fn can_use_resource(game: &GameInfo, civ: &Civilization, resource: &str) -> bool {
    let ruleset = &game.ruleset;
    let consumers: Vec<Construction> = ruleset
        .buildings
        .iter()
        .filter(|it| it.required_resource.as_deref() == Some(resource))
        .map(Construction::Building)
        .chain(
            ruleset
                .units
                .iter()
                .filter(|it| it.required_resource.as_deref() == Some(resource))
                .map(Construction::Unit),
        )
        .collect();
    civ.cities.iter().any(|city| {
        let context = CityBuildContext::new(game, civ, city);
        consumers.iter().any(|construction| {
            construction
                .rejection_reasons(&context)
                .iter()
                .all(|it| *it == RejectionReasonType::MissingResources)
        })
    })
}

/// Civilizations owning tiles right outside the city's borders.
fn neighbouring_civs(game: &GameInfo, city: &City) -> BTreeSet<String> {
    let city_tiles: BTreeSet<_> = city.get_tiles(&game.tile_map).map(|it| it.position).collect();
    city_tiles
        .iter()
        .flat_map(|position| game.tile_map.neighbors(position))
        .filter(|it| !city_tiles.contains(&it.position))
        .filter_map(|it| it.get_owner().map(|owner| owner.to_string()))
        .collect()
}

fn surrounded_by_our_cities(game: &GameInfo, city: &City, civ: &Civilization) -> i32 {
    let bordering_civs = neighbouring_civs(game, city);
    let era = civ.tech.era(&game.ruleset);
    if bordering_civs.len() == 1 && bordering_civs.contains(&civ.civ_name) {
        return 10 * era;
    }
    if bordering_civs.contains(&civ.civ_name) {
        return 2 * era;
    }
    0
}

fn distance_city_trade_modifier(game: &GameInfo, civ: &Civilization, city: &City) -> i32 {
    let Some(capital) = civ.get_capital() else {
        return 0;
    };
    let distance_to_capital = capital.location.aerial_distance_to(&city.location);
    if distance_to_capital < 500 {
        0
    } else {
        (distance_to_capital - 500) * civ.tech.era(&game.ruleset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_city, add_units, GameBuilder};
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

    fn civs(game: &GameInfo) -> (&Civilization, &Civilization) {
        (game.get_civilization("Rome").unwrap(), game.get_civilization("Greece").unwrap())
    }

    #[test]
    fn test_gold_for_gold_is_neutral() {
        let game = game();
        let (rome, greece) = civs(&game);
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Gold", TradeOfferType::Gold, 100));
        trade.their_offers.push(TradeOffer::new("Gold per turn", TradeOfferType::GoldPerTurn, 4));
        assert_eq!(get_trade_acceptability(&game, &trade, rome, greece), 20);
        assert!(is_trade_acceptable(&game, &trade, rome, greece));
    }

    #[test]
    fn test_luxury_values() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().owned_resources.insert("Silk".to_string(), 2);
        game.get_civilization_mut("Rome").unwrap().happiness = 5;
        let (rome, greece) = civs(&game);
        let silk = TradeOffer::new("Silk", TradeOfferType::LuxuryResource, 1);
        let wine = TradeOffer::new("Wine", TradeOfferType::LuxuryResource, 1);
        assert_eq!(evaluate_sell_cost(&game, &silk, rome, greece), 250);
        assert_eq!(evaluate_buy_cost(&game, &silk, rome, greece), 0);
        assert_eq!(evaluate_buy_cost(&game, &wine, rome, greece), 350);
    }

    #[test]
    fn test_last_luxury_is_expensive() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().owned_resources.insert("Silk".to_string(), 1);
        let (rome, greece) = civs(&game);
        let silk = TradeOffer::new("Silk", TradeOfferType::LuxuryResource, 1);
        assert_eq!(evaluate_sell_cost(&game, &silk, rome, greece), 600);
    }

    #[test]
    fn test_peace_cost_follows_force() {
        let mut game = game();
        let (rome, greece) = civs(&game);
        assert_eq!(evaluate_peace_cost_for_them(rome, greece), 0);
        add_units(&mut game, "Rome", "Warrior", HexCoord::new(-4, 0), 2);
        let (rome, greece) = civs(&game);
        assert_eq!(evaluate_peace_cost_for_them(rome, greece), 1000);
        assert_eq!(evaluate_peace_cost_for_them(greece, rome), -1000);
        add_units(&mut game, "Greece", "Warrior", HexCoord::new(4, 0), 1);
        let (rome, greece) = civs(&game);
        let force = greece.get_force();
        assert_eq!(evaluate_peace_cost_for_them(rome, greece), force * 10);
        assert_eq!(evaluate_peace_cost_for_them(greece, rome), -force * 10);
    }

    #[test]
    fn test_too_many_cities_is_unacceptable() {
        let game = game();
        let (rome, greece) = civs(&game);
        let mut trade = Trade::new();
        let capital = rome.get_capital().unwrap().id.clone();
        trade.our_offers.push(TradeOffer::new(&capital, TradeOfferType::City, 1));
        trade.our_offers.push(TradeOffer::new("rome-2", TradeOfferType::City, 1));
        assert_eq!(get_trade_acceptability(&game, &trade, rome, greece), i32::MIN);
    }

    #[test]
    fn test_hatred_raises_our_price() {
        let mut game = game();
        game.get_civilization_mut("Rome")
            .unwrap()
            .get_diplomacy_manager_mut("Greece")
            .unwrap()
            .add_modifier(diplomacy::DiplomaticModifiers::DeclaredWarOnUs, -50.0);
        let (rome, greece) = civs(&game);
        assert_eq!(rome.get_relationship_level("Greece"), RelationshipLevel::Enemy);
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Gold", TradeOfferType::Gold, 100));
        trade.their_offers.push(TradeOffer::new("Gold", TradeOfferType::Gold, 120));
        assert_eq!(get_trade_acceptability(&game, &trade, rome, greece), -30);
    }

    #[test]
    fn test_validity() {
        let mut game = game();
        game.get_civilization_mut("Rome").unwrap().gold = 100;
        let (rome, greece) = civs(&game);
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Gold", TradeOfferType::Gold, 100));
        assert!(is_trade_valid(&game, &trade, rome, greece));
        trade.our_offers[0].amount = 200;
        assert!(!is_trade_valid(&game, &trade, rome, greece));

        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new(PEACE_TREATY, TradeOfferType::Treaty, 1));
        assert!(!is_trade_valid(&game, &trade, rome, greece));

        let mut trade = Trade::new();
        trade.their_offers.push(TradeOffer::new("Silk", TradeOfferType::LuxuryResource, 1));
        assert!(!is_trade_valid(&game, &trade, rome, greece));

        let mut trade = Trade::new();
        let capital = rome.get_capital().unwrap().id.clone();
        trade.our_offers.push(TradeOffer::new(&capital, TradeOfferType::City, 1));
        assert!(!is_trade_valid(&game, &trade, rome, greece));
    }

    #[test]
    fn test_strategic_buy_needs_a_use() {
        let mut game = game();
        let (rome, greece) = civs(&game);
        let iron = TradeOffer::new("Iron", TradeOfferType::StrategicResource, 3);
        assert_eq!(evaluate_buy_cost(&game, &iron, rome, greece), 0);
        for tech in ["Agriculture", "Mining", "Bronze Working", "Iron Working"] {
            game.get_civilization_mut("Rome").unwrap().tech.add_technology(tech);
        }
        let (rome, greece) = civs(&game);
        assert_eq!(evaluate_buy_cost(&game, &iron, rome, greece), 100);
    }
}
