use automation::get_counteroffer;
use civilization::testing::{add_city, GameBuilder};
use civilization::trade::accept_trade;
use civilization::trade::trade_evaluation::get_trade_acceptability;
use civilization::GameInfo;
use proptest::prelude::*;
use trade::{Trade, TradeOffer, TradeOfferType, TradeRequest, GOLD, GOLD_PER_TURN};
use util::HexCoord;

fn game(rome_gold: i32, greece_gold: i32) -> GameInfo {
    let mut game = GameBuilder::new()
        .major_civ("Rome")
        .human_civ("Greece")
        .everyone_meets()
        .build();
    add_city(&mut game, "Rome", HexCoord::new(-5, 0));
    add_city(&mut game, "Greece", HexCoord::new(5, 0));
    game.get_civilization_mut("Rome").unwrap().gold = rome_gold;
    game.get_civilization_mut("Greece").unwrap().gold = greece_gold;
    game
}

fn total_gold(game: &GameInfo) -> i32 {
    game.civilizations.iter().map(|it| it.gold).sum()
}

fn gold_of(game: &GameInfo, civ_name: &str) -> i32 {
    game.get_civilization(civ_name).unwrap().gold
}

proptest! {
    #[test]
    fn prop_accepted_gold_trades_conserve_gold(
        rome_gold in 0..2000i32,
        greece_gold in 0..2000i32,
        rome_offer in 0..2500i32,
        greece_offer in 0..2500i32,
    ) {
        let mut game = game(rome_gold, greece_gold);
        let mut trade = Trade::new();
        if rome_offer > 0 {
            trade.our_offers.push(TradeOffer::new(GOLD, TradeOfferType::Gold, rome_offer));
        }
        if greece_offer > 0 {
            trade.their_offers.push(TradeOffer::new(GOLD, TradeOfferType::Gold, greece_offer));
        }
        let before = total_gold(&game);

        match accept_trade(&mut game, "Rome", "Greece", &trade) {
            Ok(()) => {
                prop_assert_eq!(gold_of(&game, "Rome"), rome_gold - rome_offer + greece_offer);
                prop_assert_eq!(gold_of(&game, "Greece"), greece_gold - greece_offer + rome_offer);
            }
            Err(_) => {
                prop_assert_eq!(gold_of(&game, "Rome"), rome_gold);
                prop_assert_eq!(gold_of(&game, "Greece"), greece_gold);
            }
        }
        prop_assert_eq!(total_gold(&game), before);
    }

    #[test]
    fn prop_counteroffers_ask_just_enough(
        rome_gold in 0..1500i32,
        greece_gold in 0..1500i32,
        asked in 1..50i32,
    ) {
        let game = game(rome_gold, greece_gold);
        // Greece asks Rome for gold per turn and offers nothing
        let asked_offer = TradeOffer::new(GOLD_PER_TURN, TradeOfferType::GoldPerTurn, asked);
        let mut trade = Trade::new();
        trade.our_offers.push(asked_offer.clone());
        let request = TradeRequest::new("Greece", trade);
        let rome = game.get_civilization("Rome").unwrap();
        let greece = game.get_civilization("Greece").unwrap();
        prop_assert!(get_trade_acceptability(&game, &request.trade, rome, greece) < 0);

        if let Some(counteroffer) = get_counteroffer(&game, rome, &request) {
            prop_assert_eq!(counteroffer.requesting_civ.as_str(), "Rome");
            let rome_view = counteroffer.trade.reverse();
            let acceptability = get_trade_acceptability(&game, &rome_view, rome, greece);
            prop_assert!(acceptability >= 0);
            prop_assert!(rome_view.our_offers.contains(&asked_offer));
            prop_assert!(!rome_view.their_offers.is_empty());

            // Every ask is needed in full
            for (index, ask) in rome_view.their_offers.iter().enumerate() {
                let mut without_ask = rome_view.clone();
                without_ask.their_offers.remove(index);
                prop_assert!(get_trade_acceptability(&game, &without_ask, rome, greece) < 0);
                if ask.offer_type == TradeOfferType::Gold && ask.amount > 1 {
                    let mut smaller_ask = rome_view.clone();
                    smaller_ask.their_offers[index] = ask.clone_with_amount(ask.amount - 1);
                    prop_assert!(get_trade_acceptability(&game, &smaller_ask, rome, greece) < 0);
                }
            }
        }
    }
}
