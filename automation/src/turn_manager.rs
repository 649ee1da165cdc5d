use civilization::turn::end_turn;
use civilization::GameInfo;
use tracing::info;

use crate::civilization::next_turn_automation::automate_civ_moves;

/// Plays one full turn: every living civ in order, AI civs automated
/// before their end-of-turn bookkeeping.
pub fn next_turn(game: &mut GameInfo) {
    for civ_name in game.civ_names() {
        let Some(civ) = game.get_civilization(&civ_name) else {
            continue;
        };
        if civ.is_defeated() {
            continue;
        }
        if civ.is_ai() {
            automate_civ_moves(game, &civ_name);
        }
        end_turn(game, &civ_name);
    }
    game.turns += 1;
    info!(turn = game.turns, "Turn started");
}

pub fn run_turns(game: &mut GameInfo, turns: u32) {
    for _ in 0..turns {
        next_turn(game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civilization::testing::{add_city, GameBuilder};
    use diplomacy::DiplomacyFlags;
    use util::HexCoord;

    #[test]
    fn test_turn_counter_advances() {
        let mut game = GameBuilder::new().major_civ("Rome").build();
        add_city(&mut game, "Rome", HexCoord::default());
        run_turns(&mut game, 3);
        assert_eq!(game.turns, 3);
    }

    #[test]
    fn test_flags_count_down_once_per_turn() {
        let mut game = GameBuilder::new()
            .human_civ("Rome")
            .human_civ("Greece")
            .everyone_meets()
            .build();
        add_city(&mut game, "Rome", HexCoord::new(-5, 0));
        add_city(&mut game, "Greece", HexCoord::new(5, 0));
        game.get_civilization_mut("Rome")
            .unwrap()
            .get_diplomacy_manager_mut("Greece")
            .unwrap()
            .set_flag(DiplomacyFlags::DeclinedLuxExchange, 2);

        next_turn(&mut game);
        let flag = |game: &GameInfo| {
            game.get_civilization("Rome")
                .unwrap()
                .get_diplomacy_manager("Greece")
                .unwrap()
                .get_flag(DiplomacyFlags::DeclinedLuxExchange)
        };
        assert_eq!(flag(&game), Some(1));
        next_turn(&mut game);
        assert_eq!(flag(&game), None);
    }
}
