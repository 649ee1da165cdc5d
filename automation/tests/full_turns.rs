use automation::run_turns;
use civilization::testing::{add_city, add_units, GameBuilder};
use civilization::{CityStateType, GameInfo};
use util::HexCoord;

fn four_civ_game(seed: u64) -> GameInfo {
    let mut game = GameBuilder::new()
        .seed(seed)
        .major_civ("Rome")
        .major_civ("Greece")
        .city_state("Sidon", CityStateType::Mercantile)
        .barbarians()
        .everyone_meets()
        .build();
    add_city(&mut game, "Rome", HexCoord::new(-6, 0));
    add_city(&mut game, "Greece", HexCoord::new(6, 0));
    add_city(&mut game, "Sidon", HexCoord::new(0, 6));
    add_units(&mut game, "Rome", "Warrior", HexCoord::new(-6, 0), 2);
    add_units(&mut game, "Greece", "Warrior", HexCoord::new(6, 0), 2);
    add_units(&mut game, "Barbarians", "Warrior", HexCoord::new(0, -6), 1);
    game
}

#[test]
fn test_ai_civs_keep_building_over_many_turns() {
    let mut game = four_civ_game(7);
    run_turns(&mut game, 20);

    assert_eq!(game.turns, 20);
    for civ in game.civilizations.iter().filter(|it| !it.is_barbarian()) {
        assert!(!civ.cities.is_empty(), "{} lost every city", civ.civ_name);
        for city in &civ.cities {
            assert!(
                !city.city_constructions.current_construction_name().is_empty(),
                "{} is idle",
                city.name
            );
        }
    }
}

#[test]
fn test_same_seed_plays_the_same_game() {
    let mut first = four_civ_game(42);
    let mut second = four_civ_game(42);
    run_turns(&mut first, 10);
    run_turns(&mut second, 10);

    for (a, b) in first.civilizations.iter().zip(second.civilizations.iter()) {
        assert_eq!(a.gold, b.gold);
        assert_eq!(a.cities.len(), b.cities.len());
        assert_eq!(a.tech.techs_to_research, b.tech.techs_to_research);
        assert_eq!(a.units.len(), b.units.len());
    }
}
