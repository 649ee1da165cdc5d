use map::Tile;
use rules::{ResourceType, Ruleset, Stat, Stats};

/// Yields of a single worked tile.
pub fn tile_stats(tile: &Tile, ruleset: &Ruleset) -> Stats {
    let mut stats = tile.terrain.base_stats();
    if let Some(resource) = tile.resource.as_deref().and_then(|it| ruleset.get_tile_resource(it)) {
        stats += resource.stats;
        let improved = resource.improvement.is_some() && tile.improvement == resource.improvement;
        if improved {
            let bonus = match resource.resource_type {
                ResourceType::Bonus => Stat::Food,
                ResourceType::Strategic => Stat::Production,
                ResourceType::Luxury => Stat::Gold,
            };
            stats.add_stat(bonus, 1.0);
        }
    }
    if tile.is_city_center {
        // City centers always yield at least one production and food
        if stats.production < 1.0 {
            stats.production = 1.0;
        }
        if stats.food < 1.0 {
            stats.food = 1.0;
        }
    }
    stats
}

/// Food needed to grow from `population` to the next size.
pub fn food_to_next_population(population: i32) -> i32 {
    let previous = (population - 1).max(0) as f32;
    15 + 6 * (population - 1).max(0) + previous.powf(1.8) as i32
}
