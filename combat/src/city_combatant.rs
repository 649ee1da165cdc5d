const CITY_STRENGTH_BASE: f32 = 8.0;
const CITY_STRENGTH_PER_POP: f32 = 0.4;
const CITY_STRENGTH_FROM_TECHS_MULTIPLIER: f32 = 5.5;
const CITY_STRENGTH_FROM_TECHS_EXPONENT: f32 = 2.8;
const CITY_BASE_HEALTH: i32 = 200;

/// Defensive strength of a city.
///
/// # Parameters
/// * `population` - city population
/// * `building_strength` - sum of `city_strength` over built buildings
/// * `techs_percent_known` - researched techs / all techs, in `0.0..=1.0`
pub fn city_strength(population: i32, building_strength: i32, techs_percent_known: f32) -> f32 {
    let mut strength = CITY_STRENGTH_BASE;
    strength += population as f32 * CITY_STRENGTH_PER_POP;
    // As tech progresses so does city strength
    strength += (techs_percent_known * CITY_STRENGTH_FROM_TECHS_MULTIPLIER).powf(CITY_STRENGTH_FROM_TECHS_EXPONENT);
    strength += building_strength as f32;
    strength
}

pub fn city_max_health(building_health: i32) -> i32 {
    CITY_BASE_HEALTH + building_health
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_strength_grows_with_techs_and_buildings() {
        let base = city_strength(1, 0, 0.0);
        assert!((base - 8.4).abs() < 0.001);
        assert!(city_strength(1, 0, 0.5) > base);
        assert!((city_strength(1, 5, 0.0) - 13.4).abs() < 0.001);
    }

    #[test]
    fn test_max_health() {
        assert_eq!(city_max_health(0), 200);
        assert_eq!(city_max_health(100), 300);
    }
}
