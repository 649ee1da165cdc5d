use city::City;
use rules::{ConstructionContext, UniqueType};

use crate::civilization::Civilization;
use crate::game_info::GameInfo;

/// Answers buildability questions for one city of one civilization.
pub struct CityBuildContext<'a> {
    pub game: &'a GameInfo,
    pub civ: &'a Civilization,
    pub city: &'a City,
}

impl<'a> CityBuildContext<'a> {
    pub fn new(game: &'a GameInfo, civ: &'a Civilization, city: &'a City) -> Self {
        CityBuildContext { game, civ, city }
    }
}

impl ConstructionContext for CityBuildContext<'_> {
    fn civ_name(&self) -> &str {
        &self.civ.civ_name
    }

    fn is_tech_researched(&self, tech: &str) -> bool {
        self.civ.tech.is_researched(tech)
    }

    fn has_resource(&self, resource: &str) -> bool {
        self.civ.has_resource(&self.game.ruleset, resource)
    }

    fn has_building(&self, building: &str) -> bool {
        self.city.city_constructions.is_built(building)
    }

    fn civ_has_building(&self, building: &str) -> bool {
        self.civ
            .cities
            .iter()
            .any(|it| it.city_constructions.is_built(building))
    }

    fn is_wonder_built(&self, building: &str) -> bool {
        self.game.is_wonder_built(building)
    }

    fn is_being_built_elsewhere(&self, construction: &str) -> bool {
        self.civ
            .cities
            .iter()
            .filter(|it| it.id != self.city.id)
            .any(|it| it.city_constructions.is_being_constructed(construction))
    }

    fn civ_has_unique(&self, unique_type: UniqueType, param: Option<&str>) -> bool {
        match param {
            Some(param) => self.civ.has_unique_with_param(&self.game.ruleset, unique_type, param),
            None => self.civ.has_unique(&self.game.ruleset, unique_type),
        }
    }

    fn religion_enabled(&self) -> bool {
        self.game.religion_enabled
    }

    fn is_coastal(&self) -> bool {
        self.city.is_coastal(&self.game.tile_map)
    }
}
