use std::collections::{BTreeMap, BTreeSet};

use city::City;
use diplomacy::{DiplomacyManager, RelationshipLevel};
use map::TileMap;
use rules::{HasUniques, ResourceType, Ruleset, Stats, Unique, UniqueType, VictoryFocus};
use serde::{Deserialize, Serialize};
use trade::TradeRequest;
use util::HexCoord;

use crate::managers::{PolicyManager, ReligionManager, TechManager, VictoryManager};
use crate::map_unit::MapUnit;
use crate::notification::{Notification, NotificationCategory};
use crate::player_type::PlayerType;
use crate::popup_alert::PopupAlert;

/// Happiness every civilization starts from before cities and luxuries.
const BASE_HAPPINESS: i32 = 9;
const HAPPINESS_PER_LUXURY: i32 = 4;
const UNHAPPINESS_PER_CITY: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CityStateType {
    Cultured,
    Maritime,
    Mercantile,
    Militaristic,
    Religious,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CivKind {
    #[default]
    Major,
    CityState(CityStateType),
    Barbarian,
}

/// Civilization-wide countdowns that are not tied to one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CivFlags {
    /// Set on a city-state that paid tribute recently
    RecentlyBullied,
}

/// A player of the game: a major civilization, a city-state or the barbarians.
///
/// Civilizations are never removed from the game; a defeated one keeps its
/// relations so others can still reason about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Civilization {
    pub civ_name: String,
    pub kind: CivKind,
    pub player_type: PlayerType,
    pub victory_focus: VictoryFocus,

    /// Treasury
    pub gold: i32,

    /// Yields gathered at the last end of turn
    pub stats_for_next_turn: Stats,

    pub happiness: i32,

    pub cities: Vec<City>,
    pub units: Vec<MapUnit>,

    /// Relations keyed by the other civilization's name
    pub diplomacy: BTreeMap<String, DiplomacyManager>,

    /// Inbound trade requests in arrival order
    pub trade_requests: Vec<TradeRequest>,

    pub tech: TechManager,
    pub policies: PolicyManager,
    pub religion_manager: ReligionManager,
    pub victory_manager: VictoryManager,

    pub notifications: Vec<Notification>,
    pub popup_alerts: Vec<PopupAlert>,

    pub explored_tiles: BTreeSet<HexCoord>,

    /// For city-states, the major civilization they are allied with
    pub ally_civ: Option<String>,

    /// Uniques granted by the nation itself
    pub nation_uniques: Vec<Unique>,

    /// For city-states, the religion they lean towards
    pub favored_religion: Option<String>,

    pub civ_flags: BTreeMap<CivFlags, i32>,

    /// Resources extracted from owned tiles, refreshed each turn
    pub owned_resources: BTreeMap<String, i32>,

    /// Id of the first capital this civilization had
    pub original_capital: Option<String>,
}

impl Civilization {
    pub fn new(civ_name: &str, kind: CivKind) -> Self {
        Civilization {
            civ_name: civ_name.to_string(),
            kind,
            player_type: PlayerType::AI,
            victory_focus: VictoryFocus::Neutral,
            gold: 0,
            stats_for_next_turn: Stats::default(),
            happiness: BASE_HAPPINESS,
            cities: Vec::new(),
            units: Vec::new(),
            diplomacy: BTreeMap::new(),
            trade_requests: Vec::new(),
            tech: TechManager::new(),
            policies: PolicyManager::new(),
            religion_manager: ReligionManager::new(),
            victory_manager: VictoryManager::new(),
            notifications: Vec::new(),
            popup_alerts: Vec::new(),
            explored_tiles: BTreeSet::new(),
            ally_civ: None,
            nation_uniques: Vec::new(),
            favored_religion: None,
            civ_flags: BTreeMap::new(),
            owned_resources: BTreeMap::new(),
            original_capital: None,
        }
    }

    pub fn is_city_state(&self) -> bool {
        matches!(self.kind, CivKind::CityState(_))
    }

    pub fn city_state_type(&self) -> Option<CityStateType> {
        match self.kind {
            CivKind::CityState(city_state_type) => Some(city_state_type),
            _ => None,
        }
    }

    pub fn is_major_civ(&self) -> bool {
        self.kind == CivKind::Major
    }

    pub fn is_barbarian(&self) -> bool {
        self.kind == CivKind::Barbarian
    }

    pub fn is_ai(&self) -> bool {
        self.player_type.is_ai()
    }

    pub fn is_human(&self) -> bool {
        !self.is_ai()
    }

    pub fn is_defeated(&self) -> bool {
        self.cities.is_empty() && self.units.is_empty()
    }

    pub fn is_alive(&self) -> bool {
        !self.is_defeated()
    }

    pub fn knows(&self, other_civ_name: &str) -> bool {
        self.diplomacy.contains_key(other_civ_name)
    }

    pub fn get_known_civ_names(&self) -> impl Iterator<Item = &str> {
        self.diplomacy.keys().map(|it| it.as_str())
    }

    pub fn get_diplomacy_manager(&self, other_civ_name: &str) -> Option<&DiplomacyManager> {
        self.diplomacy.get(other_civ_name)
    }

    pub fn get_diplomacy_manager_mut(&mut self, other_civ_name: &str) -> Option<&mut DiplomacyManager> {
        self.diplomacy.get_mut(other_civ_name)
    }

    pub fn is_at_war_with(&self, other_civ_name: &str) -> bool {
        self.get_diplomacy_manager(other_civ_name)
            .is_some_and(|it| it.is_at_war())
    }

    pub fn is_at_war(&self) -> bool {
        self.diplomacy.values().any(|it| it.is_at_war())
    }

    /// How we feel about `other_civ_name`.
    ///
    /// City-states judge by influence, everyone else by opinion.
    pub fn get_relationship_level(&self, other_civ_name: &str) -> RelationshipLevel {
        match self.get_diplomacy_manager(other_civ_name) {
            None => RelationshipLevel::Neutral,
            Some(manager) if self.is_city_state() => {
                manager.relationship_from_influence(self.ally_civ.as_deref() == Some(other_civ_name))
            }
            Some(manager) => manager.relationship_from_opinion(),
        }
    }

    pub fn has_flag(&self, flag: CivFlags) -> bool {
        self.civ_flags.contains_key(&flag)
    }

    pub fn set_flag(&mut self, flag: CivFlags, turns: i32) {
        self.civ_flags.insert(flag, turns);
    }

    pub fn get_capital(&self) -> Option<&City> {
        self.cities.iter().find(|it| it.is_capital)
    }

    pub fn get_city(&self, city_id: &str) -> Option<&City> {
        self.cities.iter().find(|it| it.id == city_id)
    }

    pub fn get_city_mut(&mut self, city_id: &str) -> Option<&mut City> {
        self.cities.iter_mut().find(|it| it.id == city_id)
    }

    pub fn wants_to_focus_on(&self, focus: VictoryFocus) -> bool {
        self.victory_focus == focus
    }

    /// Uniques from the nation, researched techs, adopted policies and built buildings.
    pub fn get_matching_uniques(&self, ruleset: &Ruleset, unique_type: UniqueType) -> Vec<Unique> {
        let mut result: Vec<Unique> = self
            .nation_uniques
            .get_matching_uniques(unique_type)
            .into_iter()
            .cloned()
            .collect();
        for tech in ruleset
            .technologies
            .iter()
            .filter(|it| self.tech.is_researched(&it.name))
        {
            result.extend(tech.uniques.get_matching_uniques(unique_type).into_iter().cloned());
        }
        for policy in &self.policies.adopted_policies {
            if let Some(uniques) = ruleset.get_policy_uniques(policy) {
                result.extend(uniques.iter().filter(|it| it.unique_type == unique_type).cloned());
            }
        }
        for city in &self.cities {
            for building in city.get_built_buildings(ruleset) {
                result.extend(building.get_matching_uniques(unique_type).into_iter().cloned());
            }
        }
        result
    }

    pub fn has_unique(&self, ruleset: &Ruleset, unique_type: UniqueType) -> bool {
        !self.get_matching_uniques(ruleset, unique_type).is_empty()
    }

    /// Holds `unique_type` with a first param equal to `param`.
    pub fn has_unique_with_param(&self, ruleset: &Ruleset, unique_type: UniqueType, param: &str) -> bool {
        self.get_matching_uniques(ruleset, unique_type)
            .iter()
            .any(|it| it.param(0) == Some(param))
    }

    pub fn add_gold(&mut self, amount: i32) {
        self.gold += amount;
    }

    pub fn add_notification(&mut self, text: &str, category: NotificationCategory) {
        self.notifications.push(Notification::new(text, category));
    }

    pub fn get_military_units(&self) -> impl Iterator<Item = &MapUnit> {
        self.units.iter().filter(|it| it.is_military())
    }

    pub fn military_unit_count(&self) -> usize {
        self.get_military_units().count()
    }

    /// Summed force of every unit, used when comparing militaries.
    pub fn get_force(&self) -> i32 {
        self.units.iter().map(|it| it.get_force_evaluation()).sum()
    }

    /// Net resources flowing in through every active trade.
    pub fn resources_from_trades(&self) -> BTreeMap<String, i32> {
        let mut result = BTreeMap::new();
        for manager in self.diplomacy.values() {
            for (resource, amount) in manager.resources_from_trade() {
                *result.entry(resource).or_insert(0) += amount;
            }
        }
        result
    }

    /// Strategic resources consumed by units and buildings.
    pub fn resources_used(&self, ruleset: &Ruleset) -> BTreeMap<String, i32> {
        let mut result = BTreeMap::new();
        for resource in self.units.iter().filter_map(|it| it.base_unit.required_resource.as_ref()) {
            *result.entry(resource.clone()).or_insert(0) += 1;
        }
        for city in &self.cities {
            for resource in city
                .get_built_buildings(ruleset)
                .filter_map(|it| it.required_resource.as_ref())
            {
                *result.entry(resource.clone()).or_insert(0) += 1;
            }
        }
        result
    }

    /// Resources available for use: owned plus traded minus consumed.
    pub fn get_civ_resources(&self, ruleset: &Ruleset) -> BTreeMap<String, i32> {
        let mut result = self.owned_resources.clone();
        for (resource, amount) in self.resources_from_trades() {
            *result.entry(resource).or_insert(0) += amount;
        }
        for (resource, amount) in self.resources_used(ruleset) {
            *result.entry(resource).or_insert(0) -= amount;
        }
        result
    }

    pub fn get_resource_amount(&self, ruleset: &Ruleset, resource: &str) -> i32 {
        self.get_civ_resources(ruleset).get(resource).copied().unwrap_or(0)
    }

    pub fn has_resource(&self, ruleset: &Ruleset, resource: &str) -> bool {
        self.get_resource_amount(ruleset, resource) > 0
    }

    /// Resources of our own we can still hand over in a trade.
    pub fn get_tradable_resources(&self, ruleset: &Ruleset) -> BTreeMap<String, i32> {
        let traded = self.resources_from_trades();
        let used = self.resources_used(ruleset);
        self.owned_resources
            .iter()
            .filter(|(name, _)| ruleset.get_tile_resource(name).is_some_and(|it| it.is_tradable()))
            .map(|(name, amount)| {
                let given = traded.get(name).copied().unwrap_or(0).min(0);
                let consumed = used.get(name).copied().unwrap_or(0);
                (name.clone(), amount + given - consumed)
            })
            .filter(|(_, amount)| *amount > 0)
            .collect()
    }

    /// Recounts resources on improved tiles owned by this civilization.
    pub fn update_civ_resources(&mut self, tile_map: &TileMap, ruleset: &Ruleset) {
        let mut owned = BTreeMap::new();
        for tile in tile_map.tiles().filter(|it| it.is_owned_by(&self.civ_name)) {
            let Some(resource) = tile.resource.as_deref().and_then(|it| ruleset.get_tile_resource(it)) else {
                continue;
            };
            let improved = resource.improvement.is_some() && tile.improvement == resource.improvement;
            if !improved && !tile.is_city_center {
                continue;
            }
            let amount = match resource.resource_type {
                ResourceType::Strategic => tile.resource_amount.max(1),
                _ => 1,
            };
            *owned.entry(resource.name.clone()).or_insert(0) += amount;
        }
        self.owned_resources = owned;
    }

    /// Luxuries we hold at least one copy of.
    pub fn owned_luxuries(&self, ruleset: &Ruleset) -> BTreeSet<String> {
        self.get_civ_resources(ruleset)
            .into_iter()
            .filter(|(name, amount)| {
                *amount > 0
                    && ruleset
                        .get_tile_resource(name)
                        .is_some_and(|it| it.resource_type == ResourceType::Luxury)
            })
            .map(|(name, _)| name)
            .collect()
    }

    /// Percentage of a luxury's happiness kept after trading its last copy away.
    pub fn retained_luxury_happiness_percent(&self, ruleset: &Ruleset) -> f32 {
        self.get_matching_uniques(ruleset, UniqueType::RetainHappinessFromLuxury)
            .iter()
            .filter_map(|it| it.param_f32(0))
            .sum::<f32>()
            .min(100.0)
    }

    /// Happiness from luxuries, buildings, cities and population.
    pub fn compute_happiness(&self, ruleset: &Ruleset) -> i32 {
        let luxuries = self.owned_luxuries(ruleset);
        let mut happiness = BASE_HAPPINESS as f32 + (HAPPINESS_PER_LUXURY as usize * luxuries.len()) as f32;

        let retained = self.retained_luxury_happiness_percent(ruleset);
        if retained > 0.0 {
            let traded_away = self
                .owned_resources
                .iter()
                .filter(|(name, amount)| **amount > 0 && !luxuries.contains(*name))
                .filter(|(name, _)| {
                    ruleset
                        .get_tile_resource(name)
                        .is_some_and(|it| it.resource_type == ResourceType::Luxury)
                })
                .count();
            happiness += traded_away as f32 * HAPPINESS_PER_LUXURY as f32 * retained / 100.0;
        }

        for city in &self.cities {
            happiness += city.get_built_buildings(ruleset).map(|it| it.stats.happiness).sum::<f32>();
            happiness -= (UNHAPPINESS_PER_CITY + city.population) as f32;
        }
        happiness as i32
    }

    pub fn update_happiness(&mut self, ruleset: &Ruleset) {
        self.happiness = self.compute_happiness(ruleset);
    }

    /// For city-states, the civilizations that pledged to protect them.
    pub fn get_protector_civ_names(&self) -> Vec<String> {
        self.diplomacy
            .values()
            .filter(|it| it.diplomatic_status == diplomacy::DiplomaticStatus::Protector)
            .map(|it| it.other_civ_name.clone())
            .collect()
    }

    pub fn is_protected_by(&self, protector_name: &str) -> bool {
        self.get_diplomacy_manager(protector_name)
            .is_some_and(|it| it.diplomatic_status == diplomacy::DiplomaticStatus::Protector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use map::Terrain;
    use trade::{Trade, TradeOffer, TradeOfferType};

    fn civ_with_city() -> Civilization {
        let mut civ = Civilization::new("Rome", CivKind::Major);
        let mut capital = City::new("rome-1", "Rome", "Rome", HexCoord::default());
        capital.is_capital = true;
        civ.cities.push(capital);
        civ
    }

    #[test]
    fn test_happiness_counts_cities_and_luxuries() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut civ = civ_with_city();
        assert_eq!(civ.compute_happiness(&ruleset), 9 - 3 - 1);
        civ.owned_resources.insert("Silk".to_string(), 1);
        civ.owned_resources.insert("Wine".to_string(), 2);
        assert_eq!(civ.compute_happiness(&ruleset), 9 + 8 - 3 - 1);
    }

    #[test]
    fn test_traded_resources_leave_tradable_pool() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut civ = civ_with_city();
        civ.owned_resources.insert("Silk".to_string(), 2);
        civ.owned_resources.insert("Wheat".to_string(), 1);
        let mut manager = DiplomacyManager::new("Rome", "Greece");
        let mut trade = Trade::new();
        trade.our_offers.push(TradeOffer::new("Silk", TradeOfferType::LuxuryResource, 1));
        trade.their_offers.push(TradeOffer::new("Wine", TradeOfferType::LuxuryResource, 1));
        manager.trades.push(trade);
        civ.diplomacy.insert("Greece".to_string(), manager);

        let tradable = civ.get_tradable_resources(&ruleset);
        assert_eq!(tradable.get("Silk"), Some(&1));
        assert_eq!(tradable.get("Wine"), None);
        assert_eq!(tradable.get("Wheat"), None);
        assert!(civ.has_resource(&ruleset, "Wine"));
    }

    #[test]
    fn test_update_civ_resources_needs_improvement() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut civ = civ_with_city();
        let mut tile_map = TileMap::hexagon(1, Terrain::Grassland);
        let improvement = ruleset.get_tile_resource("Iron").and_then(|it| it.improvement.clone());
        for tile in tile_map.tiles_mut() {
            tile.owner = Some("Rome".to_string());
            if tile.position == HexCoord::new(1, 0) {
                tile.resource = Some("Iron".to_string());
                tile.resource_amount = 4;
            }
        }
        civ.update_civ_resources(&tile_map, &ruleset);
        assert_eq!(civ.owned_resources.get("Iron"), None);
        if let Some(tile) = tile_map.get_mut(&HexCoord::new(1, 0)) {
            tile.improvement = improvement;
        }
        civ.update_civ_resources(&tile_map, &ruleset);
        assert_eq!(civ.owned_resources.get("Iron"), Some(&4));
    }

    #[test]
    fn test_science_unique_from_technology() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut civ = civ_with_city();
        assert!(!civ.has_unique_with_param(&ruleset, UniqueType::EnablesCivWideStatProduction, "Science"));
        civ.tech.add_technology("Education");
        assert!(civ.has_unique_with_param(&ruleset, UniqueType::EnablesCivWideStatProduction, "Science"));
    }
}
