use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use trade::{Trade, TradeOfferType, OPEN_BORDERS};

use crate::flags::DiplomacyFlags;
use crate::modifiers::DiplomaticModifiers;
use crate::relationship_level::RelationshipLevel;
use crate::status::DiplomaticStatus;

const MINIMUM_INFLUENCE: f32 = -60.0;

/// What expired on a relation during [`DiplomacyManager::next_turn`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiplomacyTurnOutcome {
    pub expired_flags: Vec<DiplomacyFlags>,
    pub ended_trades: Vec<Trade>,
}

/// One directed edge of the diplomacy graph: how `civ_name` relates to `other_civ_name`.
///
/// Flags and modifiers are asymmetric; the reverse edge lives on the other civilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomacyManager {
    pub civ_name: String,
    pub other_civ_name: String,
    pub diplomatic_status: DiplomaticStatus,
    pub flags_countdown: BTreeMap<DiplomacyFlags, i32>,
    pub diplomatic_modifiers: BTreeMap<DiplomaticModifiers, f32>,
    /// Active deals, from `civ_name`'s point of view.
    pub trades: Vec<Trade>,
    /// Only meaningful when `civ_name` is a city-state.
    pub influence: f32,
    /// Whether the other civ currently grants us open borders.
    pub has_open_borders: bool,
}

impl DiplomacyManager {
    pub fn new(civ_name: &str, other_civ_name: &str) -> Self {
        DiplomacyManager {
            civ_name: civ_name.to_string(),
            other_civ_name: other_civ_name.to_string(),
            diplomatic_status: DiplomaticStatus::Peace,
            flags_countdown: BTreeMap::new(),
            diplomatic_modifiers: BTreeMap::new(),
            trades: Vec::new(),
            influence: 0.0,
            has_open_borders: false,
        }
    }

    pub fn has_flag(&self, flag: DiplomacyFlags) -> bool {
        self.flags_countdown.contains_key(&flag)
    }

    pub fn set_flag(&mut self, flag: DiplomacyFlags, turns: i32) {
        self.flags_countdown.insert(flag, turns);
    }

    pub fn remove_flag(&mut self, flag: DiplomacyFlags) {
        self.flags_countdown.remove(&flag);
    }

    pub fn get_flag(&self, flag: DiplomacyFlags) -> Option<i32> {
        self.flags_countdown.get(&flag).copied()
    }

    pub fn add_modifier(&mut self, modifier: DiplomaticModifiers, amount: f32) {
        *self.diplomatic_modifiers.entry(modifier).or_insert(0.0) += amount;
    }

    pub fn set_modifier(&mut self, modifier: DiplomaticModifiers, amount: f32) {
        self.diplomatic_modifiers.insert(modifier, amount);
    }

    pub fn remove_modifier(&mut self, modifier: DiplomaticModifiers) {
        self.diplomatic_modifiers.remove(&modifier);
    }

    pub fn has_modifier(&self, modifier: DiplomaticModifiers) -> bool {
        self.diplomatic_modifiers.contains_key(&modifier)
    }

    pub fn opinion_of_other_civ(&self) -> f32 {
        self.diplomatic_modifiers.values().sum()
    }

    pub fn is_at_war(&self) -> bool {
        self.diplomatic_status == DiplomaticStatus::War
    }

    pub fn can_declare_war(&self) -> bool {
        !self.is_at_war() && !self.has_flag(DiplomacyFlags::DeclaredWar)
    }

    /// Relationship between two major civilizations, derived from opinion.
    pub fn relationship_from_opinion(&self) -> RelationshipLevel {
        let opinion = self.opinion_of_other_civ();
        if opinion <= -80.0 {
            return RelationshipLevel::Unforgivable;
        }
        if opinion <= -40.0 || self.is_at_war() {
            return RelationshipLevel::Enemy;
        }
        if opinion <= -15.0 {
            return RelationshipLevel::Competitor;
        }
        if opinion >= 80.0 {
            return RelationshipLevel::Ally;
        }
        if opinion >= 40.0 {
            return RelationshipLevel::Friend;
        }
        if opinion >= 15.0 {
            return RelationshipLevel::Favorable;
        }
        RelationshipLevel::Neutral
    }

    /// Relationship of a city-state towards the other civ, derived from influence.
    pub fn relationship_from_influence(&self, other_is_ally: bool) -> RelationshipLevel {
        if self.influence <= -30.0 || self.is_at_war() {
            return RelationshipLevel::Unforgivable;
        }
        if self.influence < 0.0 {
            return RelationshipLevel::Enemy;
        }
        if self.influence >= 60.0 && other_is_ally {
            return RelationshipLevel::Ally;
        }
        if self.influence >= 30.0 {
            return RelationshipLevel::Friend;
        }
        RelationshipLevel::Neutral
    }

    pub fn add_influence(&mut self, amount: f32) {
        self.influence = f32::max(self.influence + amount, MINIMUM_INFLUENCE);
    }

    /// Moves influence one point towards `resting_point`.
    pub fn decay_influence(&mut self, resting_point: f32) {
        if self.influence > resting_point {
            self.influence = f32::max(resting_point, self.influence - 1.0);
        } else if self.influence < resting_point {
            self.influence = f32::min(resting_point, self.influence + 1.0);
        }
    }

    /// Net resources flowing to us through active trades.
    pub fn resources_from_trade(&self) -> BTreeMap<String, i32> {
        let mut resources = BTreeMap::new();
        for trade in &self.trades {
            for offer in trade.their_offers.iter().filter(|it| it.offer_type.is_resource()) {
                *resources.entry(offer.name.clone()).or_insert(0) += offer.amount;
            }
            for offer in trade.our_offers.iter().filter(|it| it.offer_type.is_resource()) {
                *resources.entry(offer.name.clone()).or_insert(0) -= offer.amount;
            }
        }
        resources
    }

    /// Net gold per turn flowing to us through active trades.
    pub fn gold_per_turn_from_trade(&self) -> i32 {
        let mut gold = 0;
        for trade in &self.trades {
            gold += trade
                .their_offers
                .iter()
                .filter(|it| it.offer_type == TradeOfferType::GoldPerTurn && it.duration > 0)
                .map(|it| it.amount)
                .sum::<i32>();
            gold -= trade
                .our_offers
                .iter()
                .filter(|it| it.offer_type == TradeOfferType::GoldPerTurn && it.duration > 0)
                .map(|it| it.amount)
                .sum::<i32>();
        }
        gold
    }

    pub fn update_has_open_borders(&mut self) {
        self.has_open_borders = self.trades.iter().any(|trade| {
            trade
                .their_offers
                .iter()
                .any(|it| it.name == OPEN_BORDERS && it.offer_type == TradeOfferType::Agreement && it.duration > 0)
        });
    }

    /// Counts down flags, trades and modifiers by one turn.
    pub fn next_turn(&mut self) -> DiplomacyTurnOutcome {
        let mut outcome = DiplomacyTurnOutcome::default();

        for (flag, turns) in self.flags_countdown.iter_mut() {
            *turns -= 1;
            if *turns <= 0 {
                outcome.expired_flags.push(*flag);
            }
        }
        for flag in &outcome.expired_flags {
            self.flags_countdown.remove(flag);
        }

        for trade in self.trades.iter_mut() {
            for offer in trade.our_offers.iter_mut().chain(trade.their_offers.iter_mut()) {
                if !offer.offer_type.is_immediate() && offer.duration > 0 {
                    offer.duration -= 1;
                }
            }
        }
        let (ended, active): (Vec<Trade>, Vec<Trade>) =
            std::mem::take(&mut self.trades).into_iter().partition(|it| it.has_expired());
        self.trades = active;
        outcome.ended_trades = ended;

        for (modifier, value) in self.diplomatic_modifiers.iter_mut() {
            let decay = modifier.decay_per_turn();
            if *value > 0.0 {
                *value = f32::max(0.0, *value - decay);
            } else if *value < 0.0 {
                *value = f32::min(0.0, *value + decay);
            }
        }
        self.diplomatic_modifiers.retain(|_, value| *value != 0.0);

        self.update_has_open_borders();

        if !outcome.expired_flags.is_empty() || !outcome.ended_trades.is_empty() {
            debug!(
                civ = %self.civ_name,
                other = %self.other_civ_name,
                expired_flags = outcome.expired_flags.len(),
                ended_trades = outcome.ended_trades.len(),
                "Diplomacy countdowns expired"
            );
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trade::TradeOffer;

    #[test]
    fn test_flags_expire_after_countdown() {
        let mut manager = DiplomacyManager::new("Rome", "Greece");
        manager.set_flag(DiplomacyFlags::DeclinedPeace, 2);
        assert!(manager.next_turn().expired_flags.is_empty());
        assert!(manager.has_flag(DiplomacyFlags::DeclinedPeace));
        assert_eq!(manager.next_turn().expired_flags, vec![DiplomacyFlags::DeclinedPeace]);
        assert!(!manager.has_flag(DiplomacyFlags::DeclinedPeace));
    }

    #[test]
    fn test_relationship_thresholds() {
        let mut manager = DiplomacyManager::new("Rome", "Greece");
        assert_eq!(manager.relationship_from_opinion(), RelationshipLevel::Neutral);
        manager.set_modifier(DiplomaticModifiers::DeclarationOfFriendship, 35.0);
        assert_eq!(manager.relationship_from_opinion(), RelationshipLevel::Favorable);
        manager.set_modifier(DiplomaticModifiers::DeclarationOfFriendship, 80.0);
        assert_eq!(manager.relationship_from_opinion(), RelationshipLevel::Ally);
        manager.set_modifier(DiplomaticModifiers::DeclarationOfFriendship, -90.0);
        assert_eq!(manager.relationship_from_opinion(), RelationshipLevel::Unforgivable);

        manager.diplomatic_modifiers.clear();
        manager.diplomatic_status = DiplomaticStatus::War;
        assert_eq!(manager.relationship_from_opinion(), RelationshipLevel::Enemy);
    }

    #[test]
    fn test_influence_relationship() {
        let mut manager = DiplomacyManager::new("Monaco", "Rome");
        manager.influence = 65.0;
        assert_eq!(manager.relationship_from_influence(true), RelationshipLevel::Ally);
        assert_eq!(manager.relationship_from_influence(false), RelationshipLevel::Friend);
        manager.add_influence(-200.0);
        assert_eq!(manager.influence, MINIMUM_INFLUENCE);
        assert_eq!(manager.relationship_from_influence(false), RelationshipLevel::Unforgivable);
    }

    #[test]
    fn test_trades_end_and_resources_flow() {
        let mut manager = DiplomacyManager::new("Rome", "Greece");
        let mut trade = Trade::new();
        trade
            .our_offers
            .push(TradeOffer::with_duration("Silk", TradeOfferType::LuxuryResource, 1, 1));
        trade
            .their_offers
            .push(TradeOffer::with_duration(OPEN_BORDERS, TradeOfferType::Agreement, 1, 1));
        manager.trades.push(trade);
        manager.update_has_open_borders();
        assert!(manager.has_open_borders);
        assert_eq!(manager.resources_from_trade().get("Silk"), Some(&-1));

        let outcome = manager.next_turn();
        assert_eq!(outcome.ended_trades.len(), 1);
        assert!(manager.trades.is_empty());
        assert!(!manager.has_open_borders);
    }

    #[test]
    fn test_declared_war_flag_blocks_declaration() {
        let mut manager = DiplomacyManager::new("Rome", "Greece");
        assert!(manager.can_declare_war());
        manager.set_flag(DiplomacyFlags::DeclaredWar, 10);
        assert!(!manager.can_declare_war());
    }
}
