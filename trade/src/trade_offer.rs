use serde::{Deserialize, Serialize};

use crate::DEAL_DURATION;

/// Kinds of things that can change hands in a deal.
///
/// Declaration order matters: gold sorts before gold per turn, so a
/// descending sort handles gold per turn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeOfferType {
    Gold,
    GoldPerTurn,
    /// Peace treaties and research agreements.
    Treaty,
    /// Open borders.
    Agreement,
    LuxuryResource,
    StrategicResource,
    Technology,
    Introduction,
    WarDeclaration,
    City,
}

impl TradeOfferType {
    /// Immediate offers are transferred once on acceptance instead of for a duration.
    pub fn is_immediate(&self) -> bool {
        matches!(
            self,
            TradeOfferType::Gold
                | TradeOfferType::Technology
                | TradeOfferType::Introduction
                | TradeOfferType::WarDeclaration
                | TradeOfferType::City
        )
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, TradeOfferType::LuxuryResource | TradeOfferType::StrategicResource)
    }

    pub fn is_gold(&self) -> bool {
        matches!(self, TradeOfferType::Gold | TradeOfferType::GoldPerTurn)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeOffer {
    pub name: String,
    pub offer_type: TradeOfferType,
    pub amount: i32,
    /// Remaining turns, -1 for immediate offers.
    pub duration: i32,
}

impl TradeOffer {
    pub fn new(name: &str, offer_type: TradeOfferType, amount: i32) -> Self {
        let duration = if offer_type.is_immediate() { -1 } else { DEAL_DURATION };
        TradeOffer::with_duration(name, offer_type, amount, duration)
    }

    pub fn with_duration(name: &str, offer_type: TradeOfferType, amount: i32, duration: i32) -> Self {
        TradeOffer {
            name: name.to_string(),
            offer_type,
            amount,
            duration,
        }
    }

    /// Offers like gold per turn can go negative or zero and then cannot be traded.
    pub fn is_tradable(&self) -> bool {
        self.amount > 0
    }

    pub fn clone_with_amount(&self, amount: i32) -> Self {
        TradeOffer {
            amount,
            ..self.clone()
        }
    }

    pub fn is_same_kind(&self, other: &TradeOffer) -> bool {
        self.offer_type == other.offer_type && self.name == other.name
    }
}
