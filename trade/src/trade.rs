use serde::{Deserialize, Serialize};

use crate::trade_offer::{TradeOffer, TradeOfferType};
use crate::{PEACE_TREATY, RESEARCH_AGREEMENT};

/// A deal seen from one side: what we give and what we get.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub our_offers: Vec<TradeOffer>,
    pub their_offers: Vec<TradeOffer>,
}

impl Trade {
    pub fn new() -> Self {
        Trade::default()
    }

    /// The same deal from the other side.
    pub fn reverse(&self) -> Trade {
        Trade {
            our_offers: self.their_offers.clone(),
            their_offers: self.our_offers.clone(),
        }
    }

    pub fn set(&mut self, trade: &Trade) {
        self.our_offers = trade.our_offers.clone();
        self.their_offers = trade.their_offers.clone();
    }

    pub fn is_peace_treaty(&self) -> bool {
        self.our_offers
            .iter()
            .any(|it| it.offer_type == TradeOfferType::Treaty && it.name == PEACE_TREATY)
    }

    pub fn is_research_agreement(&self) -> bool {
        self.our_offers
            .iter()
            .chain(self.their_offers.iter())
            .any(|it| it.offer_type == TradeOfferType::Treaty && it.name == RESEARCH_AGREEMENT)
    }

    /// True when every offer on both sides is a luxury resource.
    pub fn is_luxury_exchange(&self) -> bool {
        !self.our_offers.is_empty()
            && !self.their_offers.is_empty()
            && self
                .our_offers
                .iter()
                .chain(self.their_offers.iter())
                .all(|it| it.offer_type == TradeOfferType::LuxuryResource)
    }

    /// Same offers on each side, ignoring order.
    pub fn equal_trade(&self, other: &Trade) -> bool {
        fn same_offers(a: &[TradeOffer], b: &[TradeOffer]) -> bool {
            a.len() == b.len() && a.iter().all(|offer| b.contains(offer)) && b.iter().all(|offer| a.contains(offer))
        }
        same_offers(&self.our_offers, &other.our_offers) && same_offers(&self.their_offers, &other.their_offers)
    }

    /// True once every timed offer has run out.
    pub fn has_expired(&self) -> bool {
        self.our_offers
            .iter()
            .chain(self.their_offers.iter())
            .filter(|it| !it.offer_type.is_immediate())
            .all(|it| it.duration <= 0)
    }
}
