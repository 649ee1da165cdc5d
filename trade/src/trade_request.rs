use serde::{Deserialize, Serialize};

use crate::trade::Trade;

/// A deal proposed by `requesting_civ`, stored in the receiver's queue.
///
/// `trade` is written from the receiver's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub requesting_civ: String,
    pub trade: Trade,
}

impl TradeRequest {
    pub fn new(requesting_civ: &str, trade: Trade) -> Self {
        TradeRequest {
            requesting_civ: requesting_civ.to_string(),
            trade,
        }
    }
}
