pub mod trade;
pub mod trade_offer;
pub mod trade_request;

pub use trade::Trade;
pub use trade_offer::{TradeOffer, TradeOfferType};
pub use trade_request::TradeRequest;

pub const PEACE_TREATY: &str = "Peace Treaty";
pub const RESEARCH_AGREEMENT: &str = "Research Agreement";
pub const OPEN_BORDERS: &str = "Open Borders";
pub const GOLD: &str = "Gold";
pub const GOLD_PER_TURN: &str = "Gold per turn";

/// Turns a non-immediate deal lasts on standard speed.
pub const DEAL_DURATION: i32 = 30;
/// Turns a peace treaty prevents a new declaration of war.
pub const PEACE_DURATION: i32 = 10;
