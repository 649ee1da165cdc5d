pub mod trade_evaluation;
pub mod trade_logic;

pub use trade_logic::{accept_trade, get_available_offers, TradeLogic};
