pub mod concurrency;
pub mod error;
pub mod hex_math;

pub use error::{Result, UncivError};
pub use hex_math::HexCoord;
