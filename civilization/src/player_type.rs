use serde::{Deserialize, Serialize};

/// Represents the type of player in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerType {
    /// AI-controlled player
    #[default]
    AI,
    /// Human-controlled player
    Human,
}

impl PlayerType {
    pub fn is_ai(&self) -> bool {
        *self == PlayerType::AI
    }
}
