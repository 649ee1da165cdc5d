use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationCategory {
    General,
    Trade,
    Diplomacy,
    Production,
    Units,
    War,
    Religion,
    Cities,
}

/// A fire-and-forget message for the player; the AI never reads these back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub category: NotificationCategory,
}

impl Notification {
    pub fn new(text: &str, category: NotificationCategory) -> Self {
        Notification {
            text: text.to_string(),
            category,
        }
    }
}
