use serde::{Deserialize, Serialize};

/// Represents the type of popup alert in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// A war has been declared on us
    WarDeclaration,
    /// First contact with another civilization
    FirstContact,
    /// A city we received in a trade can be liberated
    CityTraded,
    /// Our units are inside a city-state's borders
    BorderConflict,
    /// Demand to stop settling cities near another civilization
    DemandToStopSettlingCitiesNear,
    /// City settled near another civilization despite our promise
    CitySettledNearOtherCivDespiteOurPromise,
    /// Another civilization offers a declaration of friendship
    DeclarationOfFriendship,
    /// A city-state under our protection was bullied
    BulliedProtectedMinor,
}

/// Represents a popup alert in the game
///
/// AI civilizations answer the ones that need a decision and drop the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupAlert {
    /// The type of alert
    pub alert_type: AlertType,
    /// Usually the name of the civilization the alert is about
    pub value: String,
}

impl PopupAlert {
    /// Creates a new popup alert with the specified type and value
    pub fn new(alert_type: AlertType, value: &str) -> Self {
        Self {
            alert_type,
            value: value.to_string(),
        }
    }
}
