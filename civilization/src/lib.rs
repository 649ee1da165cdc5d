pub mod city_state_functions;
pub mod civilization;
pub mod construction_context;
pub mod diplomacy_functions;
pub mod game_info;
pub mod managers;
pub mod map_unit;
pub mod notification;
pub mod player_type;
pub mod popup_alert;
pub mod threat;
pub mod trade;
pub mod turn;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use civilization::{CityStateType, CivFlags, CivKind, Civilization};
pub use construction_context::CityBuildContext;
pub use game_info::GameInfo;
pub use map_unit::MapUnit;
pub use notification::{Notification, NotificationCategory};
pub use player_type::PlayerType;
pub use popup_alert::{AlertType, PopupAlert};
pub use threat::{threat_assessment, ThreatLevel};
