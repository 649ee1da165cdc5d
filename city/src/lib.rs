pub mod city;
pub mod city_constructions;
pub mod city_focus;
pub mod city_stats;

pub use city::City;
pub use city_constructions::CityConstructions;
pub use city_focus::CityFocus;
