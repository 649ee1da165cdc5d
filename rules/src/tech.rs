use serde::{Deserialize, Serialize};

use crate::unique::{HasUniques, Unique};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Technology {
    pub name: String,
    pub cost: i32,
    /// Index of the era this technology belongs to.
    pub era: i32,
    pub prerequisites: Vec<String>,
    pub uniques: Vec<Unique>,
}

impl HasUniques for Technology {
    fn uniques(&self) -> &[Unique] {
        &self.uniques
    }
}
