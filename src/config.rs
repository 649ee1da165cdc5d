use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use civilization::diplomacy_functions::make_civilizations_meet;
use civilization::{CityStateType, CivKind, Civilization, GameInfo, PlayerType};
use map::{Terrain, TileMap};
use rules::{Ruleset, VictoryFocus};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use util::HexCoord;

/// One civilization taking part in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CivConfig {
    pub name: String,
    pub kind: CivKind,
    pub player_type: PlayerType,
    pub victory_focus: VictoryFocus,
    /// Where the capital is founded; barbarians found none
    pub capital: Option<HexCoord>,
    pub gold: i32,
    /// Units placed on the capital tile at start
    pub units: Vec<String>,
}

impl Default for CivConfig {
    fn default() -> Self {
        CivConfig {
            name: String::new(),
            kind: CivKind::Major,
            player_type: PlayerType::AI,
            victory_focus: VictoryFocus::Neutral,
            capital: None,
            gold: 0,
            units: Vec::new(),
        }
    }
}

/// A whole simulated game: map, seed and the civilizations in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub turns: u32,
    pub map_radius: i32,
    pub religion_enabled: bool,
    /// Falls back to the builtin ruleset
    pub ruleset: Option<PathBuf>,
    pub civilizations: Vec<CivConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let major = |name: &str, focus: VictoryFocus, capital: HexCoord| CivConfig {
            name: name.to_string(),
            victory_focus: focus,
            capital: Some(capital),
            gold: 100,
            units: vec!["Warrior".to_string(), "Worker".to_string()],
            ..CivConfig::default()
        };
        ScenarioConfig {
            seed: 42,
            turns: 50,
            map_radius: 12,
            religion_enabled: true,
            ruleset: None,
            civilizations: vec![
                major("Rome", VictoryFocus::Military, HexCoord::new(-7, 0)),
                major("Greece", VictoryFocus::Culture, HexCoord::new(7, 0)),
                CivConfig {
                    name: "Sidon".to_string(),
                    kind: CivKind::CityState(CityStateType::Mercantile),
                    capital: Some(HexCoord::new(0, 7)),
                    units: vec!["Warrior".to_string()],
                    ..CivConfig::default()
                },
                CivConfig {
                    name: "Barbarians".to_string(),
                    kind: CivKind::Barbarian,
                    ..CivConfig::default()
                },
            ],
        }
    }
}

impl ScenarioConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: ScenarioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.map_radius < 1 {
            bail!("map radius must be positive, got {}", self.map_radius);
        }
        for (index, civ) in self.civilizations.iter().enumerate() {
            if civ.name.is_empty() {
                bail!("civilization #{} has no name", index);
            }
            if self.civilizations[..index].iter().any(|it| it.name == civ.name) {
                bail!("civilization {} is listed twice", civ.name);
            }
        }
        Ok(())
    }

    /// Sets up the starting position: civs meet, capitals are founded and
    /// starting units placed.
    pub fn build_game(&self, ruleset: Ruleset) -> anyhow::Result<GameInfo> {
        let mut game = GameInfo::new(ruleset, TileMap::hexagon(self.map_radius, Terrain::Grassland), self.seed);
        game.religion_enabled = self.religion_enabled;
        for civ_config in &self.civilizations {
            let mut civ = Civilization::new(&civ_config.name, civ_config.kind);
            civ.player_type = civ_config.player_type;
            civ.victory_focus = civ_config.victory_focus;
            civ.gold = civ_config.gold;
            game.civilizations.push(civ);
        }

        let names: Vec<String> = self
            .civilizations
            .iter()
            .filter(|it| it.kind != CivKind::Barbarian)
            .map(|it| it.name.clone())
            .collect();
        for (index, civ_name) in names.iter().enumerate() {
            for other_civ_name in &names[index + 1..] {
                make_civilizations_meet(&mut game, civ_name, other_civ_name);
            }
        }

        for civ_config in &self.civilizations {
            let Some(capital) = civ_config.capital else {
                continue;
            };
            if game.found_city(&civ_config.name, capital).is_none() {
                bail!("{} cannot found its capital at {:?}", civ_config.name, capital);
            }
            for unit_name in &civ_config.units {
                if game.place_unit(&civ_config.name, unit_name, capital).is_none() {
                    warn!(civ = %civ_config.name, unit = %unit_name, "Starting unit could not be placed");
                }
            }
            debug!(civ = %civ_config.name, "Capital founded");
        }
        Ok(game)
    }
}
