mod config;

use std::path::PathBuf;

use anyhow::Context;
use automation::run_turns;
use clap::Parser;
use civilization::GameInfo;
use rules::Ruleset;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ScenarioConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Runs AI-only Unciv games and reports the outcome", long_about = None)]
struct Args {
    /// Scenario file in JSON; the builtin four-civ scenario otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ruleset file in JSON, overriding the scenario's
    #[arg(short, long)]
    ruleset: Option<PathBuf>,

    #[arg(short, long)]
    turns: Option<u32>,

    #[arg(short, long)]
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct CivSummary {
    name: String,
    gold: i32,
    cities: usize,
    units: usize,
    techs: usize,
    policies: usize,
    religion: Option<String>,
    at_war_with: Vec<String>,
}

fn summarize(game: &GameInfo) -> Vec<CivSummary> {
    game.civilizations
        .iter()
        .filter(|it| !it.is_barbarian())
        .map(|civ| CivSummary {
            name: civ.civ_name.clone(),
            gold: civ.gold,
            cities: civ.cities.len(),
            units: civ.units.len(),
            techs: civ.tech.techs_researched.len(),
            policies: civ.policies.adopted_policies.len(),
            religion: civ.religion_manager.religion.clone(),
            at_war_with: civ
                .diplomacy
                .keys()
                .filter(|it| civ.is_at_war_with(it))
                .cloned()
                .collect(),
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::from_file(path)?,
        None => ScenarioConfig::default(),
    };
    if let Some(turns) = args.turns {
        scenario.turns = turns;
    }
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    let ruleset = match args.ruleset.as_ref().or(scenario.ruleset.as_ref()) {
        Some(path) => Ruleset::from_file(path).with_context(|| format!("loading ruleset {}", path.display()))?,
        None => Ruleset::builtin().context("loading the builtin ruleset")?,
    };

    let mut game = scenario.build_game(ruleset)?;
    info!(seed = scenario.seed, turns = scenario.turns, "Starting simulation");
    run_turns(&mut game, scenario.turns);

    println!("{}", serde_json::to_string_pretty(&summarize(&game))?);
    Ok(())
}
