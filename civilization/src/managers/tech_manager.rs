use std::collections::{BTreeMap, BTreeSet};

use rules::{Ruleset, Technology};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Manages the technologies of a civilization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechManager {
    /// Technologies that have been researched
    pub techs_researched: BTreeSet<String>,

    /// Research queue; the head receives science each turn
    pub techs_to_research: Vec<String>,

    /// Science invested in technologies not finished yet
    pub techs_in_progress: BTreeMap<String, i32>,
}

impl TechManager {
    /// Creates a new TechManager
    pub fn new() -> Self {
        TechManager::default()
    }

    pub fn is_researched(&self, tech_name: &str) -> bool {
        self.techs_researched.contains(tech_name)
    }

    /// Not researched yet and every prerequisite is known.
    pub fn can_be_researched(&self, tech: &Technology) -> bool {
        !self.is_researched(&tech.name) && tech.prerequisites.iter().all(|it| self.is_researched(it))
    }

    pub fn researchable_techs<'a>(&'a self, ruleset: &'a Ruleset) -> impl Iterator<Item = &'a Technology> + 'a {
        ruleset.technologies.iter().filter(move |it| self.can_be_researched(it))
    }

    pub fn all_techs_are_researched(&self, ruleset: &Ruleset) -> bool {
        ruleset.technologies.iter().all(|it| self.is_researched(&it.name))
    }

    /// Fraction of the tech tree already known, between 0 and 1.
    pub fn researched_techs_percent(&self, ruleset: &Ruleset) -> f32 {
        if ruleset.technologies.is_empty() {
            return 0.0;
        }
        self.techs_researched.len() as f32 / ruleset.technologies.len() as f32
    }

    /// The highest era among researched technologies.
    pub fn era(&self, ruleset: &Ruleset) -> i32 {
        ruleset
            .technologies
            .iter()
            .filter(|it| self.is_researched(&it.name))
            .map(|it| it.era)
            .max()
            .unwrap_or(0)
    }

    pub fn current_technology(&self) -> Option<&str> {
        self.techs_to_research.first().map(|it| it.as_str())
    }

    pub fn add_technology(&mut self, tech_name: &str) {
        self.techs_in_progress.remove(tech_name);
        self.techs_to_research.retain(|it| it != tech_name);
        self.techs_researched.insert(tech_name.to_string());
    }

    /// Invests science into the current technology.
    ///
    /// Returns the names of technologies completed by this investment.
    pub fn add_science(&mut self, science: i32, ruleset: &Ruleset) -> Vec<String> {
        let mut completed = Vec::new();
        let mut remaining = science;
        while remaining > 0 {
            let Some(tech) = self
                .current_technology()
                .and_then(|name| ruleset.get_technology(name))
            else {
                break;
            };
            let invested = self.techs_in_progress.get(&tech.name).copied().unwrap_or(0) + remaining;
            if invested < tech.cost {
                self.techs_in_progress.insert(tech.name.clone(), invested);
                break;
            }
            remaining = invested - tech.cost;
            let name = tech.name.clone();
            self.add_technology(&name);
            debug!(tech = %name, "Technology researched");
            completed.push(name);
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerequisites_gate_research() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut tech_manager = TechManager::new();
        let currency = ruleset.get_technology("Currency").unwrap();
        assert!(!tech_manager.can_be_researched(currency));
        for prerequisite in &currency.prerequisites {
            tech_manager.add_technology(prerequisite);
        }
        assert!(tech_manager.can_be_researched(currency));
    }

    #[test]
    fn test_science_overflows_into_next_tech() {
        let ruleset = Ruleset::builtin().unwrap();
        let mut tech_manager = TechManager::new();
        tech_manager.techs_to_research = vec!["Agriculture".to_string(), "Pottery".to_string()];
        let agriculture_cost = ruleset.get_technology("Agriculture").unwrap().cost;
        let completed = tech_manager.add_science(agriculture_cost + 5, &ruleset);
        assert_eq!(completed, vec!["Agriculture".to_string()]);
        assert_eq!(tech_manager.techs_in_progress.get("Pottery"), Some(&5));
        assert!(tech_manager.researched_techs_percent(&ruleset) > 0.0);
    }
}
