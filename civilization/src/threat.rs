use crate::civilization::Civilization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThreatLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

/// How dangerous `assessed` looks to `assessor`, judged by military force.
pub fn threat_assessment(assessor: &Civilization, assessed: &Civilization) -> ThreatLevel {
    let power_level_comparison = assessed.get_force() as f32 / assessor.get_force().max(1) as f32;
    if power_level_comparison > 2.0 {
        ThreatLevel::VeryHigh
    } else if power_level_comparison > 1.5 {
        ThreatLevel::High
    } else if power_level_comparison < 1.0 / 1.5 {
        ThreatLevel::Low
    } else if power_level_comparison < 0.5 {
        // Unreachable, ratios under 0.5 already matched Low
        ThreatLevel::VeryLow
    } else {
        ThreatLevel::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::civilization::CivKind;
    use crate::map_unit::MapUnit;
    use rules::{BaseUnit, UnitType};
    use util::HexCoord;

    fn civ_with_warriors(name: &str, count: u32) -> Civilization {
        let mut civ = Civilization::new(name, CivKind::Major);
        let warrior = BaseUnit {
            name: "Warrior".to_string(),
            unit_type: UnitType::Melee,
            strength: 8,
            cost: 40,
            movement: 2,
            ..Default::default()
        };
        for id in 0..count {
            civ.units.push(MapUnit::new(id, name, warrior.clone(), HexCoord::default()));
        }
        civ
    }

    #[test]
    fn test_threat_levels() {
        let us = civ_with_warriors("Rome", 2);
        assert_eq!(threat_assessment(&us, &civ_with_warriors("Greece", 5)), ThreatLevel::VeryHigh);
        assert_eq!(threat_assessment(&us, &civ_with_warriors("Greece", 2)), ThreatLevel::Medium);
        assert_eq!(threat_assessment(&us, &civ_with_warriors("Greece", 0)), ThreatLevel::Low);
    }
}
