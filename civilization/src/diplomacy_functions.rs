//! Relation changes that touch both sides of an edge, and third parties.

use diplomacy::{DiplomacyFlags, DiplomacyManager, DiplomaticModifiers, DiplomaticStatus, RelationshipLevel};
use rules::UniqueType;
use tracing::{debug, info};

use crate::civilization::Civilization;
use crate::game_info::GameInfo;
use crate::notification::NotificationCategory;
use crate::popup_alert::{AlertType, PopupAlert};

const DECLARED_WAR_DURATION: i32 = 10;
const DECLARATION_OF_FRIENDSHIP_DURATION: i32 = 30;
const SETTLING_PROMISE_DURATION: i32 = 100;

/// Creates both relation edges if the civilizations have not met yet.
pub fn make_civilizations_meet(game: &mut GameInfo, civ_name: &str, other_civ_name: &str) {
    let Some((civ, other_civ)) = game.civ_pair_mut(civ_name, other_civ_name) else {
        return;
    };
    if civ.knows(other_civ_name) {
        return;
    }
    meet_one_side(civ, other_civ_name);
    meet_one_side(other_civ, civ_name);
    debug!(civ = %civ_name, other = %other_civ_name, "Civilizations met");
}

fn meet_one_side(civ: &mut Civilization, other_civ_name: &str) {
    civ.diplomacy.insert(
        other_civ_name.to_string(),
        DiplomacyManager::new(&civ.civ_name, other_civ_name),
    );
    civ.popup_alerts.push(PopupAlert::new(AlertType::FirstContact, other_civ_name));
    civ.add_notification(
        &format!("We have encountered [{}]!", other_civ_name),
        NotificationCategory::Diplomacy,
    );
}

/// Civilizations that know both parties, excluding the parties themselves.
fn common_known_civs(game: &GameInfo, civ_name: &str, other_civ_name: &str) -> Vec<String> {
    let Some(civ) = game.get_civilization(civ_name) else {
        return Vec::new();
    };
    civ.get_known_civ_names()
        .filter(|it| *it != other_civ_name)
        .filter(|it| {
            game.get_civilization(it)
                .is_some_and(|third| third.knows(other_civ_name))
        })
        .map(|it| it.to_string())
        .collect()
}

/// `civ_name` declares war on `target_name`.
pub fn declare_war(game: &mut GameInfo, civ_name: &str, target_name: &str) {
    let third_civs = common_known_civs(game, civ_name, target_name);
    let Some((civ, target)) = game.civ_pair_mut(civ_name, target_name) else {
        return;
    };
    let (Some(our_side), Some(their_side)) = (
        civ.diplomacy.get_mut(target_name),
        target.diplomacy.get_mut(civ_name),
    ) else {
        return;
    };

    let betrayed_friendship = their_side.has_flag(DiplomacyFlags::DeclarationOfFriendship);
    for side in [&mut *our_side, &mut *their_side] {
        side.diplomatic_status = DiplomaticStatus::War;
        side.trades.clear();
        side.has_open_borders = false;
        side.set_flag(DiplomacyFlags::DeclaredWar, DECLARED_WAR_DURATION);
        side.remove_flag(DiplomacyFlags::DeclarationOfFriendship);
        side.remove_flag(DiplomacyFlags::ResearchAgreement);
        side.remove_modifier(DiplomaticModifiers::DeclarationOfFriendship);
    }
    their_side.add_modifier(DiplomaticModifiers::DeclaredWarOnUs, -20.0);
    if betrayed_friendship {
        their_side.add_modifier(DiplomaticModifiers::BetrayedDeclarationOfFriendship, -10.0);
    }

    target.popup_alerts.push(PopupAlert::new(AlertType::WarDeclaration, civ_name));
    target.add_notification(
        &format!("[{}] has declared war on us!", civ_name),
        NotificationCategory::War,
    );
    civ.add_notification(
        &format!("We have declared war on [{}]!", target_name),
        NotificationCategory::War,
    );

    for third_civ_name in third_civs {
        let Some(third_civ) = game.get_civilization_mut(&third_civ_name) else {
            continue;
        };
        let shares_enemy = third_civ.is_at_war_with(target_name);
        if let Some(towards_aggressor) = third_civ.get_diplomacy_manager_mut(civ_name) {
            if shares_enemy {
                towards_aggressor.add_modifier(DiplomaticModifiers::SharedEnemy, 5.0);
            } else {
                towards_aggressor.add_modifier(DiplomaticModifiers::WarMongerer, -5.0);
            }
        }
        third_civ.add_notification(
            &format!("[{}] has declared war on [{}]!", civ_name, target_name),
            NotificationCategory::War,
        );
    }
    info!(civ = %civ_name, target = %target_name, "War declared");
}

/// Ends the war on both sides.
pub fn make_peace(game: &mut GameInfo, civ_name: &str, other_civ_name: &str) {
    let third_civs = common_known_civs(game, civ_name, other_civ_name);
    let Some((civ, other_civ)) = game.civ_pair_mut(civ_name, other_civ_name) else {
        return;
    };
    for (side, other) in [(civ, other_civ_name), (other_civ, civ_name)] {
        if let Some(manager) = side.get_diplomacy_manager_mut(other) {
            manager.diplomatic_status = DiplomaticStatus::Peace;
        }
    }
    for third_civ_name in third_civs {
        if let Some(third_civ) = game.get_civilization_mut(&third_civ_name) {
            third_civ.add_notification(
                &format!("[{}] and [{}] have signed a Peace Treaty!", civ_name, other_civ_name),
                NotificationCategory::Diplomacy,
            );
        }
    }
    info!(civ = %civ_name, other = %other_civ_name, "Peace signed");
}

pub fn sign_declaration_of_friendship(game: &mut GameInfo, civ_name: &str, other_civ_name: &str) {
    let Some((civ, other_civ)) = game.civ_pair_mut(civ_name, other_civ_name) else {
        return;
    };
    for (side, other) in [(&mut *civ, other_civ_name), (&mut *other_civ, civ_name)] {
        if let Some(manager) = side.get_diplomacy_manager_mut(other) {
            manager.set_modifier(DiplomaticModifiers::DeclarationOfFriendship, 35.0);
            manager.set_flag(DiplomacyFlags::DeclarationOfFriendship, DECLARATION_OF_FRIENDSHIP_DURATION);
        }
    }
    debug!(civ = %civ_name, other = %other_civ_name, "Declaration of friendship signed");
}

/// `civ_name` accepts `demander_name`'s demand to stop settling near them.
pub fn agree_not_to_settle_near(game: &mut GameInfo, civ_name: &str, demander_name: &str) {
    let Some((civ, demander)) = game.civ_pair_mut(civ_name, demander_name) else {
        return;
    };
    if let Some(manager) = civ.get_diplomacy_manager_mut(demander_name) {
        manager.add_modifier(DiplomaticModifiers::UnacceptableDemands, -10.0);
    }
    if let Some(manager) = demander.get_diplomacy_manager_mut(civ_name) {
        manager.set_flag(DiplomacyFlags::AgreedToNotSettleNearUs, SETTLING_PROMISE_DURATION);
    }
    demander.add_notification(
        &format!("[{}] agreed to stop settling cities near us!", civ_name),
        NotificationCategory::Diplomacy,
    );
}

/// `civ_name` refuses `demander_name`'s demand to stop settling near them.
pub fn refuse_demand_not_to_settle_near(game: &mut GameInfo, civ_name: &str, demander_name: &str) {
    let Some((civ, demander)) = game.civ_pair_mut(civ_name, demander_name) else {
        return;
    };
    if let Some(manager) = civ.get_diplomacy_manager_mut(demander_name) {
        manager.add_modifier(DiplomaticModifiers::UnacceptableDemands, -20.0);
    }
    if let Some(manager) = demander.get_diplomacy_manager_mut(civ_name) {
        manager.set_flag(DiplomacyFlags::IgnoreThemSettlingNearUs, SETTLING_PROMISE_DURATION);
        manager.add_modifier(DiplomaticModifiers::RefusedToNotSettleCitiesNearUs, -15.0);
    }
    demander.add_notification(
        &format!("[{}] refused to stop settling cities near us!", civ_name),
        NotificationCategory::Diplomacy,
    );
}

/// Whether units of `civ` may enter tiles owned by `owner_name`.
pub fn can_pass_through_tiles(game: &GameInfo, civ: &Civilization, owner_name: &str) -> bool {
    if owner_name == civ.civ_name {
        return true;
    }
    let Some(owner) = game.get_civilization(owner_name) else {
        return true;
    };
    if owner.is_barbarian() {
        return true;
    }
    if owner.is_city_state() && owner.get_relationship_level(&civ.civ_name) >= RelationshipLevel::Friend {
        return true;
    }
    civ.get_diplomacy_manager(owner_name)
        .is_some_and(|it| it.has_open_borders || it.is_at_war())
}

/// Gold each side pays for a research agreement.
pub fn research_agreement_cost(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> i32 {
    let era = civ.tech.era(&game.ruleset).max(other_civ.tech.era(&game.ruleset));
    100 * (era + 1)
}

pub fn can_sign_research_agreement(game: &GameInfo, civ: &Civilization) -> bool {
    civ.is_major_civ()
        && civ.has_unique(&game.ruleset, UniqueType::EnablesResearchAgreements)
        && !civ.tech.all_techs_are_researched(&game.ruleset)
}

pub fn can_sign_research_agreements_with(game: &GameInfo, civ: &Civilization, other_civ: &Civilization) -> bool {
    let (Some(our_side), Some(their_side)) = (
        civ.get_diplomacy_manager(&other_civ.civ_name),
        other_civ.get_diplomacy_manager(&civ.civ_name),
    ) else {
        return false;
    };
    let cost = research_agreement_cost(game, civ, other_civ);
    can_sign_research_agreement(game, civ)
        && can_sign_research_agreement(game, other_civ)
        && our_side.has_flag(DiplomacyFlags::DeclarationOfFriendship)
        && !our_side.has_flag(DiplomacyFlags::ResearchAgreement)
        && !their_side.has_flag(DiplomacyFlags::ResearchAgreement)
        && civ.gold >= cost
        && other_civ.gold >= cost
}
