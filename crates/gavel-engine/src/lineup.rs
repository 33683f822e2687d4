//! Lineup compliance checks.
//!
//! `validate` runs every check and collects all violations so a caller can
//! present the complete error list at once. An empty result means the
//! selection is compliant. Nothing here mutates state.

use std::collections::HashSet;

use gavel_common::{AuctionRules, Player, PlayerRole};
use serde::{Deserialize, Serialize};

/// A submitted lineup: the selected players plus the designated roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSelection {
    /// Selected player ids.
    pub players: Vec<String>,
    pub captain: String,
    pub vice_captain: String,
    pub wicket_keeper: String,
}

impl LineupSelection {
    pub fn contains(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }
}

/// One way a lineup can fail compliance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineupViolation {
    /// Selection is not exactly the configured lineup size.
    WrongSize { selected: usize, required: u32 },

    /// The same player appears more than once.
    DuplicateSelection { player_ids: Vec<String> },

    /// Selected players that are not in the team's squad.
    NotInSquad { player_ids: Vec<String> },

    /// Captain is not one of the selected players.
    CaptainNotSelected { player_id: String },

    /// Vice-captain is not one of the selected players.
    ViceCaptainNotSelected { player_id: String },

    /// Captain and vice-captain are the same player.
    CaptainIsViceCaptain { player_id: String },

    /// Wicket-keeper designate is not one of the selected players.
    KeeperNotSelected { player_id: String },

    /// Wicket-keeper designate does not have the wicket-keeper role.
    KeeperWrongRole { player_id: String, role: String },

    /// Too many foreign players in the selection.
    TooManyForeign { count: u32, max_allowed: u32 },
}

impl LineupViolation {
    /// Machine-readable code for wire errors.
    pub fn code(&self) -> &'static str {
        match self {
            LineupViolation::WrongSize { .. } => "WRONG_SIZE",
            LineupViolation::DuplicateSelection { .. } => "DUPLICATE",
            LineupViolation::NotInSquad { .. } => "NOT_IN_SQUAD",
            LineupViolation::CaptainNotSelected { .. } => "CAPTAIN_NOT_SELECTED",
            LineupViolation::ViceCaptainNotSelected { .. } => "VICE_CAPTAIN_NOT_SELECTED",
            LineupViolation::CaptainIsViceCaptain { .. } => "CAPTAIN_IS_VICE_CAPTAIN",
            LineupViolation::KeeperNotSelected { .. } => "KEEPER_NOT_SELECTED",
            LineupViolation::KeeperWrongRole { .. } => "KEEPER_WRONG_ROLE",
            LineupViolation::TooManyForeign { .. } => "TOO_MANY_FOREIGN",
        }
    }
}

impl std::fmt::Display for LineupViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineupViolation::WrongSize { selected, required } => {
                write!(f, "Lineup must have exactly {} players, got {}", required, selected)
            }
            LineupViolation::DuplicateSelection { player_ids } => {
                write!(f, "Players selected more than once: {}", player_ids.join(", "))
            }
            LineupViolation::NotInSquad { player_ids } => {
                write!(f, "Players not in squad: {}", player_ids.join(", "))
            }
            LineupViolation::CaptainNotSelected { player_id } => {
                write!(f, "Captain {} is not in the lineup", player_id)
            }
            LineupViolation::ViceCaptainNotSelected { player_id } => {
                write!(f, "Vice-captain {} is not in the lineup", player_id)
            }
            LineupViolation::CaptainIsViceCaptain { player_id } => {
                write!(f, "Captain and vice-captain are both {}", player_id)
            }
            LineupViolation::KeeperNotSelected { player_id } => {
                write!(f, "Wicket-keeper {} is not in the lineup", player_id)
            }
            LineupViolation::KeeperWrongRole { player_id, role } => {
                write!(f, "Wicket-keeper {} has role {}, not Wicket-Keeper", player_id, role)
            }
            LineupViolation::TooManyForeign { count, max_allowed } => {
                write!(f, "{} foreign players selected, maximum {}", count, max_allowed)
            }
        }
    }
}

/// Validates a lineup against the team's squad and the room rules.
///
/// Returns every violation found, never short-circuiting, in check order:
/// size, duplicates, squad membership, captain/vice-captain, keeper, foreign
/// count. An empty vec means compliant.
pub fn validate(
    selection: &LineupSelection,
    squad: &[&Player],
    rules: &AuctionRules,
) -> Vec<LineupViolation> {
    let mut violations = Vec::new();

    // 1. Exact lineup size.
    if selection.players.len() != rules.lineup_size as usize {
        violations.push(LineupViolation::WrongSize {
            selected: selection.players.len(),
            required: rules.lineup_size,
        });
    }

    // 2. No duplicates.
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for id in &selection.players {
        if !seen.insert(id.as_str()) && !duplicates.contains(id) {
            duplicates.push(id.clone());
        }
    }
    if !duplicates.is_empty() {
        violations.push(LineupViolation::DuplicateSelection {
            player_ids: duplicates,
        });
    }

    // 3. Every selected player is in the squad.
    let squad_ids: HashSet<&str> = squad.iter().map(|p| p.id.as_str()).collect();
    let missing: Vec<String> = selection
        .players
        .iter()
        .filter(|id| !squad_ids.contains(id.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        violations.push(LineupViolation::NotInSquad {
            player_ids: missing,
        });
    }

    // 4. Captain and vice-captain: distinct, both selected.
    if !selection.contains(&selection.captain) {
        violations.push(LineupViolation::CaptainNotSelected {
            player_id: selection.captain.clone(),
        });
    }
    if !selection.contains(&selection.vice_captain) {
        violations.push(LineupViolation::ViceCaptainNotSelected {
            player_id: selection.vice_captain.clone(),
        });
    }
    if selection.captain == selection.vice_captain {
        violations.push(LineupViolation::CaptainIsViceCaptain {
            player_id: selection.captain.clone(),
        });
    }

    // 5. Keeper designate: selected and role-matched.
    if !selection.contains(&selection.wicket_keeper) {
        violations.push(LineupViolation::KeeperNotSelected {
            player_id: selection.wicket_keeper.clone(),
        });
    }
    if let Some(keeper) = squad.iter().find(|p| p.id == selection.wicket_keeper) {
        if keeper.role != PlayerRole::WicketKeeper {
            violations.push(LineupViolation::KeeperWrongRole {
                player_id: keeper.id.clone(),
                role: keeper.role.to_string(),
            });
        }
    }

    // 6. Foreign-player cap, counted over selected players found in the squad.
    let foreign_count = squad
        .iter()
        .filter(|p| selection.contains(&p.id) && rules.is_foreign(&p.country))
        .count() as u32;
    if foreign_count > rules.max_foreign_players {
        violations.push(LineupViolation::TooManyForeign {
            count: foreign_count,
            max_allowed: rules.max_foreign_players,
        });
    }

    violations
}
