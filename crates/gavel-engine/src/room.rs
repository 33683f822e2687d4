//! The room aggregate: one auction's full state and its state machine.
//!
//! `AuctionRoom` is the single mutation authority for a room. Every public
//! operation validates against the live aggregate, applies its whole effect
//! (ledger + player + offer pointer) in one call, and returns exactly one
//! canonical delta. Nothing here suspends; the serialization domain around
//! the aggregate lives in the server crate.

use std::str::FromStr;

use gavel_common::{AuctionRules, CareerStats, Player, PlayerRole, PlayerStatus, RoomStatus};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::episode::{BidEpisode, BidRejection};
use crate::events::{CurrentOffer, RoomDelta, RoomSnapshot, TeamView};
use crate::ledger::{Ledger, LedgerError};
use crate::lineup::{self, LineupSelection, LineupViolation};

/// One pre-parsed row from the roster loader.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerImportRow {
    pub name: String,
    /// Raw role tag, normalized case-insensitively during import.
    pub role: String,
    pub country: String,
    pub base_price: Decimal,
    pub stats: CareerStats,
}

/// Errors from room operations. No variant leaves the aggregate changed,
/// except that a failed `finalize_sale` keeps the live episode open.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    #[error("Unknown player: {player_id}")]
    UnknownPlayer { player_id: String },

    #[error("No team joined for user {user_id}")]
    UnknownTeam { user_id: String },

    #[error("Room is completed; no further changes are accepted")]
    RoomCompleted,

    #[error("Room is paused; bids and offers are not accepted")]
    RoomPaused,

    #[error("User {user_id} is not the auctioneer of this room")]
    NotAuctioneer { user_id: String },

    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: RoomStatus, to: RoomStatus },

    #[error("Player {player_id} is already on the block")]
    OfferInProgress { player_id: String },

    #[error("No player is currently on the block")]
    NoLiveOffer,

    #[error("Player {offered} is on the block, not {requested}")]
    WrongPlayerOffered { offered: String, requested: String },

    #[error("Player {player_id} is already sold")]
    PlayerAlreadySold { player_id: String },

    #[error("Player {player_id} is not sold")]
    PlayerNotSold { player_id: String },

    #[error("Squad is full: maximum {max} players")]
    SquadFull { max: u32 },

    #[error("Players can only be imported while the room is waiting (status: {status})")]
    ImportNotAllowed { status: RoomStatus },

    #[error("Import rejected: {}", .problems.join("; "))]
    InvalidImport { problems: Vec<String> },

    #[error("Sale price {offered} is below the floor price {floor}")]
    SaleBelowFloor { offered: Decimal, floor: Decimal },

    #[error(transparent)]
    Bid(#[from] BidRejection),

    #[error(transparent)]
    Funds(#[from] LedgerError),

    #[error("Lineup rejected with {} violation(s)", .violations.len())]
    LineupRejected { violations: Vec<LineupViolation> },
}

impl RoomError {
    /// Machine-readable code for wire errors.
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::UnknownPlayer { .. } => "UNKNOWN_PLAYER",
            RoomError::UnknownTeam { .. } => "UNKNOWN_TEAM",
            RoomError::RoomCompleted => "ROOM_COMPLETED",
            RoomError::RoomPaused => "ROOM_PAUSED",
            RoomError::NotAuctioneer { .. } => "NOT_AUCTIONEER",
            RoomError::InvalidTransition { .. } => "INVALID_TRANSITION",
            RoomError::OfferInProgress { .. } => "OFFER_IN_PROGRESS",
            RoomError::NoLiveOffer => "NO_LIVE_OFFER",
            RoomError::WrongPlayerOffered { .. } => "WRONG_PLAYER",
            RoomError::PlayerAlreadySold { .. } => "ALREADY_SOLD",
            RoomError::PlayerNotSold { .. } => "NOT_SOLD",
            RoomError::SquadFull { .. } => "SQUAD_FULL",
            RoomError::ImportNotAllowed { .. } => "IMPORT_NOT_ALLOWED",
            RoomError::InvalidImport { .. } => "INVALID_IMPORT",
            RoomError::SaleBelowFloor { .. } => "BELOW_FLOOR",
            RoomError::Bid(rejection) => rejection.code(),
            RoomError::Funds(err) => err.code(),
            RoomError::LineupRejected { .. } => "LINEUP_REJECTED",
        }
    }

    /// True for errors that indicate a replay or programming defect rather
    /// than a normal business rejection. These are logged at a higher level.
    pub fn is_defect(&self) -> bool {
        matches!(self, RoomError::PlayerAlreadySold { .. })
    }
}

/// One bidding team inside a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    user_id: String,
    team_name: String,
    ledger: Ledger,
    lineup: Option<LineupSelection>,
}

impl Team {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn lineup(&self) -> Option<&LineupSelection> {
        self.lineup.as_ref()
    }
}

/// A team's durable state, as read back from the store.
#[derive(Debug, Clone)]
pub struct RestoredTeam {
    pub user_id: String,
    pub team_name: String,
    /// Owned player ids in acquisition order.
    pub players: Vec<String>,
    pub lineup: Option<LineupSelection>,
}

/// Durable state needed to rebuild a room after a restart.
#[derive(Debug, Clone)]
pub struct RestoredRoom {
    pub code: String,
    pub name: String,
    pub auctioneer: String,
    pub status: RoomStatus,
    pub rules: AuctionRules,
    pub players: Vec<Player>,
    pub teams: Vec<RestoredTeam>,
    /// Player that was on the block when the state was written.
    pub current_player: Option<String>,
}

/// One auction room's aggregate state.
#[derive(Debug, Clone)]
pub struct AuctionRoom {
    code: String,
    name: String,
    auctioneer: String,
    status: RoomStatus,
    rules: AuctionRules,
    /// Player pool in import order.
    players: Vec<Player>,
    teams: Vec<Team>,
    /// The live bidding episode, if a player is on the block.
    current: Option<BidEpisode>,
}

impl AuctionRoom {
    /// Creates a room in `waiting` with an empty pool and no teams.
    pub fn new(code: &str, name: &str, auctioneer: &str, rules: AuctionRules) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            auctioneer: auctioneer.to_string(),
            status: RoomStatus::Waiting,
            rules,
            players: Vec::new(),
            teams: Vec::new(),
            current: None,
        }
    }

    /// Rebuilds a room from durable state.
    ///
    /// Ledgers are replayed from each team's acquisitions so the purse
    /// arithmetic is re-checked rather than trusted. A recorded live offer
    /// is reopened at the player's floor price; standing bids are not
    /// durable. A stored lineup that no longer passes compliance is dropped
    /// instead of carried into a state `update_lineup` could never produce.
    pub fn restore(state: RestoredRoom) -> Result<Self, RoomError> {
        let mut teams = Vec::with_capacity(state.teams.len());
        for team in state.teams {
            let mut ledger = Ledger::new(state.rules.total_purse);
            for player_id in &team.players {
                let player = state
                    .players
                    .iter()
                    .find(|p| p.id == *player_id)
                    .ok_or_else(|| RoomError::UnknownPlayer {
                        player_id: player_id.clone(),
                    })?;
                let price = match (player.sold_to.as_deref(), player.sold_price) {
                    (Some(owner), Some(price)) if owner == team.user_id => price,
                    _ => {
                        return Err(RoomError::PlayerNotSold {
                            player_id: player_id.clone(),
                        })
                    }
                };
                ledger.acquire(player_id, price)?;
            }
            teams.push(Team {
                user_id: team.user_id,
                team_name: team.team_name,
                ledger,
                lineup: team.lineup,
            });
        }

        for team in &mut teams {
            if let Some(selection) = &team.lineup {
                let squad: Vec<&Player> = state
                    .players
                    .iter()
                    .filter(|p| team.ledger.owns(&p.id))
                    .collect();
                if !lineup::validate(selection, &squad, &state.rules).is_empty() {
                    warn!(
                        room = %state.code,
                        user = %team.user_id,
                        "Dropping stored lineup that fails compliance"
                    );
                    team.lineup = None;
                }
            }
        }

        let current = match &state.current_player {
            Some(player_id) => {
                if state.status == RoomStatus::Completed {
                    return Err(RoomError::OfferInProgress {
                        player_id: player_id.clone(),
                    });
                }
                let player = state
                    .players
                    .iter()
                    .find(|p| p.id == *player_id)
                    .ok_or_else(|| RoomError::UnknownPlayer {
                        player_id: player_id.clone(),
                    })?;
                if player.is_sold() {
                    return Err(RoomError::PlayerAlreadySold {
                        player_id: player_id.clone(),
                    });
                }
                Some(BidEpisode::open(player_id, player.base_price))
            }
            None => None,
        };

        Ok(Self {
            code: state.code,
            name: state.name,
            auctioneer: state.auctioneer,
            status: state.status,
            rules: state.rules,
            players: state.players,
            teams,
            current,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn rules(&self) -> &AuctionRules {
        &self.rules
    }

    pub fn auctioneer(&self) -> &str {
        &self.auctioneer
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// The live episode, if any. At most one per room.
    pub fn current_episode(&self) -> Option<&BidEpisode> {
        self.current.as_ref()
    }

    /// Full state at this instant.
    pub fn snapshot(&self) -> RoomSnapshot {
        let current = self.current.as_ref().and_then(|ep| {
            self.find_player(ep.player_id()).map(|player| CurrentOffer {
                player: player.clone(),
                standing_bid: ep.standing_bid(),
                leader: ep.leader().map(str::to_string),
            })
        });

        RoomSnapshot {
            room_code: self.code.clone(),
            name: self.name.clone(),
            auctioneer: self.auctioneer.clone(),
            status: self.status,
            rules: self.rules.clone(),
            players: self.players.clone(),
            teams: self.team_views(),
            current,
        }
    }

    /// Joins (or re-joins) a team for an authenticated bidder.
    ///
    /// The first join creates the team with a full purse; re-joining after a
    /// disconnect never resets the ledger.
    pub fn join_team(&mut self, user_id: &str, team_name: &str) -> Result<RoomDelta, RoomError> {
        if self.status == RoomStatus::Completed {
            return Err(RoomError::RoomCompleted);
        }

        let (team_name, rejoined) =
            if let Some(team) = self.teams.iter_mut().find(|t| t.user_id == user_id) {
                if !team_name.is_empty() {
                    team.team_name = team_name.to_string();
                }
                (team.team_name.clone(), true)
            } else {
                self.teams.push(Team {
                    user_id: user_id.to_string(),
                    team_name: team_name.to_string(),
                    ledger: Ledger::new(self.rules.total_purse),
                    lineup: None,
                });
                (team_name.to_string(), false)
            };

        Ok(RoomDelta::TeamJoined {
            user_id: user_id.to_string(),
            team_name,
            rejoined,
            teams: self.team_views(),
        })
    }

    /// Replaces the player pool with an ordered batch from the roster loader.
    ///
    /// Allowed only while the room is `waiting`. The whole batch is rejected
    /// if any row has an empty name, unknown role, empty country, or negative
    /// base price; the error names the offending rows. Import order becomes
    /// the immutable iteration order.
    pub fn import_players(
        &mut self,
        caller: &str,
        rows: Vec<PlayerImportRow>,
    ) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::ImportNotAllowed {
                status: self.status,
            });
        }

        let mut problems = Vec::new();
        let mut parsed: Vec<(PlayerImportRow, PlayerRole)> = Vec::with_capacity(rows.len());
        for (idx, row) in rows.into_iter().enumerate() {
            let row_no = idx + 1;
            if row.name.trim().is_empty() {
                problems.push(format!("row {}: missing name", row_no));
            }
            if row.country.trim().is_empty() {
                problems.push(format!("row {}: missing country", row_no));
            }
            if row.base_price < Decimal::ZERO {
                problems.push(format!(
                    "row {}: negative base price {}",
                    row_no, row.base_price
                ));
            }
            match PlayerRole::from_str(&row.role) {
                Ok(role) => parsed.push((row, role)),
                Err(_) => problems.push(format!("row {}: unknown role '{}'", row_no, row.role)),
            }
        }
        if !problems.is_empty() {
            return Err(RoomError::InvalidImport { problems });
        }

        // Replace any previously imported pool.
        self.players = parsed
            .into_iter()
            .enumerate()
            .map(|(idx, (row, role))| Player {
                id: Uuid::new_v4().to_string(),
                name: row.name.trim().to_string(),
                role,
                country: row.country.trim().to_string(),
                base_price: row.base_price,
                stats: row.stats,
                status: PlayerStatus::Unsold,
                sold_price: None,
                sold_to: None,
                order: idx as u32,
            })
            .collect();

        Ok(RoomDelta::PlayersImported {
            count: self.players.len() as u32,
            players: self.players.clone(),
        })
    }

    /// Drives the room status: waiting -> active, active <-> paused, and any
    /// live status -> completed. Completing requires no live episode.
    pub fn set_status(&mut self, caller: &str, to: RoomStatus) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;
        let from = self.status;

        let allowed = matches!(
            (from, to),
            (RoomStatus::Waiting, RoomStatus::Active)
                | (RoomStatus::Active, RoomStatus::Paused)
                | (RoomStatus::Paused, RoomStatus::Active)
                | (RoomStatus::Waiting, RoomStatus::Completed)
                | (RoomStatus::Active, RoomStatus::Completed)
                | (RoomStatus::Paused, RoomStatus::Completed)
        );
        if !allowed {
            return Err(RoomError::InvalidTransition { from, to });
        }
        if to == RoomStatus::Completed {
            if let Some(ep) = &self.current {
                return Err(RoomError::OfferInProgress {
                    player_id: ep.player_id().to_string(),
                });
            }
        }

        self.status = to;
        Ok(RoomDelta::StatusChanged { status: to })
    }

    /// Puts an unsold player on the block, opening a fresh bidding episode.
    ///
    /// Allowed only when no other player is on the block. A waiting room
    /// becomes active on the first offer.
    pub fn offer_player(&mut self, caller: &str, player_id: &str) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;
        match self.status {
            RoomStatus::Completed => return Err(RoomError::RoomCompleted),
            RoomStatus::Paused => return Err(RoomError::RoomPaused),
            RoomStatus::Waiting | RoomStatus::Active => {}
        }
        if let Some(ep) = &self.current {
            return Err(RoomError::OfferInProgress {
                player_id: ep.player_id().to_string(),
            });
        }

        let player = self
            .find_player(player_id)
            .ok_or_else(|| RoomError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        if player.is_sold() {
            return Err(RoomError::PlayerAlreadySold {
                player_id: player_id.to_string(),
            });
        }

        let player = player.clone();
        self.current = Some(BidEpisode::open(player_id, player.base_price));
        self.status = RoomStatus::Active;

        Ok(RoomDelta::PlayerOffered {
            floor_price: player.base_price,
            player,
        })
    }

    /// Submits a bid against the live episode for `player_id`.
    ///
    /// Checked and applied in one step against the current episode state:
    /// strictly-increasing price, no self-outbid, within the team's purse.
    pub fn place_bid(
        &mut self,
        user_id: &str,
        player_id: &str,
        price: Decimal,
    ) -> Result<RoomDelta, RoomError> {
        match self.status {
            RoomStatus::Completed => return Err(RoomError::RoomCompleted),
            RoomStatus::Paused => return Err(RoomError::RoomPaused),
            RoomStatus::Waiting | RoomStatus::Active => {}
        }

        let team_idx = self
            .teams
            .iter()
            .position(|t| t.user_id == user_id)
            .ok_or_else(|| RoomError::UnknownTeam {
                user_id: user_id.to_string(),
            })?;
        let purse = self.teams[team_idx].ledger.purse_remaining();

        let episode = self.current.as_mut().ok_or(RoomError::NoLiveOffer)?;
        if episode.player_id() != player_id {
            return Err(RoomError::WrongPlayerOffered {
                offered: episode.player_id().to_string(),
                requested: player_id.to_string(),
            });
        }

        episode.submit(user_id, price, purse)?;

        Ok(RoomDelta::BidAccepted {
            player_id: player_id.to_string(),
            user_id: user_id.to_string(),
            team_name: self.teams[team_idx].team_name.clone(),
            price,
        })
    }

    /// Hammers the sale: debits the winner's ledger and marks the player sold,
    /// as one unit. On `InsufficientFunds` nothing changes and the episode
    /// stays live so the auctioneer can pick a different winner or price.
    ///
    /// The named team and price are the auctioneer's call; a mismatch with
    /// the standing bid is logged but not rejected.
    pub fn finalize_sale(
        &mut self,
        caller: &str,
        player_id: &str,
        team_user_id: &str,
        price: Decimal,
    ) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;

        let player_idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| RoomError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        // Replay guard: a sold player is never re-sold, regardless of episode
        // state. This is the idempotency check for duplicate delivery.
        if self.players[player_idx].is_sold() {
            return Err(RoomError::PlayerAlreadySold {
                player_id: player_id.to_string(),
            });
        }

        let episode = self.current.as_ref().ok_or(RoomError::NoLiveOffer)?;
        if episode.player_id() != player_id {
            return Err(RoomError::WrongPlayerOffered {
                offered: episode.player_id().to_string(),
                requested: player_id.to_string(),
            });
        }

        let floor = self.players[player_idx].base_price;
        if price < floor {
            return Err(RoomError::SaleBelowFloor {
                offered: price,
                floor,
            });
        }

        if episode.leader().is_some_and(|leader| leader != team_user_id)
            || (episode.leader().is_some() && price != episode.standing_bid())
        {
            warn!(
                room = %self.code,
                player = %player_id,
                named_team = %team_user_id,
                named_price = %price,
                leader = ?episode.leader(),
                standing_bid = %episode.standing_bid(),
                "Finalizing sale that differs from the standing bid"
            );
        }

        let team_idx = self
            .teams
            .iter()
            .position(|t| t.user_id == team_user_id)
            .ok_or_else(|| RoomError::UnknownTeam {
                user_id: team_user_id.to_string(),
            })?;
        if self.teams[team_idx].ledger.squad_size() >= self.rules.max_squad_size as usize {
            return Err(RoomError::SquadFull {
                max: self.rules.max_squad_size,
            });
        }

        // The only path that mutates both purse and roster. On error the
        // episode stays live and nothing has changed.
        self.teams[team_idx].ledger.acquire(player_id, price)?;

        let team_name = self.teams[team_idx].team_name.clone();
        let player = &mut self.players[player_idx];
        player.status = PlayerStatus::Sold;
        player.sold_price = Some(price);
        player.sold_to = Some(team_user_id.to_string());
        let player = player.clone();
        self.current = None;

        Ok(RoomDelta::PlayerSold {
            player,
            user_id: team_user_id.to_string(),
            team_name,
            price,
            teams: self.team_views(),
        })
    }

    /// Closes the live episode without a sale. The player stays unsold and
    /// may be offered again later.
    pub fn finalize_unsold(&mut self, caller: &str, player_id: &str) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;

        let episode = self.current.as_ref().ok_or(RoomError::NoLiveOffer)?;
        if episode.player_id() != player_id {
            return Err(RoomError::WrongPlayerOffered {
                offered: episode.player_id().to_string(),
                requested: player_id.to_string(),
            });
        }

        let player = self
            .find_player(player_id)
            .ok_or_else(|| RoomError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        let name = player.name.clone();
        self.current = None;

        Ok(RoomDelta::PlayerUnsold {
            player_id: player_id.to_string(),
            name,
        })
    }

    /// Correction path: flips a sold player back to unsold, crediting the
    /// owner's ledger with the final price. A stored lineup that referenced
    /// the player is cleared, since it can no longer be compliant.
    pub fn revert_sale(&mut self, caller: &str, player_id: &str) -> Result<RoomDelta, RoomError> {
        self.require_auctioneer(caller)?;
        if self.status == RoomStatus::Completed {
            return Err(RoomError::RoomCompleted);
        }

        let player_idx = self
            .players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or_else(|| RoomError::UnknownPlayer {
                player_id: player_id.to_string(),
            })?;
        // A sold player always carries an owner; a missing one is treated
        // as not-sold rather than a panic.
        let Some(owner_id) = self.players[player_idx]
            .sold_to
            .clone()
            .filter(|_| self.players[player_idx].is_sold())
        else {
            return Err(RoomError::PlayerNotSold {
                player_id: player_id.to_string(),
            });
        };
        let team_idx = self
            .teams
            .iter()
            .position(|t| t.user_id == owner_id)
            .ok_or_else(|| RoomError::UnknownTeam {
                user_id: owner_id.clone(),
            })?;

        let refund = self.teams[team_idx].ledger.credit_on_reversal(player_id)?;

        let lineup_cleared = self.teams[team_idx]
            .lineup
            .as_ref()
            .is_some_and(|l| l.contains(player_id));
        if lineup_cleared {
            self.teams[team_idx].lineup = None;
        }

        let player = &mut self.players[player_idx];
        player.status = PlayerStatus::Unsold;
        player.sold_price = None;
        player.sold_to = None;
        let player = player.clone();

        Ok(RoomDelta::SaleReverted {
            player,
            user_id: owner_id,
            refund,
            lineup_cleared,
            teams: self.team_views(),
        })
    }

    /// Validates and stores a team's lineup. The prior lineup is kept
    /// untouched unless the new selection passes every compliance check.
    pub fn update_lineup(
        &mut self,
        user_id: &str,
        selection: LineupSelection,
    ) -> Result<RoomDelta, RoomError> {
        if self.status == RoomStatus::Completed {
            return Err(RoomError::RoomCompleted);
        }
        let team_idx = self
            .teams
            .iter()
            .position(|t| t.user_id == user_id)
            .ok_or_else(|| RoomError::UnknownTeam {
                user_id: user_id.to_string(),
            })?;

        let squad: Vec<&Player> = self
            .players
            .iter()
            .filter(|p| self.teams[team_idx].ledger.owns(&p.id))
            .collect();
        let violations = lineup::validate(&selection, &squad, &self.rules);
        if !violations.is_empty() {
            return Err(RoomError::LineupRejected { violations });
        }

        self.teams[team_idx].lineup = Some(selection.clone());
        Ok(RoomDelta::LineupUpdated {
            user_id: user_id.to_string(),
            lineup: selection,
        })
    }

    fn require_auctioneer(&self, caller: &str) -> Result<(), RoomError> {
        if caller != self.auctioneer {
            return Err(RoomError::NotAuctioneer {
                user_id: caller.to_string(),
            });
        }
        Ok(())
    }

    fn find_player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn team_views(&self) -> Vec<TeamView> {
        self.teams
            .iter()
            .map(|team| TeamView {
                user_id: team.user_id.clone(),
                team_name: team.team_name.clone(),
                purse_remaining: team.ledger.purse_remaining(),
                players: team
                    .ledger
                    .acquisitions()
                    .iter()
                    .filter_map(|a| self.find_player(&a.player_id).cloned())
                    .collect(),
                lineup: team.lineup.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const AUCTIONEER: &str = "host";

    fn default_rules() -> AuctionRules {
        AuctionRules::default()
    }

    fn import_row(name: &str, role: &str, country: &str, base: Decimal) -> PlayerImportRow {
        PlayerImportRow {
            name: name.to_string(),
            role: role.to_string(),
            country: country.to_string(),
            base_price: base,
            stats: CareerStats::default(),
        }
    }

    fn sample_rows() -> Vec<PlayerImportRow> {
        vec![
            import_row("Kohli", "Batsman", "India", dec!(2)),
            import_row("Bumrah", "Bowler", "India", dec!(2)),
            import_row("Warner", "Batsman", "Australia", dec!(1.5)),
        ]
    }

    /// Room with three imported players and two joined teams.
    fn seeded_room() -> AuctionRoom {
        let mut room = AuctionRoom::new("54ON2P", "Test League", AUCTIONEER, default_rules());
        room.import_players(AUCTIONEER, sample_rows()).unwrap();
        room.join_team("userA", "Team A").unwrap();
        room.join_team("userB", "Team B").unwrap();
        room
    }

    fn first_player_id(room: &AuctionRoom) -> String {
        room.players()[0].id.clone()
    }

    #[test]
    fn test_join_creates_team_with_full_purse() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, default_rules());
        let delta = room.join_team("userA", "Team A").unwrap();
        match delta {
            RoomDelta::TeamJoined { rejoined, teams, .. } => {
                assert!(!rejoined);
                assert_eq!(teams.len(), 1);
                assert_eq!(teams[0].purse_remaining, dec!(100));
            }
            other => panic!("Expected TeamJoined, got {:?}", other),
        }
    }

    #[test]
    fn test_rejoin_keeps_ledger() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.finalize_sale(AUCTIONEER, &pid, "userA", dec!(10)).unwrap();

        let delta = room.join_team("userA", "Team A").unwrap();
        match delta {
            RoomDelta::TeamJoined { rejoined, teams, .. } => {
                assert!(rejoined);
                let team = teams.iter().find(|t| t.user_id == "userA").unwrap();
                assert_eq!(team.purse_remaining, dec!(90));
                assert_eq!(team.players.len(), 1);
            }
            other => panic!("Expected TeamJoined, got {:?}", other),
        }
    }

    #[test]
    fn test_import_assigns_order_and_normalizes_roles() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, default_rules());
        let rows = vec![
            import_row("A", "batsman", "India", dec!(2)),
            import_row("B", "ALL-ROUNDER", "India", dec!(2)),
            import_row("C", "wicket-keeper", "India", dec!(2)),
        ];
        room.import_players(AUCTIONEER, rows).unwrap();
        assert_eq!(room.players()[0].order, 0);
        assert_eq!(room.players()[1].role, PlayerRole::AllRounder);
        assert_eq!(room.players()[2].role, PlayerRole::WicketKeeper);
    }

    #[test]
    fn test_import_rejects_whole_batch_naming_rows() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, default_rules());
        let rows = vec![
            import_row("Good", "Batsman", "India", dec!(2)),
            import_row("", "Bowler", "India", dec!(2)),
            import_row("Bad Role", "Goalkeeper", "India", dec!(2)),
            import_row("Bad Price", "Bowler", "India", dec!(-1)),
        ];
        let err = room.import_players(AUCTIONEER, rows).unwrap_err();
        match err {
            RoomError::InvalidImport { problems } => {
                assert_eq!(problems.len(), 3);
                assert!(problems[0].contains("row 2"));
                assert!(problems.iter().any(|p| p.contains("row 3")));
                assert!(problems.iter().any(|p| p.contains("row 4")));
            }
            other => panic!("Expected InvalidImport, got {:?}", other),
        }
        assert!(room.players().is_empty());
    }

    #[test]
    fn test_import_replaces_previous_pool() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, default_rules());
        room.import_players(AUCTIONEER, sample_rows()).unwrap();
        room.import_players(AUCTIONEER, vec![import_row("Only", "Bowler", "India", dec!(1))])
            .unwrap();
        assert_eq!(room.players().len(), 1);
        assert_eq!(room.players()[0].name, "Only");
    }

    #[test]
    fn test_import_rejected_once_active() {
        let mut room = seeded_room();
        room.set_status(AUCTIONEER, RoomStatus::Active).unwrap();
        let err = room.import_players(AUCTIONEER, sample_rows()).unwrap_err();
        assert!(matches!(err, RoomError::ImportNotAllowed { .. }));
    }

    #[test]
    fn test_import_requires_auctioneer() {
        let mut room = seeded_room();
        let err = room.import_players("userA", sample_rows()).unwrap_err();
        assert!(matches!(err, RoomError::NotAuctioneer { .. }));
    }

    #[test]
    fn test_offer_activates_waiting_room() {
        let mut room = seeded_room();
        assert_eq!(room.status(), RoomStatus::Waiting);
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        assert_eq!(room.status(), RoomStatus::Active);
        assert_eq!(room.current_episode().unwrap().player_id(), pid);
    }

    #[test]
    fn test_single_offer_invariant() {
        let mut room = seeded_room();
        let p0 = room.players()[0].id.clone();
        let p1 = room.players()[1].id.clone();
        room.offer_player(AUCTIONEER, &p0).unwrap();
        let err = room.offer_player(AUCTIONEER, &p1).unwrap_err();
        assert!(matches!(err, RoomError::OfferInProgress { .. }));
    }

    #[test]
    fn test_offer_resets_episode_state() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.place_bid("userA", &pid, dec!(5)).unwrap();
        room.finalize_unsold(AUCTIONEER, &pid).unwrap();

        room.offer_player(AUCTIONEER, &pid).unwrap();
        let ep = room.current_episode().unwrap();
        assert_eq!(ep.standing_bid(), dec!(2));
        assert!(ep.leader().is_none());
    }

    #[test]
    fn test_no_direct_unsold_to_sold() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        let err = room
            .finalize_sale(AUCTIONEER, &pid, "userA", dec!(5))
            .unwrap_err();
        assert_eq!(err, RoomError::NoLiveOffer);
        assert_eq!(room.players()[0].status, PlayerStatus::Unsold);
    }

    #[test]
    fn test_full_bidding_episode_to_hammer() {
        // Purse 100, floor 2: A bids 5, A's 7 is a self-outbid, B takes it
        // at 7 and the hammer falls.
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();

        room.place_bid("userA", &pid, dec!(5)).unwrap();
        let err = room.place_bid("userA", &pid, dec!(7)).unwrap_err();
        assert_eq!(err.code(), "SELF_OUTBID");
        room.place_bid("userB", &pid, dec!(7)).unwrap();

        room.finalize_sale(AUCTIONEER, &pid, "userB", dec!(7)).unwrap();

        let snapshot = room.snapshot();
        let team_b = snapshot.teams.iter().find(|t| t.user_id == "userB").unwrap();
        assert_eq!(team_b.purse_remaining, dec!(93));
        let player = &snapshot.players[0];
        assert_eq!(player.status, PlayerStatus::Sold);
        assert_eq!(player.sold_to.as_deref(), Some("userB"));
        assert_eq!(player.sold_price, Some(dec!(7)));
        assert!(snapshot.current.is_none());
    }

    #[test]
    fn test_bid_over_purse_rejected_without_state_change() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, {
            let mut rules = default_rules();
            rules.total_purse = dec!(5);
            rules
        });
        room.import_players(AUCTIONEER, sample_rows()).unwrap();
        room.join_team("userA", "Team A").unwrap();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();

        let err = room.place_bid("userA", &pid, dec!(10)).unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PURSE");
        assert!(room.current_episode().unwrap().leader().is_none());
    }

    #[test]
    fn test_insufficient_funds_keeps_episode_live() {
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, {
            let mut rules = default_rules();
            rules.total_purse = dec!(5);
            rules
        });
        room.import_players(AUCTIONEER, sample_rows()).unwrap();
        room.join_team("userA", "Team A").unwrap();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();

        let err = room
            .finalize_sale(AUCTIONEER, &pid, "userA", dec!(10))
            .unwrap_err();
        assert!(matches!(err, RoomError::Funds(LedgerError::InsufficientFunds { .. })));
        // Episode survives so a different winner or price can be named.
        assert!(room.current_episode().is_some());
        assert_eq!(room.players()[0].status, PlayerStatus::Unsold);
    }

    #[test]
    fn test_finalize_below_floor_rejected() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        let err = room
            .finalize_sale(AUCTIONEER, &pid, "userA", dec!(1))
            .unwrap_err();
        assert!(matches!(err, RoomError::SaleBelowFloor { .. }));
        assert!(room.current_episode().is_some());
    }

    #[test]
    fn test_finalize_replay_is_rejected_without_ledger_change() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.finalize_sale(AUCTIONEER, &pid, "userA", dec!(10)).unwrap();

        let err = room
            .finalize_sale(AUCTIONEER, &pid, "userB", dec!(10))
            .unwrap_err();
        assert!(matches!(err, RoomError::PlayerAlreadySold { .. }));
        assert!(err.is_defect());

        let snapshot = room.snapshot();
        let team_a = snapshot.teams.iter().find(|t| t.user_id == "userA").unwrap();
        let team_b = snapshot.teams.iter().find(|t| t.user_id == "userB").unwrap();
        assert_eq!(team_a.purse_remaining, dec!(90));
        assert_eq!(team_b.purse_remaining, dec!(100));
    }

    #[test]
    fn test_unsold_player_can_be_reoffered() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.finalize_unsold(AUCTIONEER, &pid).unwrap();
        assert!(room.current_episode().is_none());
        room.offer_player(AUCTIONEER, &pid).unwrap();
    }

    #[test]
    fn test_squad_cap_enforced_on_sale() {
        let mut rules = default_rules();
        rules.max_squad_size = 1;
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, rules);
        room.import_players(AUCTIONEER, sample_rows()).unwrap();
        room.join_team("userA", "Team A").unwrap();

        let p0 = room.players()[0].id.clone();
        let p1 = room.players()[1].id.clone();
        room.offer_player(AUCTIONEER, &p0).unwrap();
        room.finalize_sale(AUCTIONEER, &p0, "userA", dec!(5)).unwrap();
        room.offer_player(AUCTIONEER, &p1).unwrap();
        let err = room
            .finalize_sale(AUCTIONEER, &p1, "userA", dec!(5))
            .unwrap_err();
        assert!(matches!(err, RoomError::SquadFull { max: 1 }));
    }

    #[test]
    fn test_revert_sale_refunds_and_clears_lineup_reference() {
        let mut rules = default_rules();
        rules.lineup_size = 2;
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, rules);
        let rows = vec![
            import_row("Keeper", "Wicket-Keeper", "India", dec!(2)),
            import_row("Bat", "Batsman", "India", dec!(2)),
        ];
        room.import_players(AUCTIONEER, rows).unwrap();
        room.join_team("userA", "Team A").unwrap();

        let keeper = room.players()[0].id.clone();
        let bat = room.players()[1].id.clone();
        for pid in [&keeper, &bat] {
            room.offer_player(AUCTIONEER, pid).unwrap();
            room.finalize_sale(AUCTIONEER, pid, "userA", dec!(5)).unwrap();
        }
        room.update_lineup(
            "userA",
            LineupSelection {
                players: vec![keeper.clone(), bat.clone()],
                captain: keeper.clone(),
                vice_captain: bat.clone(),
                wicket_keeper: keeper.clone(),
            },
        )
        .unwrap();

        let delta = room.revert_sale(AUCTIONEER, &bat).unwrap();
        match delta {
            RoomDelta::SaleReverted { refund, lineup_cleared, teams, .. } => {
                assert_eq!(refund, dec!(5));
                assert!(lineup_cleared);
                assert_eq!(teams[0].purse_remaining, dec!(95));
                assert!(teams[0].lineup.is_none());
            }
            other => panic!("Expected SaleReverted, got {:?}", other),
        }
        assert_eq!(room.players()[1].status, PlayerStatus::Unsold);
        assert!(room.players()[1].sold_to.is_none());
    }

    #[test]
    fn test_revert_unsold_player_rejected() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        let err = room.revert_sale(AUCTIONEER, &pid).unwrap_err();
        assert!(matches!(err, RoomError::PlayerNotSold { .. }));
    }

    #[test]
    fn test_lineup_rejected_keeps_prior_selection() {
        let mut rules = default_rules();
        rules.lineup_size = 1;
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, rules);
        room.import_players(
            AUCTIONEER,
            vec![import_row("Keeper", "Wicket-Keeper", "India", dec!(2))],
        )
        .unwrap();
        room.join_team("userA", "Team A").unwrap();
        let keeper = room.players()[0].id.clone();
        room.offer_player(AUCTIONEER, &keeper).unwrap();
        room.finalize_sale(AUCTIONEER, &keeper, "userA", dec!(5)).unwrap();

        let good = LineupSelection {
            players: vec![keeper.clone()],
            captain: keeper.clone(),
            vice_captain: keeper.clone(),
            wicket_keeper: keeper.clone(),
        };
        // Captain == vice-captain violates compliance even at size 1; first
        // store a passing variant is impossible here, so assert rejection
        // leaves no lineup at all.
        let err = room.update_lineup("userA", good).unwrap_err();
        match err {
            RoomError::LineupRejected { violations } => {
                assert!(!violations.is_empty());
            }
            other => panic!("Expected LineupRejected, got {:?}", other),
        }
        assert!(room.teams()[0].lineup().is_none());
    }

    #[test]
    fn test_paused_room_rejects_bids_and_offers() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.place_bid("userA", &pid, dec!(5)).unwrap();
        room.set_status(AUCTIONEER, RoomStatus::Paused).unwrap();

        assert_eq!(
            room.place_bid("userB", &pid, dec!(6)).unwrap_err(),
            RoomError::RoomPaused
        );
        assert_eq!(
            room.offer_player(AUCTIONEER, &pid).unwrap_err(),
            RoomError::RoomPaused
        );

        // Resume and continue the same episode.
        room.set_status(AUCTIONEER, RoomStatus::Active).unwrap();
        room.place_bid("userB", &pid, dec!(6)).unwrap();
    }

    #[test]
    fn test_complete_requires_no_live_episode() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        let err = room
            .set_status(AUCTIONEER, RoomStatus::Completed)
            .unwrap_err();
        assert!(matches!(err, RoomError::OfferInProgress { .. }));

        room.finalize_unsold(AUCTIONEER, &pid).unwrap();
        room.set_status(AUCTIONEER, RoomStatus::Completed).unwrap();
        assert_eq!(room.status(), RoomStatus::Completed);
    }

    #[test]
    fn test_completed_room_rejects_mutations() {
        let mut room = seeded_room();
        room.set_status(AUCTIONEER, RoomStatus::Completed).unwrap();
        let pid = first_player_id(&room);

        assert_eq!(room.join_team("userC", "Team C").unwrap_err(), RoomError::RoomCompleted);
        assert_eq!(
            room.offer_player(AUCTIONEER, &pid).unwrap_err(),
            RoomError::RoomCompleted
        );
        assert!(matches!(
            room.set_status(AUCTIONEER, RoomStatus::Active).unwrap_err(),
            RoomError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn test_completed_room_rejects_revert() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.finalize_sale(AUCTIONEER, &pid, "userA", dec!(10)).unwrap();
        room.set_status(AUCTIONEER, RoomStatus::Completed).unwrap();

        assert_eq!(
            room.revert_sale(AUCTIONEER, &pid).unwrap_err(),
            RoomError::RoomCompleted
        );
        // The final result stays settled: ownership and purse untouched.
        assert_eq!(room.players()[0].status, PlayerStatus::Sold);
        assert_eq!(room.players()[0].sold_to.as_deref(), Some("userA"));
        let team = room.teams().iter().find(|t| t.user_id() == "userA").unwrap();
        assert_eq!(team.ledger().purse_remaining(), dec!(90));
    }

    #[test]
    fn test_invalid_transitions() {
        let mut room = seeded_room();
        let err = room.set_status(AUCTIONEER, RoomStatus::Paused).unwrap_err();
        assert!(matches!(
            err,
            RoomError::InvalidTransition {
                from: RoomStatus::Waiting,
                to: RoomStatus::Paused,
            }
        ));
    }

    /// Captures a live room the way the server's record builders do.
    fn durable_state_of(room: &AuctionRoom) -> RestoredRoom {
        RestoredRoom {
            code: room.code().to_string(),
            name: room.name().to_string(),
            auctioneer: room.auctioneer().to_string(),
            status: room.status(),
            rules: room.rules().clone(),
            players: room.players().to_vec(),
            teams: room
                .teams()
                .iter()
                .map(|team| RestoredTeam {
                    user_id: team.user_id().to_string(),
                    team_name: team.team_name().to_string(),
                    players: team
                        .ledger()
                        .acquisitions()
                        .iter()
                        .map(|a| a.player_id.clone())
                        .collect(),
                    lineup: team.lineup().cloned(),
                })
                .collect(),
            current_player: room.current_episode().map(|ep| ep.player_id().to_string()),
        }
    }

    #[test]
    fn test_restore_replays_ledgers_and_reopens_offer() {
        let mut room = seeded_room();
        let p1 = room.players()[0].id.clone();
        let p2 = room.players()[1].id.clone();
        room.offer_player(AUCTIONEER, &p1).unwrap();
        room.finalize_sale(AUCTIONEER, &p1, "userA", dec!(10)).unwrap();
        room.offer_player(AUCTIONEER, &p2).unwrap();
        room.place_bid("userB", &p2, dec!(8)).unwrap();

        let restored = AuctionRoom::restore(durable_state_of(&room)).unwrap();

        assert_eq!(restored.status(), RoomStatus::Active);
        assert_eq!(restored.players().len(), 3);
        let team_a = restored
            .teams()
            .iter()
            .find(|t| t.user_id() == "userA")
            .unwrap();
        assert_eq!(team_a.ledger().purse_remaining(), dec!(90));
        assert!(team_a.ledger().owns(&p1));

        // The offer reopens at the floor; the standing bid was not durable.
        let episode = restored.current_episode().unwrap();
        assert_eq!(episode.player_id(), p2);
        assert_eq!(episode.standing_bid(), room.players()[1].base_price);
        assert!(episode.leader().is_none());
    }

    #[test]
    fn test_restore_rejects_overspent_records() {
        let mut room = seeded_room();
        let p1 = room.players()[0].id.clone();
        room.offer_player(AUCTIONEER, &p1).unwrap();
        room.finalize_sale(AUCTIONEER, &p1, "userA", dec!(10)).unwrap();

        let mut state = durable_state_of(&room);
        // Tampered price beyond the purse must not replay.
        let player = state.players.iter_mut().find(|p| p.id == p1).unwrap();
        player.sold_price = Some(dec!(150));

        let err = AuctionRoom::restore(state).unwrap_err();
        assert!(matches!(err, RoomError::Funds(_)));
    }

    #[test]
    fn test_restore_drops_stale_lineup() {
        let mut rules = default_rules();
        rules.lineup_size = 2;
        let mut room = AuctionRoom::new("ROOM01", "League", AUCTIONEER, rules);
        room.import_players(
            AUCTIONEER,
            vec![
                import_row("Keeper", "Wicket-Keeper", "India", dec!(2)),
                import_row("Bat", "Batsman", "India", dec!(2)),
            ],
        )
        .unwrap();
        room.join_team("userA", "Team A").unwrap();
        let keeper = room.players()[0].id.clone();
        let bat = room.players()[1].id.clone();
        for pid in [&keeper, &bat] {
            room.offer_player(AUCTIONEER, pid).unwrap();
            room.finalize_sale(AUCTIONEER, pid, "userA", dec!(5)).unwrap();
        }
        room.update_lineup(
            "userA",
            LineupSelection {
                players: vec![keeper.clone(), bat.clone()],
                captain: keeper.clone(),
                vice_captain: bat.clone(),
                wicket_keeper: keeper.clone(),
            },
        )
        .unwrap();

        let mut state = durable_state_of(&room);
        // Drop the batsman from the recorded squad; the lineup now names a
        // player the team does not own.
        state.teams[0].players.retain(|pid| pid == &keeper);
        state.players.iter_mut().for_each(|p| {
            if p.id == bat {
                p.status = PlayerStatus::Unsold;
                p.sold_price = None;
                p.sold_to = None;
            }
        });

        let restored = AuctionRoom::restore(state).unwrap();
        assert!(restored.teams()[0].lineup().is_none());
    }

    #[test]
    fn test_snapshot_reflects_live_episode() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        room.place_bid("userA", &pid, dec!(4)).unwrap();

        let snapshot = room.snapshot();
        let current = snapshot.current.unwrap();
        assert_eq!(current.player.id, pid);
        assert_eq!(current.standing_bid, dec!(4));
        assert_eq!(current.leader.as_deref(), Some("userA"));
    }

    #[test]
    fn test_bid_from_unknown_team_rejected() {
        let mut room = seeded_room();
        let pid = first_player_id(&room);
        room.offer_player(AUCTIONEER, &pid).unwrap();
        let err = room.place_bid("ghost", &pid, dec!(5)).unwrap_err();
        assert!(matches!(err, RoomError::UnknownTeam { .. }));
    }

    #[test]
    fn test_budget_invariant_across_operations() {
        let mut room = seeded_room();
        let ids: Vec<String> = room.players().iter().map(|p| p.id.clone()).collect();

        room.offer_player(AUCTIONEER, &ids[0]).unwrap();
        room.finalize_sale(AUCTIONEER, &ids[0], "userA", dec!(12)).unwrap();
        room.offer_player(AUCTIONEER, &ids[1]).unwrap();
        room.finalize_sale(AUCTIONEER, &ids[1], "userA", dec!(8)).unwrap();
        room.revert_sale(AUCTIONEER, &ids[0]).unwrap();
        room.offer_player(AUCTIONEER, &ids[2]).unwrap();
        room.finalize_sale(AUCTIONEER, &ids[2], "userA", dec!(3)).unwrap();

        let team = &room.teams()[0];
        let owned_total: Decimal = room
            .players()
            .iter()
            .filter(|p| p.sold_to.as_deref() == Some("userA"))
            .filter_map(|p| p.sold_price)
            .sum();
        assert_eq!(
            team.ledger().purse_remaining(),
            room.rules().total_purse - owned_total
        );
    }
}
