//! Canonical state deltas and snapshots emitted by the room aggregate.
//!
//! Every successful mutation produces exactly one `RoomDelta`; subscribers
//! observing the delta stream in order see the same state the aggregate
//! holds. `RoomSnapshot` is the full-state payload pushed to new subscribers.

use gavel_common::{AuctionRules, Player, RoomStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::lineup::LineupSelection;

/// A team as seen by subscribers: ledger plus acquired players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamView {
    pub user_id: String,
    pub team_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub purse_remaining: Decimal,
    /// Acquired players in acquisition order.
    pub players: Vec<Player>,
    pub lineup: Option<LineupSelection>,
}

/// The player currently on the block and the standing bid against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentOffer {
    pub player: Player,
    #[serde(with = "rust_decimal::serde::str")]
    pub standing_bid: Decimal,
    /// User id of the leading team, if any bid has landed.
    pub leader: Option<String>,
}

/// Full room state at one instant, for snapshot-on-subscribe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_code: String,
    pub name: String,
    pub auctioneer: String,
    pub status: RoomStatus,
    pub rules: AuctionRules,
    /// Player pool in import order.
    pub players: Vec<Player>,
    pub teams: Vec<TeamView>,
    pub current: Option<CurrentOffer>,
}

/// One canonical state change. Emitted once per successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoomDelta {
    TeamJoined {
        user_id: String,
        team_name: String,
        /// True when an existing team reconnected; the ledger was not reset.
        rejoined: bool,
        teams: Vec<TeamView>,
    },
    PlayersImported {
        count: u32,
        players: Vec<Player>,
    },
    StatusChanged {
        status: RoomStatus,
    },
    PlayerOffered {
        player: Player,
        #[serde(with = "rust_decimal::serde::str")]
        floor_price: Decimal,
    },
    BidAccepted {
        player_id: String,
        user_id: String,
        team_name: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
    },
    PlayerSold {
        player: Player,
        user_id: String,
        team_name: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
        teams: Vec<TeamView>,
    },
    PlayerUnsold {
        player_id: String,
        name: String,
    },
    SaleReverted {
        player: Player,
        user_id: String,
        #[serde(with = "rust_decimal::serde::str")]
        refund: Decimal,
        /// True when the owner's stored lineup referenced the player and was
        /// cleared along with the reversal.
        lineup_cleared: bool,
        teams: Vec<TeamView>,
    },
    LineupUpdated {
        user_id: String,
        lineup: LineupSelection,
    },
}

impl RoomDelta {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomDelta::TeamJoined { .. } => "team_joined",
            RoomDelta::PlayersImported { .. } => "players_imported",
            RoomDelta::StatusChanged { .. } => "status_changed",
            RoomDelta::PlayerOffered { .. } => "player_offered",
            RoomDelta::BidAccepted { .. } => "bid_accepted",
            RoomDelta::PlayerSold { .. } => "player_sold",
            RoomDelta::PlayerUnsold { .. } => "player_unsold",
            RoomDelta::SaleReverted { .. } => "sale_reverted",
            RoomDelta::LineupUpdated { .. } => "lineup_updated",
        }
    }
}
