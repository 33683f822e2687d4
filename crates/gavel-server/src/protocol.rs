//! JSON wire protocol for the WebSocket gateway.
//!
//! Inbound frames are `ClientAction` values tagged by `action`; outbound
//! frames are `ServerEvent` values tagged by `event`. Money travels as
//! decimal strings on both sides.

use chrono::{DateTime, Utc};
use gavel_common::{AuctionRules, CareerStats, ParticipantRole, Player, RoomStatus};
use gavel_engine::{LineupSelection, PlayerImportRow, RoomDelta, RoomSnapshot, TeamView};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One roster row as it arrives on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerImportBody {
    pub name: String,
    pub role: String,
    pub country: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(default)]
    pub stats: CareerStats,
}

impl From<PlayerImportBody> for PlayerImportRow {
    fn from(body: PlayerImportBody) -> Self {
        PlayerImportRow {
            name: body.name,
            role: body.role,
            country: body.country,
            base_price: body.base_price,
            stats: body.stats,
        }
    }
}

/// Inbound message from a connected client.
///
/// The first frame on every connection must be `hello`; everything else is
/// rejected until the session is identified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    Hello {
        user_id: String,
        username: String,
        role: ParticipantRole,
    },
    CreateRoom {
        name: String,
        #[serde(default)]
        rules: Option<AuctionRules>,
    },
    Join {
        room_code: String,
        #[serde(default)]
        team_name: String,
    },
    ImportPlayers {
        room_code: String,
        players: Vec<PlayerImportBody>,
    },
    SetStatus {
        room_code: String,
        status: RoomStatus,
    },
    Offer {
        room_code: String,
        player_id: String,
    },
    Bid {
        room_code: String,
        player_id: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
    },
    FinalizeSale {
        room_code: String,
        player_id: String,
        team_user_id: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
    },
    FinalizeUnsold {
        room_code: String,
        player_id: String,
    },
    RevertSale {
        room_code: String,
        player_id: String,
    },
    UpdateLineup {
        room_code: String,
        lineup: LineupSelection,
    },
    Chat {
        room_code: String,
        message: String,
    },
}

impl ClientAction {
    /// Room code this action targets, if any.
    pub fn room_code(&self) -> Option<&str> {
        match self {
            ClientAction::Hello { .. } | ClientAction::CreateRoom { .. } => None,
            ClientAction::Join { room_code, .. }
            | ClientAction::ImportPlayers { room_code, .. }
            | ClientAction::SetStatus { room_code, .. }
            | ClientAction::Offer { room_code, .. }
            | ClientAction::Bid { room_code, .. }
            | ClientAction::FinalizeSale { room_code, .. }
            | ClientAction::FinalizeUnsold { room_code, .. }
            | ClientAction::RevertSale { room_code, .. }
            | ClientAction::UpdateLineup { room_code, .. }
            | ClientAction::Chat { room_code, .. } => Some(room_code),
        }
    }
}

/// Outbound message to one or more clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomCreated {
        room_code: String,
        name: String,
    },
    /// Full room state, sent exactly once when a subscription starts.
    Snapshot {
        room: RoomSnapshot,
    },
    TeamJoined {
        room_code: String,
        user_id: String,
        team_name: String,
        rejoined: bool,
        teams: Vec<TeamView>,
    },
    PlayersImported {
        room_code: String,
        count: u32,
        players: Vec<Player>,
    },
    StatusChanged {
        room_code: String,
        status: RoomStatus,
    },
    PlayerOffered {
        room_code: String,
        player: Player,
        #[serde(with = "rust_decimal::serde::str")]
        floor_price: Decimal,
    },
    BidAccepted {
        room_code: String,
        player_id: String,
        user_id: String,
        team_name: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
    },
    PlayerSold {
        room_code: String,
        player: Player,
        user_id: String,
        team_name: String,
        #[serde(with = "rust_decimal::serde::str")]
        price: Decimal,
        teams: Vec<TeamView>,
    },
    PlayerUnsold {
        room_code: String,
        player_id: String,
        name: String,
    },
    SaleReverted {
        room_code: String,
        player: Player,
        user_id: String,
        #[serde(with = "rust_decimal::serde::str")]
        refund: Decimal,
        lineup_cleared: bool,
        teams: Vec<TeamView>,
    },
    LineupUpdated {
        room_code: String,
        user_id: String,
        lineup: LineupSelection,
    },
    ParticipantLeft {
        room_code: String,
        user_id: String,
        username: String,
    },
    ChatMessage {
        room_code: String,
        user_id: String,
        username: String,
        message: String,
        sent_at: DateTime<Utc>,
    },
    /// Sent only to the submitter whose bid was turned away.
    BidRejected {
        room_code: String,
        player_id: String,
        code: String,
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
}

impl ServerEvent {
    /// Error event from a code and human-readable message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Lifts a room delta into its broadcast form.
    pub fn from_delta(room_code: &str, delta: RoomDelta) -> Self {
        let room_code = room_code.to_string();
        match delta {
            RoomDelta::TeamJoined {
                user_id,
                team_name,
                rejoined,
                teams,
            } => ServerEvent::TeamJoined {
                room_code,
                user_id,
                team_name,
                rejoined,
                teams,
            },
            RoomDelta::PlayersImported { count, players } => ServerEvent::PlayersImported {
                room_code,
                count,
                players,
            },
            RoomDelta::StatusChanged { status } => ServerEvent::StatusChanged { room_code, status },
            RoomDelta::PlayerOffered {
                player,
                floor_price,
            } => ServerEvent::PlayerOffered {
                room_code,
                player,
                floor_price,
            },
            RoomDelta::BidAccepted {
                player_id,
                user_id,
                team_name,
                price,
            } => ServerEvent::BidAccepted {
                room_code,
                player_id,
                user_id,
                team_name,
                price,
            },
            RoomDelta::PlayerSold {
                player,
                user_id,
                team_name,
                price,
                teams,
            } => ServerEvent::PlayerSold {
                room_code,
                player,
                user_id,
                team_name,
                price,
                teams,
            },
            RoomDelta::PlayerUnsold { player_id, name } => ServerEvent::PlayerUnsold {
                room_code,
                player_id,
                name,
            },
            RoomDelta::SaleReverted {
                player,
                user_id,
                refund,
                lineup_cleared,
                teams,
            } => ServerEvent::SaleReverted {
                room_code,
                player,
                user_id,
                refund,
                lineup_cleared,
                teams,
            },
            RoomDelta::LineupUpdated { user_id, lineup } => ServerEvent::LineupUpdated {
                room_code,
                user_id,
                lineup,
            },
        }
    }

    /// Wire tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::RoomCreated { .. } => "room_created",
            ServerEvent::Snapshot { .. } => "snapshot",
            ServerEvent::TeamJoined { .. } => "team_joined",
            ServerEvent::PlayersImported { .. } => "players_imported",
            ServerEvent::StatusChanged { .. } => "status_changed",
            ServerEvent::PlayerOffered { .. } => "player_offered",
            ServerEvent::BidAccepted { .. } => "bid_accepted",
            ServerEvent::PlayerSold { .. } => "player_sold",
            ServerEvent::PlayerUnsold { .. } => "player_unsold",
            ServerEvent::SaleReverted { .. } => "sale_reverted",
            ServerEvent::LineupUpdated { .. } => "lineup_updated",
            ServerEvent::ParticipantLeft { .. } => "participant_left",
            ServerEvent::ChatMessage { .. } => "chat_message",
            ServerEvent::BidRejected { .. } => "bid_rejected",
            ServerEvent::Error { .. } => "error",
        }
    }
}
