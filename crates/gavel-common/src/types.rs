//! Shared types for the gavel auction engine.
//!
//! CRITICAL: All purses and prices use `rust_decimal::Decimal`.
//! NEVER use f64 for money.

use chrono::{DateTime, Utc};
use clickhouse::Row;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Role category for an auctionable player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    Batsman,
    Bowler,
    #[serde(rename = "All-Rounder")]
    AllRounder,
    #[serde(rename = "Wicket-Keeper")]
    WicketKeeper,
}

impl PlayerRole {
    /// Returns the canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerRole::Batsman => "Batsman",
            PlayerRole::Bowler => "Bowler",
            PlayerRole::AllRounder => "All-Rounder",
            PlayerRole::WicketKeeper => "Wicket-Keeper",
        }
    }
}

impl std::fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlayerRole {
    type Err = String;

    /// Case-insensitive; tolerates the spellings seen in import sheets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "batsman" | "batter" => Ok(PlayerRole::Batsman),
            "bowler" => Ok(PlayerRole::Bowler),
            "allrounder" => Ok(PlayerRole::AllRounder),
            "wicketkeeper" | "keeper" | "wk" => Ok(PlayerRole::WicketKeeper),
            _ => Err(format!("Unknown player role: {}", s)),
        }
    }
}

/// Lifecycle status of a room's auction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Active,
    Paused,
    Completed,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Active => "active",
            RoomStatus::Paused => "paused",
            RoomStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waiting" => Ok(RoomStatus::Waiting),
            "active" => Ok(RoomStatus::Active),
            "paused" => Ok(RoomStatus::Paused),
            "completed" => Ok(RoomStatus::Completed),
            _ => Err(format!("Unknown room status: {}", s)),
        }
    }
}

/// Sale status of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Unsold,
    Sold,
}

impl PlayerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerStatus::Unsold => "unsold",
            PlayerStatus::Sold => "sold",
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlayerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unsold" => Ok(PlayerStatus::Unsold),
            "sold" => Ok(PlayerStatus::Sold),
            _ => Err(format!("Unknown player status: {}", s)),
        }
    }
}

/// Role of an authenticated participant, supplied by the session service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Runs the auction: offers players, hammers sales.
    Auctioneer,
    /// Bids for a team.
    Contestant,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Auctioneer => "auctioneer",
            ParticipantRole::Contestant => "contestant",
        }
    }
}

impl std::fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ParticipantRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auctioneer" => Ok(ParticipantRole::Auctioneer),
            "contestant" | "bidder" => Ok(ParticipantRole::Contestant),
            _ => Err(format!("Unknown participant role: {}", s)),
        }
    }
}

/// Career statistics attached to an imported player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CareerStats {
    pub matches: u32,
    pub runs: u32,
    pub wickets: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub average: Decimal,
}

/// Rule configuration for one auction room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionRules {
    /// Starting purse per team.
    #[serde(with = "rust_decimal::serde::str")]
    pub total_purse: Decimal,
    /// Maximum players a team may acquire.
    pub max_squad_size: u32,
    /// Squad composition targets, surfaced in snapshots.
    pub min_batsmen: u32,
    pub min_bowlers: u32,
    pub min_all_rounders: u32,
    pub min_wicket_keepers: u32,
    /// Fixed size of a submitted lineup.
    pub lineup_size: u32,
    /// Maximum foreign players permitted in a lineup.
    pub max_foreign_players: u32,
    /// Country the foreign classification compares against (case-insensitive).
    pub home_country: String,
}

impl Default for AuctionRules {
    fn default() -> Self {
        Self {
            total_purse: Decimal::new(100, 0),
            max_squad_size: 15,
            min_batsmen: 5,
            min_bowlers: 5,
            min_all_rounders: 2,
            min_wicket_keepers: 1,
            lineup_size: 11,
            max_foreign_players: 4,
            home_country: "India".to_string(),
        }
    }
}

impl AuctionRules {
    /// Returns true if the player's country counts as foreign under these rules.
    pub fn is_foreign(&self, country: &str) -> bool {
        !country.eq_ignore_ascii_case(&self.home_country)
    }
}

/// An auctionable player, imported once per room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Engine-assigned identifier, stable for the room's lifetime.
    pub id: String,
    pub name: String,
    pub role: PlayerRole,
    pub country: String,
    /// Floor price for the bidding episode.
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    pub stats: CareerStats,
    pub status: PlayerStatus,
    /// Final price when sold.
    pub sold_price: Option<Decimal>,
    /// User id of the owning team when sold.
    pub sold_to: Option<String>,
    /// Import-order index. Default iteration order; never recomputed.
    pub order: u32,
}

impl Player {
    pub fn is_sold(&self) -> bool {
        self.status == PlayerStatus::Sold
    }
}

// ============================================================================
// Persistence records (one row per durable entity, latest row wins)
// ============================================================================

/// Durable record for one room.
#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct RoomRecord {
    pub room_code: String,
    pub name: String,
    /// User id of the auctioneer who created the room.
    pub auctioneer: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_purse: Decimal,
    pub max_squad_size: u32,
    pub lineup_size: u32,
    pub max_foreign_players: u32,
    pub home_country: String,
    /// Currently offered player id; empty when no episode is live.
    pub current_player: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable record for one team in a room.
#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct TeamRecord {
    pub room_code: String,
    pub user_id: String,
    pub team_name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub purse_remaining: Decimal,
    /// Acquired player ids in acquisition order.
    pub player_ids: Vec<String>,
    /// Stored lineup serialized as JSON; empty when none.
    pub lineup_json: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable record for one player in a room.
#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct PlayerRecord {
    pub room_code: String,
    pub player_id: String,
    pub name: String,
    pub role: String,
    pub country: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    pub matches: u32,
    pub runs: u32,
    pub wickets: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub average: Decimal,
    pub status: String,
    /// Zero while unsold.
    #[serde(with = "rust_decimal::serde::str")]
    pub sold_price: Decimal,
    /// Empty while unsold.
    pub sold_to: String,
    pub import_order: u32,
    pub updated_at: DateTime<Utc>,
}

/// Append-only log entry for a sale or its reversal.
#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct SaleRecord {
    pub room_code: String,
    pub player_id: String,
    pub team_user_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    /// 1 when this entry reverses an earlier sale.
    pub reverted: u8,
    pub recorded_at: DateTime<Utc>,
}
