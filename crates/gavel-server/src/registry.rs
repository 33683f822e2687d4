//! Registry of live rooms, keyed by their short join codes.
//!
//! Rooms this process created live in the map. A lookup that misses falls
//! back to the store: the latest durable records are read back and replayed
//! into a fresh aggregate, so rooms survive a server restart.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use dashmap::DashMap;
use gavel_common::{
    AuctionRules, CareerStats, GavelStore, Player, PlayerRecord, PlayerRole, PlayerStatus,
    RoomRecord, RoomStatus, TeamRecord,
};
use gavel_engine::{AuctionRoom, LineupSelection, RestoredRoom, RestoredTeam};
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::coordinator::{spawn_room, RoomHandle};
use crate::persist::PersistenceEvent;

/// Alphabet for join codes. Unambiguous enough to read out loud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// All live rooms on this server.
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
    mailbox_depth: usize,
    mailbox_timeout: Duration,
    persistence: Option<mpsc::Sender<PersistenceEvent>>,
    store: Option<GavelStore>,
}

impl RoomRegistry {
    pub fn new(
        config: &ServerConfig,
        persistence: Option<mpsc::Sender<PersistenceEvent>>,
        store: Option<GavelStore>,
    ) -> Self {
        Self {
            rooms: DashMap::new(),
            mailbox_depth: config.mailbox_depth,
            mailbox_timeout: config.mailbox_timeout,
            persistence,
            store,
        }
    }

    /// Creates a room under a fresh join code and spawns its coordinator.
    pub fn create_room(&self, name: &str, auctioneer: &str, rules: AuctionRules) -> RoomHandle {
        loop {
            let code = generate_code();
            // Entry-based insert keeps the vacancy check and the insert as
            // one step even with concurrent creators.
            match self.rooms.entry(code.clone()) {
                dashmap::mapref::entry::Entry::Occupied(_) => continue,
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    let room = AuctionRoom::new(&code, name, auctioneer, rules);
                    let handle = spawn_room(
                        room,
                        self.mailbox_depth,
                        self.mailbox_timeout,
                        self.persistence.clone(),
                    );
                    slot.insert(handle.clone());
                    info!(room = %code, name, auctioneer, "Room created");
                    return handle;
                }
            }
        }
    }

    pub fn get(&self, room_code: &str) -> Option<RoomHandle> {
        self.rooms.get(room_code).map(|entry| entry.value().clone())
    }

    /// Looks up a live room, falling back to durable state for rooms this
    /// process has not seen since its last restart.
    pub async fn lookup_or_restore(&self, room_code: &str) -> Option<RoomHandle> {
        if let Some(handle) = self.get(room_code) {
            return Some(handle);
        }
        let store = self.store.as_ref()?;

        let record = match store.load_room(room_code).await {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                warn!(room = %room_code, error = %e, "Store lookup failed");
                return None;
            }
        };
        let (teams, players) = match tokio::try_join!(
            store.load_teams(room_code),
            store.load_players(room_code)
        ) {
            Ok(parts) => parts,
            Err(e) => {
                warn!(room = %room_code, error = %e, "Store lookup failed");
                return None;
            }
        };

        let room = match rebuild_room(record, teams, players) {
            Ok(room) => room,
            Err(e) => {
                warn!(room = %room_code, error = %e, "Stored room state is unusable");
                return None;
            }
        };

        // Concurrent restorers: the first insert wins, the rest reuse it.
        match self.rooms.entry(room_code.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => Some(entry.get().clone()),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let handle = spawn_room(
                    room,
                    self.mailbox_depth,
                    self.mailbox_timeout,
                    self.persistence.clone(),
                );
                slot.insert(handle.clone());
                info!(room = %room_code, "Room restored from store");
                Some(handle)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Maps durable records back onto the aggregate's restore input.
fn rebuild_room(
    record: RoomRecord,
    teams: Vec<TeamRecord>,
    players: Vec<PlayerRecord>,
) -> anyhow::Result<AuctionRoom> {
    let status = RoomStatus::from_str(&record.status).map_err(anyhow::Error::msg)?;
    let rules = AuctionRules {
        total_purse: record.total_purse,
        max_squad_size: record.max_squad_size,
        lineup_size: record.lineup_size,
        max_foreign_players: record.max_foreign_players,
        home_country: record.home_country,
        ..AuctionRules::default()
    };
    let recorded_purses: Vec<(String, rust_decimal::Decimal)> = teams
        .iter()
        .map(|t| (t.user_id.clone(), t.purse_remaining))
        .collect();

    let players = players
        .into_iter()
        .map(restore_player)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let teams = teams
        .into_iter()
        .map(restore_team)
        .collect::<anyhow::Result<Vec<_>>>()?;
    let current_player = (!record.current_player.is_empty()).then_some(record.current_player);

    let room = AuctionRoom::restore(RestoredRoom {
        code: record.room_code,
        name: record.name,
        auctioneer: record.auctioneer,
        status,
        rules,
        players,
        teams,
        current_player,
    })?;

    for team in room.teams() {
        let replayed = team.ledger().purse_remaining();
        if let Some((_, recorded)) = recorded_purses.iter().find(|(id, _)| id == team.user_id()) {
            if *recorded != replayed {
                warn!(
                    room = %room.code(),
                    user = %team.user_id(),
                    %recorded,
                    %replayed,
                    "Stored purse disagrees with replayed ledger"
                );
            }
        }
    }

    Ok(room)
}

fn restore_player(record: PlayerRecord) -> anyhow::Result<Player> {
    let role = PlayerRole::from_str(&record.role).map_err(anyhow::Error::msg)?;
    let status = PlayerStatus::from_str(&record.status).map_err(anyhow::Error::msg)?;
    let sold = status == PlayerStatus::Sold;
    Ok(Player {
        id: record.player_id,
        name: record.name,
        role,
        country: record.country,
        base_price: record.base_price,
        stats: CareerStats {
            matches: record.matches,
            runs: record.runs,
            wickets: record.wickets,
            average: record.average,
        },
        status,
        sold_price: sold.then_some(record.sold_price),
        sold_to: sold.then_some(record.sold_to).filter(|s| !s.is_empty()),
        order: record.import_order,
    })
}

fn restore_team(record: TeamRecord) -> anyhow::Result<RestoredTeam> {
    let lineup = if record.lineup_json.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<LineupSelection>(&record.lineup_json)
                .context("Invalid stored lineup")?,
        )
    };
    Ok(RestoredTeam {
        user_id: record.user_id,
        team_name: record.team_name,
        players: record.player_ids,
        lineup,
    })
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
