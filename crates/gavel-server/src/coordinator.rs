//! Per-room coordinator tasks.
//!
//! Every room runs as one tokio task owning its `AuctionRoom` outright.
//! Callers talk to it through a bounded mailbox and get replies over
//! oneshot channels, so all mutations of one room are applied in a single
//! total order. Successful mutations are fanned out to subscribers over a
//! broadcast channel and pushed to the persistence pump without blocking.

use std::time::Duration;

use chrono::Utc;
use gavel_common::{PlayerRecord, RoomRecord, RoomStatus, SaleRecord, TeamRecord};
use gavel_engine::{
    AuctionRoom, LineupSelection, PlayerImportRow, RoomDelta, RoomError, RoomSnapshot,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::mpsc::error::{SendTimeoutError, TrySendError};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::persist::PersistenceEvent;
use crate::protocol::ServerEvent;

/// Events a slow subscriber may lag behind before missing some.
const EVENT_BUFFER: usize = 256;

type Reply = oneshot::Sender<Result<RoomDelta, RoomError>>;

/// Commands accepted by a room coordinator.
pub enum RoomCommand {
    Join {
        user_id: String,
        team_name: String,
        reply: Reply,
    },
    ImportPlayers {
        caller: String,
        rows: Vec<PlayerImportRow>,
        reply: Reply,
    },
    SetStatus {
        caller: String,
        status: RoomStatus,
        reply: Reply,
    },
    Offer {
        caller: String,
        player_id: String,
        reply: Reply,
    },
    Bid {
        user_id: String,
        player_id: String,
        price: Decimal,
        reply: Reply,
    },
    FinalizeSale {
        caller: String,
        player_id: String,
        team_user_id: String,
        price: Decimal,
        reply: Reply,
    },
    FinalizeUnsold {
        caller: String,
        player_id: String,
        reply: Reply,
    },
    RevertSale {
        caller: String,
        player_id: String,
        reply: Reply,
    },
    UpdateLineup {
        user_id: String,
        selection: LineupSelection,
        reply: Reply,
    },
    /// Snapshot plus a receiver created in the same step, so the snapshot
    /// and the first delta the receiver sees are guaranteed contiguous.
    Subscribe {
        reply: oneshot::Sender<(RoomSnapshot, broadcast::Receiver<ServerEvent>)>,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    /// Passthrough broadcast for chat and presence; does not touch state.
    Broadcast { event: ServerEvent },
}

/// Errors raised by the mailbox itself, on top of room rejections.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error("Room is busy; retry shortly")]
    Busy,
    #[error("Room is no longer available")]
    Closed,
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl CallError {
    pub fn code(&self) -> &'static str {
        match self {
            CallError::Busy => "ROOM_BUSY",
            CallError::Closed => "ROOM_GONE",
            CallError::Room(err) => err.code(),
        }
    }

    /// True when the caller should simply try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CallError::Busy)
    }
}

/// Cheap clonable handle to one room's coordinator.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: String,
    tx: mpsc::Sender<RoomCommand>,
    timeout: Duration,
}

impl RoomHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), CallError> {
        self.tx
            .send_timeout(cmd, self.timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => CallError::Busy,
                SendTimeoutError::Closed(_) => CallError::Closed,
            })
    }

    async fn call<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, CallError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        // A reply that never comes within the window counts as contention,
        // not a dead room; the caller may retry.
        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(CallError::Closed),
            Err(_) => Err(CallError::Busy),
        }
    }

    async fn apply(
        &self,
        make: impl FnOnce(Reply) -> RoomCommand,
    ) -> Result<RoomDelta, CallError> {
        Ok(self.call(make).await??)
    }

    /// Atomically takes a snapshot and starts a subscription at that point.
    pub async fn subscribe(
        &self,
    ) -> Result<(RoomSnapshot, broadcast::Receiver<ServerEvent>), CallError> {
        self.call(|reply| RoomCommand::Subscribe { reply }).await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, CallError> {
        self.call(|reply| RoomCommand::Snapshot { reply }).await
    }

    pub async fn join(&self, user_id: &str, team_name: &str) -> Result<RoomDelta, CallError> {
        let (user_id, team_name) = (user_id.to_string(), team_name.to_string());
        self.apply(|reply| RoomCommand::Join {
            user_id,
            team_name,
            reply,
        })
        .await
    }

    pub async fn import_players(
        &self,
        caller: &str,
        rows: Vec<PlayerImportRow>,
    ) -> Result<RoomDelta, CallError> {
        let caller = caller.to_string();
        self.apply(|reply| RoomCommand::ImportPlayers { caller, rows, reply })
            .await
    }

    pub async fn set_status(&self, caller: &str, status: RoomStatus) -> Result<RoomDelta, CallError> {
        let caller = caller.to_string();
        self.apply(|reply| RoomCommand::SetStatus {
            caller,
            status,
            reply,
        })
        .await
    }

    pub async fn offer_player(&self, caller: &str, player_id: &str) -> Result<RoomDelta, CallError> {
        let (caller, player_id) = (caller.to_string(), player_id.to_string());
        self.apply(|reply| RoomCommand::Offer {
            caller,
            player_id,
            reply,
        })
        .await
    }

    pub async fn place_bid(
        &self,
        user_id: &str,
        player_id: &str,
        price: Decimal,
    ) -> Result<RoomDelta, CallError> {
        let (user_id, player_id) = (user_id.to_string(), player_id.to_string());
        self.apply(|reply| RoomCommand::Bid {
            user_id,
            player_id,
            price,
            reply,
        })
        .await
    }

    pub async fn finalize_sale(
        &self,
        caller: &str,
        player_id: &str,
        team_user_id: &str,
        price: Decimal,
    ) -> Result<RoomDelta, CallError> {
        let (caller, player_id, team_user_id) = (
            caller.to_string(),
            player_id.to_string(),
            team_user_id.to_string(),
        );
        self.apply(|reply| RoomCommand::FinalizeSale {
            caller,
            player_id,
            team_user_id,
            price,
            reply,
        })
        .await
    }

    pub async fn finalize_unsold(&self, caller: &str, player_id: &str) -> Result<RoomDelta, CallError> {
        let (caller, player_id) = (caller.to_string(), player_id.to_string());
        self.apply(|reply| RoomCommand::FinalizeUnsold {
            caller,
            player_id,
            reply,
        })
        .await
    }

    pub async fn revert_sale(&self, caller: &str, player_id: &str) -> Result<RoomDelta, CallError> {
        let (caller, player_id) = (caller.to_string(), player_id.to_string());
        self.apply(|reply| RoomCommand::RevertSale {
            caller,
            player_id,
            reply,
        })
        .await
    }

    pub async fn update_lineup(
        &self,
        user_id: &str,
        selection: LineupSelection,
    ) -> Result<RoomDelta, CallError> {
        let user_id = user_id.to_string();
        self.apply(|reply| RoomCommand::UpdateLineup {
            user_id,
            selection,
            reply,
        })
        .await
    }

    /// Broadcasts a non-state event to all subscribers.
    pub async fn broadcast(&self, event: ServerEvent) -> Result<(), CallError> {
        self.send(RoomCommand::Broadcast { event }).await
    }
}

/// Spawns the coordinator task for a room and returns its handle.
pub fn spawn_room(
    room: AuctionRoom,
    mailbox_depth: usize,
    mailbox_timeout: Duration,
    persistence: Option<mpsc::Sender<PersistenceEvent>>,
) -> RoomHandle {
    let code = room.code().to_string();
    let (tx, rx) = mpsc::channel(mailbox_depth);
    let (events, _) = broadcast::channel(EVENT_BUFFER);

    tokio::spawn(run_room(room, rx, events, persistence));

    RoomHandle {
        code,
        tx,
        timeout: mailbox_timeout,
    }
}

async fn run_room(
    mut room: AuctionRoom,
    mut rx: mpsc::Receiver<RoomCommand>,
    events: broadcast::Sender<ServerEvent>,
    persistence: Option<mpsc::Sender<PersistenceEvent>>,
) {
    info!(room = %room.code(), "Room coordinator started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            RoomCommand::Join {
                user_id,
                team_name,
                reply,
            } => {
                let result = room.join_team(&user_id, &team_name);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::ImportPlayers { caller, rows, reply } => {
                let result = room.import_players(&caller, rows);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::SetStatus {
                caller,
                status,
                reply,
            } => {
                let result = room.set_status(&caller, status);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::Offer {
                caller,
                player_id,
                reply,
            } => {
                let result = room.offer_player(&caller, &player_id);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::Bid {
                user_id,
                player_id,
                price,
                reply,
            } => {
                let result = room.place_bid(&user_id, &player_id, price);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::FinalizeSale {
                caller,
                player_id,
                team_user_id,
                price,
                reply,
            } => {
                let result = room.finalize_sale(&caller, &player_id, &team_user_id, price);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::FinalizeUnsold {
                caller,
                player_id,
                reply,
            } => {
                let result = room.finalize_unsold(&caller, &player_id);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::RevertSale {
                caller,
                player_id,
                reply,
            } => {
                let result = room.revert_sale(&caller, &player_id);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::UpdateLineup {
                user_id,
                selection,
                reply,
            } => {
                let result = room.update_lineup(&user_id, selection);
                settle(&room, &events, persistence.as_ref(), &result);
                let _ = reply.send(result);
            }
            RoomCommand::Subscribe { reply } => {
                // Taken inside the mailbox, so no delta can slip between the
                // snapshot and the receiver's first event.
                let _ = reply.send((room.snapshot(), events.subscribe()));
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(room.snapshot());
            }
            RoomCommand::Broadcast { event } => {
                let _ = events.send(event);
            }
        }
    }

    info!(room = %room.code(), "Room coordinator stopped");
}

/// Fan-out and persistence for one settled operation.
fn settle(
    room: &AuctionRoom,
    events: &broadcast::Sender<ServerEvent>,
    persistence: Option<&mpsc::Sender<PersistenceEvent>>,
    result: &Result<RoomDelta, RoomError>,
) {
    match result {
        Ok(delta) => {
            debug!(room = %room.code(), delta = delta.kind(), "Operation applied");
            let _ = events.send(ServerEvent::from_delta(room.code(), delta.clone()));
            if let Some(tx) = persistence {
                push_persistence(room, delta, tx);
            }
        }
        Err(err) if err.is_defect() => {
            warn!(room = %room.code(), code = err.code(), error = %err, "Operation replayed or misused");
        }
        Err(err) => {
            debug!(room = %room.code(), code = err.code(), "Operation rejected");
        }
    }
}

fn push_persistence(room: &AuctionRoom, delta: &RoomDelta, tx: &mpsc::Sender<PersistenceEvent>) {
    let push = |event: PersistenceEvent| match tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            warn!(room = %room.code(), "Persistence channel full; dropping update");
        }
        Err(TrySendError::Closed(_)) => {}
    };

    match delta {
        RoomDelta::PlayerSold {
            player,
            user_id,
            price,
            ..
        } => push(PersistenceEvent::Sale(SaleRecord {
            room_code: room.code().to_string(),
            player_id: player.id.clone(),
            team_user_id: user_id.clone(),
            price: *price,
            reverted: 0,
            recorded_at: Utc::now(),
        })),
        RoomDelta::SaleReverted {
            player,
            user_id,
            refund,
            ..
        } => push(PersistenceEvent::Sale(SaleRecord {
            room_code: room.code().to_string(),
            player_id: player.id.clone(),
            team_user_id: user_id.clone(),
            price: *refund,
            reverted: 1,
            recorded_at: Utc::now(),
        })),
        _ => {}
    }

    push(PersistenceEvent::RoomState {
        room: room_record(room),
        teams: team_records(room),
        players: player_records(room),
    });
}

fn room_record(room: &AuctionRoom) -> RoomRecord {
    let rules = room.rules();
    RoomRecord {
        room_code: room.code().to_string(),
        name: room.name().to_string(),
        auctioneer: room.auctioneer().to_string(),
        status: room.status().to_string(),
        total_purse: rules.total_purse,
        max_squad_size: rules.max_squad_size,
        lineup_size: rules.lineup_size,
        max_foreign_players: rules.max_foreign_players,
        home_country: rules.home_country.clone(),
        current_player: room
            .current_episode()
            .map(|ep| ep.player_id().to_string())
            .unwrap_or_default(),
        updated_at: Utc::now(),
    }
}

fn team_records(room: &AuctionRoom) -> Vec<TeamRecord> {
    room.teams()
        .iter()
        .map(|team| TeamRecord {
            room_code: room.code().to_string(),
            user_id: team.user_id().to_string(),
            team_name: team.team_name().to_string(),
            purse_remaining: team.ledger().purse_remaining(),
            player_ids: team
                .ledger()
                .acquisitions()
                .iter()
                .map(|a| a.player_id.clone())
                .collect(),
            lineup_json: team
                .lineup()
                .and_then(|l| serde_json::to_string(l).ok())
                .unwrap_or_default(),
            updated_at: Utc::now(),
        })
        .collect()
}

fn player_records(room: &AuctionRoom) -> Vec<PlayerRecord> {
    room.players()
        .iter()
        .map(|p| PlayerRecord {
            room_code: room.code().to_string(),
            player_id: p.id.clone(),
            name: p.name.clone(),
            role: p.role.to_string(),
            country: p.country.clone(),
            base_price: p.base_price,
            matches: p.stats.matches,
            runs: p.stats.runs,
            wickets: p.stats.wickets,
            average: p.stats.average,
            status: p.status.to_string(),
            sold_price: p.sold_price.unwrap_or_default(),
            sold_to: p.sold_to.clone().unwrap_or_default(),
            import_order: p.order,
            updated_at: Utc::now(),
        })
        .collect()
}
