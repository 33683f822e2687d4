//! Best-effort durability pump.
//!
//! Room coordinators push state over a bounded channel with `try_send`; a
//! full channel or a ClickHouse outage never blocks or fails the auction.
//! Rows accumulate in auto-committing inserters, so a burst of room updates
//! flushes in batches rather than one HTTP insert per event. Rooms are
//! stored as replacing rows keyed by room code, sales as an append-only log.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clickhouse::inserter::Inserter;
use gavel_common::{GavelStore, PlayerRecord, RoomRecord, SaleRecord, StoreError, TeamRecord};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Depth of the coordinator-to-pump channel.
pub const CHANNEL_DEPTH: usize = 1024;

/// One unit of durable work.
#[derive(Debug, Clone)]
pub enum PersistenceEvent {
    /// Latest full state of one room; replaces earlier versions on merge.
    RoomState {
        room: RoomRecord,
        teams: Vec<TeamRecord>,
        players: Vec<PlayerRecord>,
    },
    /// Append-only entry for a hammer or a reversal.
    Sale(SaleRecord),
}

/// Counters for the pump, logged on shutdown.
#[derive(Debug, Default)]
pub struct PumpStats {
    pub states_written: AtomicU64,
    pub sales_written: AtomicU64,
    pub write_errors: AtomicU64,
}

impl PumpStats {
    pub fn log_stats(&self) {
        info!(
            states_written = self.states_written.load(Ordering::Relaxed),
            sales_written = self.sales_written.load(Ordering::Relaxed),
            write_errors = self.write_errors.load(Ordering::Relaxed),
            "Persistence pump stats"
        );
    }
}

/// The four table inserters the pump feeds.
struct Writers {
    rooms: Inserter<RoomRecord>,
    teams: Inserter<TeamRecord>,
    players: Inserter<PlayerRecord>,
    sales: Inserter<SaleRecord>,
}

impl Writers {
    fn open(store: &GavelStore) -> Result<Self, StoreError> {
        Ok(Self {
            rooms: store.room_inserter()?,
            teams: store.team_inserter()?,
            players: store.player_inserter()?,
            sales: store.sale_inserter()?,
        })
    }

    fn write_state(
        &mut self,
        room: &RoomRecord,
        teams: &[TeamRecord],
        players: &[PlayerRecord],
    ) -> Result<(), StoreError> {
        self.rooms.write(room)?;
        for team in teams {
            self.teams.write(team)?;
        }
        for player in players {
            self.players.write(player)?;
        }
        Ok(())
    }

    /// Flushes whichever inserters have hit their row, byte, or time limit.
    async fn commit(&mut self) -> Result<(), StoreError> {
        self.rooms.commit().await?;
        self.teams.commit().await?;
        self.players.commit().await?;
        self.sales.commit().await?;
        Ok(())
    }

    /// Flushes everything still buffered.
    async fn end(self) -> Result<(), StoreError> {
        self.rooms.end().await?;
        self.teams.end().await?;
        self.players.end().await?;
        self.sales.end().await?;
        Ok(())
    }
}

/// Spawns the pump task. Drains the channel until all senders drop.
pub fn spawn_pump(
    store: GavelStore,
    mut rx: mpsc::Receiver<PersistenceEvent>,
    stats: Arc<PumpStats>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut writers = match Writers::open(&store) {
            Ok(writers) => writers,
            Err(e) => {
                error!(error = %e, "Failed to open store inserters; persistence disabled");
                return;
            }
        };
        info!("Persistence pump started");

        while let Some(event) = rx.recv().await {
            match event {
                PersistenceEvent::RoomState {
                    room,
                    teams,
                    players,
                } => match writers.write_state(&room, &teams, &players) {
                    Ok(()) => {
                        debug!(room = %room.room_code, "Room state queued for flush");
                        stats.states_written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!(room = %room.room_code, error = %e, "Failed to write room state");
                        stats.write_errors.fetch_add(1, Ordering::Relaxed);
                    }
                },
                PersistenceEvent::Sale(record) => match writers.sales.write(&record) {
                    Ok(()) => {
                        debug!(room = %record.room_code, player = %record.player_id, "Sale queued for flush");
                        stats.sales_written.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        warn!(room = %record.room_code, error = %e, "Failed to write sale");
                        stats.write_errors.fetch_add(1, Ordering::Relaxed);
                    }
                },
            }

            if let Err(e) = writers.commit().await {
                warn!(error = %e, "Store flush failed");
                stats.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Err(e) = writers.end().await {
            warn!(error = %e, "Final store flush failed");
            stats.write_errors.fetch_add(1, Ordering::Relaxed);
        }
        stats.log_stats();
        info!("Persistence pump stopped");
    })
}
