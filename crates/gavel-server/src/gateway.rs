//! WebSocket gateway.
//!
//! One tokio-tungstenite server accepting auction clients. Each connection
//! identifies itself with a `hello` frame, then drives rooms through their
//! coordinator handles. Broadcast events from subscribed rooms are forwarded
//! through a per-client channel; rejections go back to the submitter only.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use gavel_common::ParticipantRole;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::coordinator::RoomHandle;
use crate::protocol::{ClientAction, ServerEvent};
use crate::registry::RoomRegistry;

/// Statistics for the gateway.
#[derive(Debug, Default)]
pub struct GatewayStats {
    pub connections_accepted: AtomicU64,
    pub active_connections: AtomicU64,
    pub actions_processed: AtomicU64,
    pub actions_rejected: AtomicU64,
}

impl GatewayStats {
    pub fn log_stats(&self) {
        info!(
            connections_accepted = self.connections_accepted.load(Ordering::Relaxed),
            active_connections = self.active_connections.load(Ordering::Relaxed),
            actions_processed = self.actions_processed.load(Ordering::Relaxed),
            actions_rejected = self.actions_rejected.load(Ordering::Relaxed),
            "Gateway stats"
        );
    }
}

/// The WebSocket listener and its shared state.
pub struct Gateway {
    config: ServerConfig,
    registry: Arc<RoomRegistry>,
    stats: Arc<GatewayStats>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Gateway {
    pub fn new(config: ServerConfig, registry: Arc<RoomRegistry>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            registry,
            stats: Arc::new(GatewayStats::default()),
            shutdown_tx,
        }
    }

    pub fn stats(&self) -> &Arc<GatewayStats> {
        &self.stats
    }

    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Runs the accept loop until shutdown is triggered.
    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.listen_addr).await?;
        info!(addr = %self.config.listen_addr, "Auction gateway listening");

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => self.handle_new_connection(stream, addr),
                        Err(e) => error!(error = %e, "Failed to accept connection"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Gateway shutting down");
                    break;
                }
            }
        }

        self.stats.log_stats();
        Ok(())
    }

    fn handle_new_connection(&self, stream: TcpStream, addr: SocketAddr) {
        // The slot is reserved before the task spawns, so a connect burst
        // cannot race past the cap.
        if !try_reserve_slot(&self.stats, self.config.max_clients as u64) {
            warn!(addr = %addr, max = self.config.max_clients, "Rejecting connection: max clients reached");
            return;
        }

        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!(addr = %addr, error = %e, "WebSocket handshake failed");
                    stats.active_connections.fetch_sub(1, Ordering::Relaxed);
                    return;
                }
            };

            stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
            debug!(addr = %addr, "Client connected");

            client_task(ws_stream, addr, registry, Arc::clone(&stats), shutdown_rx).await;

            stats.active_connections.fetch_sub(1, Ordering::Relaxed);
            debug!(addr = %addr, "Client disconnected");
        });
    }
}

/// Claims a connection slot, undoing the claim when the cap is hit.
fn try_reserve_slot(stats: &GatewayStats, max_clients: u64) -> bool {
    let active = stats.active_connections.fetch_add(1, Ordering::Relaxed);
    if active >= max_clients {
        stats.active_connections.fetch_sub(1, Ordering::Relaxed);
        return false;
    }
    true
}

/// Identity established by the `hello` frame.
#[derive(Debug, Clone)]
struct Session {
    user_id: String,
    username: String,
    role: ParticipantRole,
}

/// One subscribed room: its handle and the fan-out forwarder task.
struct Subscription {
    handle: RoomHandle,
    forwarder: tokio::task::JoinHandle<()>,
}

/// Per-connection state driven by the client's frames.
struct ClientConn {
    registry: Arc<RoomRegistry>,
    stats: Arc<GatewayStats>,
    out: mpsc::UnboundedSender<Message>,
    session: Option<Session>,
    rooms: HashMap<String, Subscription>,
}

async fn client_task(
    ws_stream: tokio_tungstenite::WebSocketStream<TcpStream>,
    addr: SocketAddr,
    registry: Arc<RoomRegistry>,
    stats: Arc<GatewayStats>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

    let mut conn = ClientConn {
        registry,
        stats,
        out: out_tx,
        session: None,
        rooms: HashMap::new(),
    };

    loop {
        tokio::select! {
            // Events queued for this client: direct replies and room fan-out.
            Some(msg) = out_rx.recv() => {
                if let Err(e) = ws_tx.send(msg).await {
                    debug!(addr = %addr, error = %e, "Failed to send frame");
                    break;
                }
            }
            frame = ws_rx.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => conn.handle_frame(&text).await,
                    Some(Ok(Message::Ping(data))) => {
                        if ws_tx.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(addr = %addr, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                let _ = ws_tx.send(Message::Close(None)).await;
                break;
            }
        }
    }

    conn.leave_all().await;
}

impl ClientConn {
    fn send_event(&self, event: &ServerEvent) {
        match serde_json::to_string(event) {
            Ok(json) => {
                let _ = self.out.send(Message::Text(json));
            }
            Err(e) => error!(error = %e, kind = event.kind(), "Failed to serialize event"),
        }
    }

    fn reject(&self, code: &str, message: impl Into<String>) {
        self.stats.actions_rejected.fetch_add(1, Ordering::Relaxed);
        self.send_event(&ServerEvent::error(code, message));
    }

    async fn handle_frame(&mut self, text: &str) {
        let action: ClientAction = match serde_json::from_str(text) {
            Ok(action) => action,
            Err(e) => {
                self.reject("BAD_REQUEST", format!("Unparseable action: {e}"));
                return;
            }
        };
        self.stats.actions_processed.fetch_add(1, Ordering::Relaxed);
        self.dispatch(action).await;
    }

    async fn dispatch(&mut self, action: ClientAction) {
        // The first frame must identify the participant.
        if let ClientAction::Hello {
            user_id,
            username,
            role,
        } = action
        {
            if self.session.is_some() {
                self.reject("ALREADY_IDENTIFIED", "Session is already identified");
                return;
            }
            debug!(user = %user_id, role = %role, "Session identified");
            self.session = Some(Session {
                user_id,
                username,
                role,
            });
            return;
        }
        let Some(session) = self.session.clone() else {
            self.reject("HELLO_REQUIRED", "First frame must be a hello action");
            return;
        };

        match action {
            ClientAction::Hello { .. } => unreachable!("handled above"),
            ClientAction::CreateRoom { name, rules } => {
                if session.role != ParticipantRole::Auctioneer {
                    self.reject("NOT_AUCTIONEER", "Only an auctioneer can create a room");
                    return;
                }
                let handle =
                    self.registry
                        .create_room(&name, &session.user_id, rules.unwrap_or_default());
                let room_code = handle.code().to_string();
                self.send_event(&ServerEvent::RoomCreated {
                    room_code: room_code.clone(),
                    name,
                });
                self.subscribe(handle).await;
            }
            ClientAction::Join { room_code, team_name } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                self.subscribe(handle.clone()).await;
                // Auctioneers and spectators observe; contestants field a team.
                if session.role == ParticipantRole::Contestant {
                    let team_name = if team_name.is_empty() {
                        session.username.clone()
                    } else {
                        team_name
                    };
                    if let Err(e) = handle.join(&session.user_id, &team_name).await {
                        self.reject(e.code(), e.to_string());
                    }
                }
            }
            ClientAction::ImportPlayers { room_code, players } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                let rows = players.into_iter().map(Into::into).collect();
                if let Err(e) = handle.import_players(&session.user_id, rows).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::SetStatus { room_code, status } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle.set_status(&session.user_id, status).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::Offer { room_code, player_id } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle.offer_player(&session.user_id, &player_id).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::Bid {
                room_code,
                player_id,
                price,
            } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                // Rejections are private to the bidder; accepted bids reach
                // everyone through the room broadcast.
                if let Err(e) = handle.place_bid(&session.user_id, &player_id, price).await {
                    self.stats.actions_rejected.fetch_add(1, Ordering::Relaxed);
                    self.send_event(&ServerEvent::BidRejected {
                        room_code,
                        player_id,
                        code: e.code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
            ClientAction::FinalizeSale {
                room_code,
                player_id,
                team_user_id,
                price,
            } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle
                    .finalize_sale(&session.user_id, &player_id, &team_user_id, price)
                    .await
                {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::FinalizeUnsold { room_code, player_id } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle.finalize_unsold(&session.user_id, &player_id).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::RevertSale { room_code, player_id } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle.revert_sale(&session.user_id, &player_id).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::UpdateLineup { room_code, lineup } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                if let Err(e) = handle.update_lineup(&session.user_id, lineup).await {
                    self.reject(e.code(), e.to_string());
                }
            }
            ClientAction::Chat { room_code, message } => {
                let Some(handle) = self.lookup(&room_code).await else {
                    return;
                };
                let event = ServerEvent::ChatMessage {
                    room_code,
                    user_id: session.user_id.clone(),
                    username: session.username.clone(),
                    message,
                    sent_at: chrono::Utc::now(),
                };
                if let Err(e) = handle.broadcast(event).await {
                    self.reject(e.code(), e.to_string());
                }
            }
        }
    }

    /// Resolves a room handle, consulting the store for rooms that are not
    /// live in this process yet.
    async fn lookup(&self, room_code: &str) -> Option<RoomHandle> {
        if let Some(sub) = self.rooms.get(room_code) {
            return Some(sub.handle.clone());
        }
        match self.registry.lookup_or_restore(room_code).await {
            Some(handle) => Some(handle),
            None => {
                self.reject("UNKNOWN_ROOM", format!("No room with code {room_code}"));
                None
            }
        }
    }

    /// Starts forwarding the room's broadcast stream to this client, after
    /// delivering the snapshot taken at the subscription point.
    async fn subscribe(&mut self, handle: RoomHandle) {
        let room_code = handle.code().to_string();
        if self.rooms.contains_key(&room_code) {
            // Re-joining an already watched room still warrants a fresh
            // snapshot for the client's local state.
            match handle.snapshot().await {
                Ok(room) => self.send_event(&ServerEvent::Snapshot { room }),
                Err(e) => self.reject(e.code(), e.to_string()),
            }
            return;
        }

        match handle.subscribe().await {
            Ok((snapshot, events)) => {
                self.send_event(&ServerEvent::Snapshot { room: snapshot });
                let forwarder = spawn_forwarder(room_code.clone(), events, self.out.clone());
                self.rooms.insert(room_code, Subscription { handle, forwarder });
            }
            Err(e) => self.reject(e.code(), e.to_string()),
        }
    }

    /// Drops all subscriptions, announcing the departure to each room.
    async fn leave_all(&mut self) {
        let session = self.session.take();
        for (room_code, sub) in self.rooms.drain() {
            sub.forwarder.abort();
            if let Some(session) = &session {
                let event = ServerEvent::ParticipantLeft {
                    room_code,
                    user_id: session.user_id.clone(),
                    username: session.username.clone(),
                };
                let _ = sub.handle.broadcast(event).await;
            }
        }
    }
}


fn spawn_forwarder(
    room_code: String,
    mut events: broadcast::Receiver<ServerEvent>,
    out: mpsc::UnboundedSender<Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(room = %room_code, error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if out.send(Message::Text(json)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(room = %room_code, skipped, "Client lagged behind room events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
