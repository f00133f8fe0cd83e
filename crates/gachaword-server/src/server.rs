//! WebSocket server and connection handling.

use crate::host::PlayerSession;
use crate::protocol::{ClientMessage, ServerMessage};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use gachaword_core::{Dictionary, SessionConfig};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// One game session per connected player
    pub sessions: DashMap<Uuid, PlayerSession>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    config: SessionConfig,
    dictionary: Arc<Dictionary>,
    connections: AtomicU64,
}

impl ServerState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            player_senders: DashMap::new(),
            config,
            dictionary: Arc::new(Dictionary::standard()),
            connections: AtomicU64::new(0),
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Settings for the next connection.
    ///
    /// With a base seed every connection gets its own seed derived from it,
    /// so two players never share a word sequence.
    pub fn next_session_config(&self) -> SessionConfig {
        let n = self.connections.fetch_add(1, Ordering::Relaxed);
        SessionConfig {
            weights: self.config.weights,
            seed: self.config.seed.map(|seed| seed.wrapping_add(n)),
        }
    }

    /// Open a session for a newly connected player.
    pub fn open_session(&self, player_id: Uuid, sender: mpsc::UnboundedSender<ServerMessage>) {
        let session = PlayerSession::new(
            player_id,
            self.next_session_config(),
            Arc::clone(&self.dictionary),
            sender.clone(),
        );
        self.player_senders.insert(player_id, sender);
        self.sessions.insert(player_id, session);
    }

    /// Drop everything held for a player.
    pub fn close_session(&self, player_id: Uuid) {
        if let Some((_, player)) = self.sessions.remove(&player_id) {
            let stats = player.session().stats();
            info!(
                "Player {} left after {} games ({} wins)",
                player.id, stats.total_games, stats.total_wins
            );
        }
        self.player_senders.remove(&player_id);
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Gachaword server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Welcome goes out before the session's first events
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.open_session(player_id, tx);

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, text);
                    state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.close_session(player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    // Shard lock is released before replying
    let result = match state.sessions.get_mut(&player_id) {
        Some(mut player) => player.apply(msg),
        None => {
            warn!("Message from {} without a session", player_id);
            return;
        }
    };

    match result {
        Ok(Some(reply)) => state.send_to_player(player_id, reply),
        Ok(None) => {}
        Err(e) => {
            debug!("Rejected message from {}: {}", player_id, e);
            state.send_to_player(
                player_id,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}
