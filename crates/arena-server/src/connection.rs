use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use arena_core::{ClientEvent, PlayerId};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Unique identifier of one WebSocket connection. A reconnecting player gets
/// a fresh one, which lets the dispatcher ignore teardown signals from a
/// connection that has already been replaced.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnId(String);

impl ConnId {
    pub fn new() -> Self {
        Self(format!("conn_{}", Uuid::now_v7()))
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query parameters supplied at upgrade time.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub identity: Option<String>,
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
}

impl ConnectQuery {
    /// A usable binding needs a positive integer identity and a non-empty
    /// display name; anything else is rejected before the upgrade.
    pub fn into_binding(self) -> Option<(PlayerId, String)> {
        let player = PlayerId::parse_connect(self.identity.as_deref()?)?;
        let name = self.display_name?;
        if name.trim().is_empty() {
            return None;
        }
        Some((player, name))
    }
}

/// Everything the dispatcher consumes, funneled through one channel so all
/// core state mutations happen run-to-completion in a single task.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected {
        conn: ConnId,
        player: PlayerId,
        name: String,
        tx: mpsc::Sender<String>,
    },
    Inbound {
        player: PlayerId,
        event: ClientEvent,
    },
    Disconnected {
        conn: ConnId,
        player: PlayerId,
    },
}

/// Drive one WebSocket connection: announce it, pump frames both ways, and
/// signal teardown when either direction ends.
pub async fn handle_connection(
    socket: WebSocket,
    conn: ConnId,
    player: PlayerId,
    name: String,
    events: mpsc::Sender<ConnectionEvent>,
    max_send_queue: usize,
) {
    let (tx, mut rx) = mpsc::channel::<String>(max_send_queue);
    if events
        .send(ConnectionEvent::Connected {
            conn: conn.clone(),
            player,
            name,
            tx,
        })
        .await
        .is_err()
    {
        return;
    }
    tracing::info!(user = %player, conn = %conn, "WebSocket client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: forward queued events to the socket, pinging periodically so a
    // dead transport surfaces as a send error.
    let writer = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        ping_interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                frame = rx.recv() => {
                    match frame {
                        Some(text) => {
                            if ws_tx.send(WsMessage::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(WsMessage::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Reader: parse inbound frames into protocol events; anything that does
    // not parse is dropped at the boundary.
    let reader_player = player;
    let reader_events = events.clone();
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        if reader_events
                            .send(ConnectionEvent::Inbound { player: reader_player, event })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(user = %reader_player, %err, "dropping unparseable frame");
                    }
                },
                WsMessage::Close(_) => break,
                // axum answers pings itself; pongs need no bookkeeping here
                WsMessage::Ping(_) | WsMessage::Pong(_) => {}
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = writer => {},
        _ = reader => {},
    }

    let _ = events.send(ConnectionEvent::Disconnected { conn, player }).await;
    tracing::info!(user = %player, "WebSocket client disconnected");
}
