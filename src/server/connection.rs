//! WebSocket connection handling
//!
//! Each socket gets a reader (this task) feeding the hub and a writer task
//! draining the connection's outbox.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit};

use crate::error::Result;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::ConnectionId;

use super::listener::AppState;

/// Upgrade `GET /ws` to a relay connection
pub(crate) async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
) -> Response {
    // Check connection limit
    let permit = match state.connection_semaphore {
        Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        },
        None => None,
    };

    let connection = state.hub.next_connection_id();

    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_connection(socket, connection, peer_addr, state, permit))
}

async fn run_connection(
    socket: WebSocket,
    connection: ConnectionId,
    peer_addr: SocketAddr,
    state: AppState,
    _permit: Option<OwnedSemaphorePermit>,
) {
    tracing::debug!(connection = %connection, peer = %peer_addr, "New connection");

    let (ws_tx, ws_rx) = socket.split();
    let (tx, rx) = mpsc::channel::<ServerMessage>(state.config.outbound_buffer);

    state.hub.open(connection, Some(peer_addr), tx).await;

    let writer = tokio::spawn(async move {
        if let Err(e) = write_loop(ws_tx, rx).await {
            tracing::debug!(connection = %connection, error = %e, "Send failed");
        }
    });

    if let Err(e) = read_loop(ws_rx, connection, &state).await {
        tracing::debug!(connection = %connection, error = %e, "Connection error");
    }

    // Removing the outbox ends the writer once it has flushed
    state.hub.close(connection).await;
    let _ = writer.await;

    tracing::debug!(connection = %connection, "Connection closed");
}

/// Feed inbound messages to the hub until the peer leaves
async fn read_loop(
    mut ws_rx: SplitStream<WebSocket>,
    connection: ConnectionId,
    state: &AppState,
) -> Result<()> {
    while let Some(frame) = ws_rx.next().await {
        match frame? {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(message) => {
                    let sign_off = matches!(message, ClientMessage::SignOff(_));
                    state.hub.dispatch(connection, message).await;
                    if sign_off {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        connection = %connection,
                        error = %e,
                        "Undecodable message ignored"
                    );
                }
            },
            Message::Close(_) => break,
            Message::Binary(_) => {
                tracing::debug!(connection = %connection, "Binary message ignored");
            }
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    Ok(())
}

/// Drain the outbox onto the socket
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<ServerMessage>,
) -> Result<()> {
    while let Some(message) = rx.recv().await {
        let json = serde_json::to_string(&message)?;
        ws_tx.send(Message::Text(json.into())).await?;
    }

    ws_tx.close().await?;
    Ok(())
}
