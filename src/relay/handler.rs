//! Relay protocol handler
//!
//! Synchronous state machine over the session table, the peer registry and
//! the stream store. Each call handles one event to completion and returns
//! the messages it produced; it never performs I/O itself.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;

use crate::protocol::{ClientMessage, ClientSummary, ServerMessage};
use crate::registry::{ConnectionId, Peer, PeerRegistry, PeerRole};
use crate::session::{ConnectionState, SessionState};
use crate::stream::{FramePayload, StreamEntry, StreamStore};

use super::config::{FanoutMode, RelayConfig};
use super::dispatch::Dispatch;
use super::error::RelayError;

/// A client and its latest frame, for the query surface
#[derive(Debug, Clone)]
pub struct ClientDetail {
    pub peer: Peer,
    pub stream: Option<Arc<StreamEntry>>,
}

/// Relay protocol state machine
#[derive(Debug, Default)]
pub struct RelayHandler {
    config: RelayConfig,

    /// Open connections, registered or not
    sessions: HashMap<ConnectionId, SessionState>,

    peers: PeerRegistry,

    streams: StreamStore,
}

impl RelayHandler {
    /// Create a handler with default configuration
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    /// Create a handler with custom configuration
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            config,
            sessions: HashMap::new(),
            peers: PeerRegistry::new(),
            streams: StreamStore::new(),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn streams(&self) -> &StreamStore {
        &self.streams
    }

    /// Session of an open connection
    pub fn session(&self, connection: ConnectionId) -> Option<&SessionState> {
        self.sessions.get(&connection)
    }

    /// Number of open connections
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Track a newly accepted connection
    pub fn open(&mut self, connection: ConnectionId, peer_addr: Option<SocketAddr>) {
        tracing::debug!(connection = %connection, peer = ?peer_addr, "Connection opened");
        self.sessions
            .insert(connection, SessionState::new(connection, peer_addr));
    }

    /// Handle one inbound message
    ///
    /// Messages for connections that are not open are ignored. Rejected
    /// events are answered on the sending connection where the protocol
    /// defines an error reply.
    pub fn handle(&mut self, connection: ConnectionId, message: ClientMessage) -> Dispatch {
        let event = message.event_name();

        match self.sessions.get_mut(&connection) {
            Some(session) => session.messages_received += 1,
            None => {
                tracing::debug!(connection = %connection, event = event, "Message for unknown connection");
                return Dispatch::new();
            }
        }

        let result = match message {
            ClientMessage::ClientConnect {
                client_id,
                client_name,
            } => self.connect(connection, PeerRole::Client, &client_id, &client_name),
            ClientMessage::ViewerConnect {
                viewer_id,
                viewer_name,
            } => self.connect(connection, PeerRole::Viewer, &viewer_id, &viewer_name),
            ClientMessage::ScreenStream {
                client_id,
                image_data,
                timestamp,
                quality,
            } => self.frame(connection, client_id, image_data, timestamp, quality),
            ClientMessage::RequestStream { client_id } => {
                self.request_stream(connection, &client_id)
            }
            ClientMessage::RemoteControl {
                client_id,
                action,
                params,
            } => self.remote_control(connection, client_id, action, params),
            ClientMessage::ClientStatus {
                client_id,
                status,
                details,
            } => self.client_status(connection, client_id, status, details),
            ClientMessage::SignOff(_) => Ok(self.close(connection)),
        };

        match result {
            Ok(dispatch) => dispatch,
            Err(err) => {
                tracing::warn!(
                    connection = %connection,
                    event = event,
                    error = %err,
                    "Event rejected"
                );
                err.reply_for(event)
                    .map(|reply| Dispatch::reply(connection, reply))
                    .unwrap_or_default()
            }
        }
    }

    /// Tear down a connection
    ///
    /// Idempotent. Closing a client drops its stream and tells viewers it
    /// left.
    pub fn close(&mut self, connection: ConnectionId) -> Dispatch {
        let Some(mut session) = self.sessions.remove(&connection) else {
            return Dispatch::new();
        };
        session.close();

        tracing::debug!(
            connection = %connection,
            duration_secs = session.duration().as_secs(),
            messages = session.messages_received,
            frames = session.frames_accepted,
            "Connection closed"
        );

        let Some(peer) = self.peers.remove(connection) else {
            return Dispatch::new();
        };
        if !peer.is_client() {
            return Dispatch::new();
        }

        self.streams.remove(&peer.business_id);

        let targets = self.fanout_targets(connection);
        let mut dispatch = Dispatch::new();
        dispatch.fan_out(
            targets.iter().copied(),
            ServerMessage::ClientDisconnected {
                client_id: peer.business_id.clone(),
                client_name: peer.display_name.clone(),
                timestamp: Utc::now(),
            },
        );
        dispatch.fan_out(
            targets,
            ServerMessage::ClientListUpdated {
                clients: self.client_summaries(),
            },
        );
        dispatch
    }

    /// Connected clients with their streaming flag
    pub fn client_summaries(&self) -> Vec<ClientSummary> {
        self.peers
            .list_by_role(PeerRole::Client)
            .into_iter()
            .map(|peer| ClientSummary::new(peer, self.streams.contains(&peer.business_id)))
            .collect()
    }

    /// A connected client and its latest frame
    pub fn client_detail(&self, client_id: &str) -> Option<ClientDetail> {
        let peer = self.peers.find_by_business_id(PeerRole::Client, client_id)?;
        Some(ClientDetail {
            peer: peer.clone(),
            stream: self.streams.get(client_id),
        })
    }

    /// Drop all connections, peers and streams
    pub fn clear(&mut self) {
        self.sessions.clear();
        self.peers.clear();
        self.streams.clear();
    }

    fn state_of(&self, connection: ConnectionId) -> ConnectionState {
        self.sessions
            .get(&connection)
            .map(|s| s.state)
            .unwrap_or(ConnectionState::Closed)
    }

    /// Connections that receive frames, status updates and list changes
    fn fanout_targets(&self, sender: ConnectionId) -> Vec<ConnectionId> {
        match self.config.fanout {
            FanoutMode::Targeted => self
                .peers
                .connections_by_role(PeerRole::Viewer)
                .into_iter()
                .filter(|c| *c != sender)
                .collect(),
            FanoutMode::Broadcast => self.other_connections(sender),
        }
    }

    fn other_connections(&self, sender: ConnectionId) -> Vec<ConnectionId> {
        self.sessions
            .keys()
            .copied()
            .filter(|c| *c != sender)
            .collect()
    }

    fn connect(
        &mut self,
        connection: ConnectionId,
        role: PeerRole,
        business_id: &str,
        display_name: &str,
    ) -> Result<Dispatch, RelayError> {
        let event = match role {
            PeerRole::Client => "client-connect",
            PeerRole::Viewer => "viewer-connect",
        };

        let state = self.state_of(connection);
        if state != ConnectionState::Unregistered {
            return Err(RelayError::InvalidState { event, state });
        }
        if business_id.trim().is_empty() {
            return Err(RelayError::Validation(format!("{} id is required", role)));
        }

        let peer = self
            .peers
            .register(connection, role, business_id, display_name)?
            .clone();

        if let Some(session) = self.sessions.get_mut(&connection) {
            session
                .register(role)
                .map_err(|t| RelayError::InvalidState { event, state: t.from })?;
        }

        let mut dispatch = Dispatch::new();
        match role {
            PeerRole::Client => {
                dispatch.push(
                    connection,
                    ServerMessage::ClientConnected {
                        client_id: peer.business_id.clone(),
                        client_name: peer.display_name.clone(),
                        message: "connected".into(),
                    },
                );
                dispatch.fan_out(
                    self.fanout_targets(connection),
                    ServerMessage::ClientListUpdated {
                        clients: self.client_summaries(),
                    },
                );
            }
            PeerRole::Viewer => {
                dispatch.push(
                    connection,
                    ServerMessage::AvailableClients {
                        clients: self.client_summaries(),
                    },
                );
                dispatch.push(
                    connection,
                    ServerMessage::ViewerConnected {
                        viewer_id: peer.business_id.clone(),
                        viewer_name: peer.display_name.clone(),
                        message: "connected".into(),
                    },
                );
            }
        }

        Ok(dispatch)
    }

    fn frame(
        &mut self,
        connection: ConnectionId,
        claimed_id: Option<String>,
        payload: Option<FramePayload>,
        captured_at: Option<u64>,
        quality: Option<String>,
    ) -> Result<Dispatch, RelayError> {
        let payload = payload
            .filter(|p| !p.is_empty())
            .ok_or_else(|| RelayError::Validation("incomplete frame: imageData is missing or malformed".into()))?;
        let captured_at = captured_at
            .ok_or_else(|| RelayError::Validation("incomplete frame: timestamp is missing or malformed".into()))?;

        let state = self.state_of(connection);
        if state != ConnectionState::RegisteredAsClient {
            return Err(RelayError::InvalidState {
                event: "screen-stream",
                state,
            });
        }

        let client_id = self
            .peers
            .find(connection)
            .filter(|p| p.is_client())
            .map(|p| p.business_id.clone())
            .ok_or_else(|| RelayError::NotFound(claimed_id.clone().unwrap_or_default()))?;

        if let Some(claimed) = claimed_id {
            if claimed != client_id {
                return Err(RelayError::Validation(format!(
                    "clientId {} does not match registered client {}",
                    claimed, client_id
                )));
            }
        }

        let entry = self.streams.put(&client_id, payload, captured_at, quality);
        if let Some(session) = self.sessions.get_mut(&connection) {
            session.frames_accepted += 1;
        }

        let mut dispatch = Dispatch::new();
        dispatch.fan_out(
            self.fanout_targets(connection),
            ServerMessage::screen_update(&entry),
        );
        if self.config.ack_frames {
            dispatch.push(
                connection,
                ServerMessage::StreamReceived {
                    client_id,
                    timestamp: captured_at,
                    message: "frame received".into(),
                },
            );
        }

        Ok(dispatch)
    }

    fn request_stream(
        &mut self,
        connection: ConnectionId,
        client_id: &str,
    ) -> Result<Dispatch, RelayError> {
        let state = self.state_of(connection);
        if state != ConnectionState::RegisteredAsViewer {
            return Err(RelayError::InvalidState {
                event: "request-stream",
                state,
            });
        }

        match self.streams.get(client_id) {
            Some(entry) => Ok(Dispatch::reply(
                connection,
                ServerMessage::screen_update(&entry),
            )),
            None => {
                tracing::debug!(
                    connection = %connection,
                    client_id = client_id,
                    "No stream for requested client"
                );
                Ok(Dispatch::new())
            }
        }
    }

    fn remote_control(
        &mut self,
        connection: ConnectionId,
        target_id: String,
        action: String,
        params: serde_json::Value,
    ) -> Result<Dispatch, RelayError> {
        let state = self.state_of(connection);
        if !state.is_registered() {
            return Err(RelayError::InvalidState {
                event: "remote-control",
                state,
            });
        }

        let targets = match self.config.fanout {
            FanoutMode::Targeted => {
                let target = self
                    .peers
                    .find_by_business_id(PeerRole::Client, &target_id)
                    .map(|p| p.connection)
                    .filter(|c| *c != connection)
                    .ok_or_else(|| RelayError::NotFound(target_id.clone()))?;
                vec![target]
            }
            FanoutMode::Broadcast => self.other_connections(connection),
        };

        tracing::debug!(
            connection = %connection,
            client_id = %target_id,
            action = %action,
            "Forwarding remote command"
        );

        let mut dispatch = Dispatch::new();
        dispatch.fan_out(
            targets,
            ServerMessage::RemoteCommand {
                client_id: target_id,
                action,
                params,
                timestamp: Utc::now(),
            },
        );
        Ok(dispatch)
    }

    fn client_status(
        &mut self,
        connection: ConnectionId,
        claimed_id: Option<String>,
        status: String,
        details: serde_json::Value,
    ) -> Result<Dispatch, RelayError> {
        let state = self.state_of(connection);
        if state != ConnectionState::RegisteredAsClient {
            return Err(RelayError::InvalidState {
                event: "client-status",
                state,
            });
        }

        let client_id = self
            .peers
            .find(connection)
            .map(|p| p.business_id.clone())
            .ok_or_else(|| RelayError::NotFound(claimed_id.clone().unwrap_or_default()))?;

        if let Some(claimed) = claimed_id {
            if claimed != client_id {
                return Err(RelayError::Validation(format!(
                    "clientId {} does not match registered client {}",
                    claimed, client_id
                )));
            }
        }

        let mut dispatch = Dispatch::new();
        dispatch.fan_out(
            self.fanout_targets(connection),
            ServerMessage::ClientStatusUpdate {
                client_id,
                status,
                details,
                timestamp: Utc::now(),
            },
        );
        Ok(dispatch)
    }
}
