//! Connection state machine
//!
//! Tracks each WebSocket from accept to close. Registration moves a
//! connection out of `Unregistered` exactly once; `Closed` is terminal.

use std::net::SocketAddr;
use std::time::Instant;

use crate::registry::{ConnectionId, PeerRole};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket open, no successful connect yet
    Unregistered,
    /// Registered as a frame source
    RegisteredAsClient,
    /// Registered as a frame sink
    RegisteredAsViewer,
    /// Socket closed or signed off
    Closed,
}

impl ConnectionState {
    /// Role the connection registered with, if any
    pub fn role(&self) -> Option<PeerRole> {
        match self {
            ConnectionState::RegisteredAsClient => Some(PeerRole::Client),
            ConnectionState::RegisteredAsViewer => Some(PeerRole::Viewer),
            ConnectionState::Unregistered | ConnectionState::Closed => None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.role().is_some()
    }
}

/// Rejected state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// Per-connection session state
#[derive(Debug)]
pub struct SessionState {
    /// Connection handle
    pub id: ConnectionId,

    /// Remote peer address, when the transport knows it
    pub peer_addr: Option<SocketAddr>,

    /// Current state
    pub state: ConnectionState,

    /// Socket accept time
    pub opened_at: Instant,

    /// Time registration succeeded
    pub registered_at: Option<Instant>,

    /// Inbound messages handled
    pub messages_received: u64,

    /// Frames accepted from this connection
    pub frames_accepted: u64,
}

impl SessionState {
    /// Create a new session in `Unregistered`
    pub fn new(id: ConnectionId, peer_addr: Option<SocketAddr>) -> Self {
        Self {
            id,
            peer_addr,
            state: ConnectionState::Unregistered,
            opened_at: Instant::now(),
            registered_at: None,
            messages_received: 0,
            frames_accepted: 0,
        }
    }

    /// Move from `Unregistered` to the registered state for `role`
    pub fn register(&mut self, role: PeerRole) -> Result<(), InvalidTransition> {
        let to = match role {
            PeerRole::Client => ConnectionState::RegisteredAsClient,
            PeerRole::Viewer => ConnectionState::RegisteredAsViewer,
        };

        if self.state != ConnectionState::Unregistered {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }

        self.state = to;
        self.registered_at = Some(Instant::now());
        Ok(())
    }

    /// Enter the terminal state
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }

    /// Role the connection registered with, if any
    pub fn role(&self) -> Option<PeerRole> {
        self.state.role()
    }

    pub fn is_client(&self) -> bool {
        self.state == ConnectionState::RegisteredAsClient
    }

    pub fn is_viewer(&self) -> bool {
        self.state == ConnectionState::RegisteredAsViewer
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Time since the socket was accepted
    pub fn duration(&self) -> std::time::Duration {
        self.opened_at.elapsed()
    }
}
