//! Peer and connection handle types
//!
//! A peer is a connection that completed registration as either a client
//! (frame source) or a viewer (frame sink).

use chrono::{DateTime, Utc};

/// Opaque transport session handle
///
/// Allocated by the server for every accepted WebSocket and valid only for
/// the lifetime of that socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role a peer registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRole {
    /// Publishes screen frames
    Client,
    /// Watches client streams
    Viewer,
}

impl PeerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerRole::Client => "client",
            PeerRole::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key for the (role, business id) uniqueness index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(super) struct PeerKey {
    pub role: PeerRole,
    pub business_id: String,
}

impl PeerKey {
    pub(super) fn new(role: PeerRole, business_id: impl Into<String>) -> Self {
        Self {
            role,
            business_id: business_id.into(),
        }
    }
}

/// A registered connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Transport session this peer lives on
    pub connection: ConnectionId,

    /// Client or viewer; fixed at registration
    pub role: PeerRole,

    /// Caller-chosen id, unique per role
    pub business_id: String,

    /// Human-readable label
    pub display_name: String,

    /// When registration succeeded
    pub connected_at: DateTime<Utc>,
}

impl Peer {
    pub fn is_client(&self) -> bool {
        self.role == PeerRole::Client
    }

    pub(super) fn key(&self) -> PeerKey {
        PeerKey::new(self.role, self.business_id.clone())
    }
}
