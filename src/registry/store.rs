//! Peer registry implementation
//!
//! The table of every registered peer, keyed by connection handle, with a
//! secondary index on (role, business id) so duplicate detection and
//! "is client X connected" are both O(1).

use std::collections::HashMap;

use chrono::Utc;

use super::error::RegistryError;
use super::peer::{ConnectionId, Peer, PeerKey, PeerRole};

/// Registry of connected clients and viewers
///
/// Not internally synchronized: it is owned by the relay handler, which is
/// only ever driven under the hub lock.
#[derive(Debug, Default)]
pub struct PeerRegistry {
    /// Map of connection handle to peer
    peers: HashMap<ConnectionId, Peer>,

    /// (role, business id) -> connection handle
    by_key: HashMap<PeerKey, ConnectionId>,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer on a connection
    ///
    /// Fails without touching the registry if another connection already
    /// holds the same (role, business id), or if this connection already has
    /// a peer.
    pub fn register(
        &mut self,
        connection: ConnectionId,
        role: PeerRole,
        business_id: &str,
        display_name: &str,
    ) -> Result<&Peer, RegistryError> {
        if self.peers.contains_key(&connection) {
            return Err(RegistryError::AlreadyRegistered(connection));
        }

        let key = PeerKey::new(role, business_id);
        if self.by_key.contains_key(&key) {
            return Err(RegistryError::DuplicateId {
                role,
                business_id: business_id.to_string(),
            });
        }

        let peer = Peer {
            connection,
            role,
            business_id: business_id.to_string(),
            display_name: display_name.to_string(),
            connected_at: Utc::now(),
        };

        tracing::info!(
            connection = %connection,
            role = %role,
            business_id = business_id,
            name = display_name,
            "Peer registered"
        );

        self.by_key.insert(key, connection);
        Ok(self.peers.entry(connection).or_insert(peer))
    }

    /// Look up the peer on a connection
    pub fn find(&self, connection: ConnectionId) -> Option<&Peer> {
        self.peers.get(&connection)
    }

    /// Look up a peer by role and business id
    pub fn find_by_business_id(&self, role: PeerRole, business_id: &str) -> Option<&Peer> {
        self.by_key
            .get(&PeerKey::new(role, business_id))
            .and_then(|connection| self.peers.get(connection))
    }

    /// All peers with the given role, in no particular order
    pub fn list_by_role(&self, role: PeerRole) -> Vec<&Peer> {
        self.peers.values().filter(|p| p.role == role).collect()
    }

    /// Connection handles of all peers with the given role
    pub fn connections_by_role(&self, role: PeerRole) -> Vec<ConnectionId> {
        self.peers
            .values()
            .filter(|p| p.role == role)
            .map(|p| p.connection)
            .collect()
    }

    /// Remove the peer on a connection, if any
    pub fn remove(&mut self, connection: ConnectionId) -> Option<Peer> {
        let peer = self.peers.remove(&connection)?;
        self.by_key.remove(&peer.key());

        tracing::info!(
            connection = %connection,
            role = %peer.role,
            business_id = %peer.business_id,
            "Peer removed"
        );

        Some(peer)
    }

    /// Number of registered peers
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Number of registered peers with the given role
    pub fn count_by_role(&self, role: PeerRole) -> usize {
        self.peers.values().filter(|p| p.role == role).count()
    }

    /// Drop every peer
    pub fn clear(&mut self) {
        self.peers.clear();
        self.by_key.clear();
    }
}
