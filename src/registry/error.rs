//! Registry error types

use thiserror::Error;

use super::peer::{ConnectionId, PeerRole};

/// Error type for peer registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Another connection already holds this (role, business id) pair
    #[error("{role} id already in use: {business_id}")]
    DuplicateId {
        role: PeerRole,
        business_id: String,
    },

    /// The connection already has a registered peer
    #[error("connection {0} is already registered")]
    AlreadyRegistered(ConnectionId),
}
