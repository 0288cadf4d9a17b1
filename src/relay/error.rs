//! Relay protocol error types
//!
//! These never escape a connection: the handler turns them into a
//! `connection-error` or `stream-error` reply, or drops them for
//! fire-and-forget events.

use thiserror::Error;

use crate::protocol::ServerMessage;
use crate::registry::RegistryError;
use crate::session::ConnectionState;

/// Error type for rejected relay events
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// Registration collided with an active peer
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Missing or malformed fields
    #[error("{0}")]
    Validation(String),

    /// The event referenced an unknown client
    #[error("client not found: {0}")]
    NotFound(String),

    /// The event is not valid in the connection's current state
    #[error("{event} not allowed in state {state:?}")]
    InvalidState {
        event: &'static str,
        state: ConnectionState,
    },
}

impl RelayError {
    /// Reply for the connection that sent the rejected event, if any
    pub fn reply_for(&self, event: &str) -> Option<ServerMessage> {
        match event {
            "client-connect" | "viewer-connect" => {
                Some(ServerMessage::connection_error(self.to_string()))
            }
            "screen-stream" | "request-stream" => Some(ServerMessage::stream_error(self.to_string())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PeerRole;

    #[test]
    fn test_duplicate_id_reply() {
        let err = RelayError::from(RegistryError::DuplicateId {
            role: PeerRole::Client,
            business_id: "c1".into(),
        });

        assert_eq!(
            err.reply_for("client-connect"),
            Some(ServerMessage::connection_error("client id already in use: c1"))
        );
    }

    #[test]
    fn test_frame_errors_reply_with_stream_error() {
        let err = RelayError::Validation("imageData is required".into());
        assert_eq!(
            err.reply_for("screen-stream"),
            Some(ServerMessage::stream_error("imageData is required"))
        );
    }

    #[test]
    fn test_fire_and_forget_events_have_no_reply() {
        let err = RelayError::NotFound("c9".into());
        assert!(err.reply_for("remote-control").is_none());
        assert!(err.reply_for("client-status").is_none());
    }
}
