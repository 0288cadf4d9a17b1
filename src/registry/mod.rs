//! Peer registry
//!
//! In-memory table of every registered connection. A connection becomes a
//! peer when its `client-connect` or `viewer-connect` succeeds and stops
//! being one when it signs off or its socket closes.
//!
//! ```text
//!                  PeerRegistry
//!     ┌──────────────────────────────────────┐
//!     │ peers:  ConnectionId -> Peer         │
//!     │ by_key: (role, business_id) -> conn  │
//!     └──────────────────────────────────────┘
//! ```
//!
//! The `by_key` index enforces "at most one peer per (role, business id)".

pub mod error;
pub mod peer;
pub mod store;

pub use error::RegistryError;
pub use peer::{ConnectionId, Peer, PeerRole};
pub use store::PeerRegistry;
