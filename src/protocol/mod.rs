//! Relay wire protocol
//!
//! JSON message types exchanged over the WebSocket, and protocol defaults.

pub mod constants;
pub mod message;

pub use message::{ClientMessage, ClientSummary, ServerMessage};
