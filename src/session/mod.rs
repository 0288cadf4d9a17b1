//! Per-connection session state

pub mod state;

pub use state::{ConnectionState, InvalidTransition, SessionState};
