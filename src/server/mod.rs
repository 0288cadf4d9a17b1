//! WebSocket server
//!
//! ```text
//!   GET /ws                    ──► connection::ws_handler ──► RelayHub
//!   GET /api/status            ─┐
//!   GET /api/health             ├► api::* (read-only views)
//!   GET /api/clients            │
//!   GET /api/clients/{id}      ─┘
//! ```

pub mod api;
pub mod config;
mod connection;
pub mod listener;

pub use config::ServerConfig;
pub use listener::RelayServer;
