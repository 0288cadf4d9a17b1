//! Relay protocol
//!
//! Routes frames from clients to viewers and control traffic back.
//!
//! # Architecture
//!
//! ```text
//!                           Arc<RelayHub>
//!                  ┌──────────────────────────────┐
//!                  │ Mutex {                      │
//!                  │   RelayHandler {             │
//!                  │     sessions, peers, streams │
//!                  │   },                         │
//!                  │   outboxes: conn -> mpsc::Tx │
//!                  │ }                            │
//!                  └──────────────┬───────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!     [Client]                [Viewer]                [Viewer]
//!     screen-stream           outbox.recv()           outbox.recv()
//!         │                       │                       │
//!         └──► hub.dispatch() ──► try_send() ──► writer task ──► WebSocket
//! ```
//!
//! The handler decides *what* goes *where*; the hub only moves messages
//! into outboxes. Outboxes are bounded and never awaited on: a viewer that
//! falls behind loses frames instead of slowing anyone else down.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod hub;

pub use config::{FanoutMode, RelayConfig};
pub use dispatch::{Delivery, Dispatch};
pub use error::RelayError;
pub use handler::{ClientDetail, RelayHandler};
pub use hub::{Outbox, RelayHub};
