//! Screen relay server
//!
//! Capture clients push screen frames over a WebSocket; the server keeps the
//! newest frame per client and fans it out to registered viewers. Viewers
//! can request a client's latest frame on demand and send remote-control
//! commands back to a specific client.
//!
//! # Example
//!
//! ```no_run
//! use screen_relay::{RelayServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> screen_relay::error::Result<()> {
//!     let config = ServerConfig::default();
//!     let server = RelayServer::new(config);
//!     server.run().await
//! }
//! ```

pub mod error;
pub mod protocol;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;
pub mod stats;
pub mod stream;

pub use error::{Error, Result};
pub use protocol::{ClientMessage, ServerMessage};
pub use registry::{ConnectionId, Peer, PeerRole};
pub use relay::{FanoutMode, RelayConfig, RelayHub};
pub use server::{RelayServer, ServerConfig};
pub use stream::{FramePayload, StreamEntry};
