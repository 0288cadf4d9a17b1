//! Protocol and server defaults

/// Default HTTP/WebSocket port
pub const DEFAULT_PORT: u16 = 3000;

/// Path of the WebSocket endpoint
pub const WS_PATH: &str = "/ws";

/// Largest inbound WebSocket message accepted (100 MiB)
///
/// Frames are whole data-URL encoded screenshots, so this is generous.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 100 * 1024 * 1024;

/// Messages that may be pending per connection before new ones are dropped
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Interval between status log lines, in seconds
pub const DEFAULT_STATUS_INTERVAL_SECS: u64 = 30;

/// Shortest status log interval, in milliseconds
pub const MIN_STATUS_INTERVAL_MS: u64 = 100;
