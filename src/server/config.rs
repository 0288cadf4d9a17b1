//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::protocol::constants::*;
use crate::relay::{FanoutMode, RelayConfig};

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,

    /// Largest inbound WebSocket message in bytes
    pub max_message_size: usize,

    /// Outbound messages buffered per connection before dropping
    pub outbound_buffer: usize,

    /// Interval between status log lines
    pub status_interval: Duration,

    /// Allow cross-origin requests from any origin
    pub cors: bool,

    /// Relay protocol options
    pub relay: RelayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 0, // Unlimited
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            status_interval: Duration::from_secs(DEFAULT_STATUS_INTERVAL_SECS),
            cors: true,
            relay: RelayConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set maximum inbound message size
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set per-connection outbound buffer (at least 1)
    pub fn outbound_buffer(mut self, size: usize) -> Self {
        self.outbound_buffer = size.max(1);
        self
    }

    /// Set status log interval (at least `MIN_STATUS_INTERVAL_MS`)
    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval.max(Duration::from_millis(MIN_STATUS_INTERVAL_MS));
        self
    }

    /// Enable or disable permissive CORS
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    /// Set the fan-out mode
    pub fn fanout(mut self, mode: FanoutMode) -> Self {
        self.relay.fanout = mode;
        self
    }

    /// Replace the relay options
    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.relay = relay;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(config.outbound_buffer, DEFAULT_OUTBOUND_BUFFER);
        assert_eq!(
            config.status_interval,
            Duration::from_secs(DEFAULT_STATUS_INTERVAL_SECS)
        );
        assert!(config.cors);
        assert_eq!(config.relay.fanout, FanoutMode::Targeted);
    }

    #[test]
    fn test_with_addr() {
        let addr: SocketAddr = "127.0.0.1:3001".parse().unwrap();
        let config = ServerConfig::with_addr(addr);

        assert_eq!(config.bind_addr.port(), 3001);
    }

    #[test]
    fn test_builder_outbound_buffer_floor() {
        let config = ServerConfig::default().outbound_buffer(0);

        assert_eq!(config.outbound_buffer, 1);
    }

    #[test]
    fn test_builder_status_interval_floor() {
        let config = ServerConfig::default().status_interval(Duration::ZERO);

        assert_eq!(
            config.status_interval,
            Duration::from_millis(MIN_STATUS_INTERVAL_MS)
        );
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .max_connections(50)
            .max_message_size(1024)
            .outbound_buffer(8)
            .status_interval(Duration::from_secs(5))
            .cors(false)
            .fanout(FanoutMode::Broadcast);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 50);
        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.outbound_buffer, 8);
        assert_eq!(config.status_interval, Duration::from_secs(5));
        assert!(!config.cors);
        assert_eq!(config.relay.fanout, FanoutMode::Broadcast);
    }

    #[test]
    fn test_builder_relay() {
        let config = ServerConfig::default().relay(RelayConfig::default().ack_frames(false));

        assert!(!config.relay.ack_frames);
    }
}
