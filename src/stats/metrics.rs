//! Statistics for the relay

use std::time::Duration;

/// Delivery counters kept by the hub
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Connections ever opened
    pub connections_opened: u64,
    /// Inbound messages handled
    pub messages_received: u64,
    /// Outbound messages queued for a connection
    pub messages_delivered: u64,
    /// Outbound frames queued for a connection
    pub frames_delivered: u64,
    /// Outbound messages dropped because the outbox was full
    pub messages_dropped: u64,
    /// Of those, how many were frames
    pub frames_dropped: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message queued on an outbox
    pub fn record_delivery(&mut self, is_frame: bool) {
        self.messages_delivered += 1;
        if is_frame {
            self.frames_delivered += 1;
        }
    }

    /// Record a message dropped on a full outbox
    pub fn record_drop(&mut self, is_frame: bool) {
        self.messages_dropped += 1;
        if is_frame {
            self.frames_dropped += 1;
        }
    }
}

/// Server-wide status snapshot
#[derive(Debug, Clone, Default)]
pub struct ServerStats {
    /// Connections ever opened
    pub total_connections: u64,
    /// Currently open connections, registered or not
    pub active_connections: u64,
    /// Registered clients
    pub clients: u64,
    /// Registered viewers
    pub viewers: u64,
    /// Ids of clients with a stored frame
    pub active_streams: Vec<String>,
    /// Delivery counters
    pub relay: RelayStats,
    /// Uptime
    pub uptime: Duration,
}

impl ServerStats {
    /// Registered peers of either role
    pub fn registered(&self) -> u64 {
        self.clients + self.viewers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_stats_new() {
        let stats = RelayStats::new();
        assert_eq!(stats.connections_opened, 0);
        assert_eq!(stats.messages_received, 0);
        assert_eq!(stats.messages_delivered, 0);
        assert_eq!(stats.messages_dropped, 0);
    }

    #[test]
    fn test_record_delivery_and_drop() {
        let mut stats = RelayStats::new();
        stats.record_delivery(true);
        stats.record_delivery(false);
        stats.record_drop(true);
        stats.record_drop(false);

        assert_eq!(stats.messages_delivered, 2);
        assert_eq!(stats.frames_delivered, 1);
        assert_eq!(stats.messages_dropped, 2);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_server_stats_registered() {
        let stats = ServerStats {
            clients: 2,
            viewers: 3,
            ..ServerStats::default()
        };
        assert_eq!(stats.registered(), 5);
        assert!(stats.active_streams.is_empty());
    }
}
