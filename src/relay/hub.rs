//! Relay hub
//!
//! Owns the protocol handler and every connection's outbox. All events run
//! under one lock, so an event's registry/store mutation and the enqueueing
//! of its fan-out complete before the next event starts.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Mutex};

use crate::protocol::constants::MIN_STATUS_INTERVAL_MS;
use crate::protocol::{ClientMessage, ClientSummary, ServerMessage};
use crate::registry::{ConnectionId, PeerRole};
use crate::stats::{RelayStats, ServerStats};

use super::config::RelayConfig;
use super::dispatch::Dispatch;
use super::handler::{ClientDetail, RelayHandler};

/// Sending half of a connection's outbound queue
pub type Outbox = mpsc::Sender<ServerMessage>;

struct HubInner {
    handler: RelayHandler,
    outboxes: HashMap<ConnectionId, Outbox>,
    stats: RelayStats,
}

impl HubInner {
    /// Queue every delivery without waiting on any connection
    ///
    /// A full outbox means the peer is not keeping up: the message is
    /// dropped, and a later frame supersedes it.
    fn deliver(&mut self, dispatch: Dispatch) {
        for delivery in dispatch {
            let Some(outbox) = self.outboxes.get(&delivery.to) else {
                continue;
            };

            let is_frame = delivery.message.is_frame();
            match outbox.try_send(delivery.message) {
                Ok(()) => self.stats.record_delivery(is_frame),
                Err(mpsc::error::TrySendError::Full(message)) => {
                    self.stats.record_drop(is_frame);
                    tracing::debug!(
                        connection = %delivery.to,
                        event = message.event_name(),
                        "Outbox full, message dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }
}

/// Process-wide relay state shared by all connection tasks
pub struct RelayHub {
    inner: Mutex<HubInner>,
    next_connection_id: AtomicU64,
    started_at: Instant,
}

impl RelayHub {
    /// Create a hub with default configuration
    pub fn new() -> Self {
        Self::with_config(RelayConfig::default())
    }

    /// Create a hub with custom configuration
    pub fn with_config(config: RelayConfig) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                handler: RelayHandler::with_config(config),
                outboxes: HashMap::new(),
                stats: RelayStats::new(),
            }),
            next_connection_id: AtomicU64::new(1),
            started_at: Instant::now(),
        }
    }

    /// Allocate a handle for a new connection
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Attach a new connection and its outbox
    pub async fn open(
        &self,
        connection: ConnectionId,
        peer_addr: Option<SocketAddr>,
        outbox: Outbox,
    ) {
        let mut inner = self.inner.lock().await;
        inner.handler.open(connection, peer_addr);
        inner.outboxes.insert(connection, outbox);
        inner.stats.connections_opened += 1;
    }

    /// Handle one inbound message and queue its deliveries
    pub async fn dispatch(&self, connection: ConnectionId, message: ClientMessage) {
        let mut inner = self.inner.lock().await;
        inner.stats.messages_received += 1;
        let dispatch = inner.handler.handle(connection, message);
        inner.deliver(dispatch);
    }

    /// Detach a connection and notify whoever needs to know
    ///
    /// Dropping the outbox lets the connection's writer drain and exit.
    pub async fn close(&self, connection: ConnectionId) {
        let mut inner = self.inner.lock().await;
        let dispatch = inner.handler.close(connection);
        inner.outboxes.remove(&connection);
        inner.deliver(dispatch);
    }

    /// Point-in-time server status
    pub async fn server_stats(&self) -> ServerStats {
        let inner = self.inner.lock().await;
        let handler = &inner.handler;

        let mut active_streams = handler.streams().ids();
        active_streams.sort();

        ServerStats {
            total_connections: inner.stats.connections_opened,
            active_connections: handler.session_count() as u64,
            clients: handler.peers().count_by_role(PeerRole::Client) as u64,
            viewers: handler.peers().count_by_role(PeerRole::Viewer) as u64,
            active_streams,
            relay: inner.stats.clone(),
            uptime: self.uptime(),
        }
    }

    /// Connected clients with their streaming flag
    pub async fn client_summaries(&self) -> Vec<ClientSummary> {
        self.inner.lock().await.handler.client_summaries()
    }

    /// A connected client and its latest frame
    pub async fn client_detail(&self, client_id: &str) -> Option<ClientDetail> {
        self.inner.lock().await.handler.client_detail(client_id)
    }

    /// Drop all connections, peers and streams
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.handler.clear();
        inner.outboxes.clear();
        tracing::info!("Relay state cleared");
    }

    /// Time since the hub was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Spawn background status logging task
    ///
    /// Intervals below `MIN_STATUS_INTERVAL_MS` are raised to it. Returns a
    /// handle that can be used to abort the task.
    pub fn spawn_status_logger(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let hub = Arc::clone(self);
        let interval = interval.max(Duration::from_millis(MIN_STATUS_INTERVAL_MS));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let stats = hub.server_stats().await;
                tracing::info!(
                    clients = stats.clients,
                    viewers = stats.viewers,
                    streams = stats.active_streams.len(),
                    connections = stats.active_connections,
                    dropped = stats.relay.messages_dropped,
                    "Relay status"
                );
            }
        })
    }
}

impl Default for RelayHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::stream::FramePayload;

    async fn attach(hub: &RelayHub, capacity: usize) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
        let id = hub.next_connection_id();
        let (tx, rx) = mpsc::channel(capacity);
        hub.open(id, None, tx).await;
        (id, rx)
    }

    fn frame(payload: String, captured_at: u64) -> ClientMessage {
        ClientMessage::ScreenStream {
            client_id: None,
            image_data: Some(FramePayload::from(payload)),
            timestamp: Some(captured_at),
            quality: None,
        }
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let hub = RelayHub::new();
        let a = hub.next_connection_id();
        let b = hub.next_connection_id();
        assert_eq!(a, ConnectionId(1));
        assert_eq!(b, ConnectionId(2));
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_outboxes() {
        let hub = RelayHub::new();
        let (client, mut client_rx) = attach(&hub, 8).await;
        let (viewer, mut viewer_rx) = attach(&hub, 8).await;

        hub.dispatch(
            viewer,
            ClientMessage::ViewerConnect {
                viewer_id: "v1".into(),
                viewer_name: "Wall".into(),
            },
        )
        .await;
        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "available-clients"
        );
        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "viewer-connected"
        );

        hub.dispatch(
            client,
            ClientMessage::ClientConnect {
                client_id: "c1".into(),
                client_name: "Desk".into(),
            },
        )
        .await;
        assert_eq!(
            assert_ok!(client_rx.try_recv()).event_name(),
            "client-connected"
        );
        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "client-list-updated"
        );

        hub.dispatch(client, frame("AAA".into(), 1000)).await;
        match assert_ok!(viewer_rx.try_recv()) {
            ServerMessage::ScreenUpdate { image_data, .. } => {
                assert_eq!(image_data.as_str(), "AAA")
            }
            other => panic!("expected screen-update, got {:?}", other),
        }
        assert_eq!(
            assert_ok!(client_rx.try_recv()).event_name(),
            "stream-received"
        );
        assert_err!(client_rx.try_recv());
        assert_err!(viewer_rx.try_recv());
    }

    #[tokio::test]
    async fn test_close_drops_outbox_and_notifies() {
        let hub = RelayHub::new();
        let (client, mut client_rx) = attach(&hub, 8).await;
        let (viewer, mut viewer_rx) = attach(&hub, 8).await;

        hub.dispatch(
            client,
            ClientMessage::ClientConnect {
                client_id: "c1".into(),
                client_name: "Desk".into(),
            },
        )
        .await;
        hub.dispatch(
            viewer,
            ClientMessage::ViewerConnect {
                viewer_id: "v1".into(),
                viewer_name: "Wall".into(),
            },
        )
        .await;
        while viewer_rx.try_recv().is_ok() {}

        hub.close(client).await;

        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "client-disconnected"
        );
        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "client-list-updated"
        );

        // Drain the client's queued messages; then the channel reports closed
        while client_rx.try_recv().is_ok() {}
        assert_eq!(
            client_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_full_outbox_drops_instead_of_blocking() {
        let hub = RelayHub::new();
        let (client, _client_rx) = attach(&hub, 64).await;
        let (viewer, mut viewer_rx) = attach(&hub, 2).await;

        hub.dispatch(
            viewer,
            ClientMessage::ViewerConnect {
                viewer_id: "v1".into(),
                viewer_name: "Wall".into(),
            },
        )
        .await;
        hub.dispatch(
            client,
            ClientMessage::ClientConnect {
                client_id: "c1".into(),
                client_name: "Desk".into(),
            },
        )
        .await;

        // Viewer never reads; every frame beyond capacity is dropped
        for n in 0..5u64 {
            hub.dispatch(client, frame(format!("frame-{}", n), n)).await;
        }

        let stats = hub.server_stats().await;
        assert!(stats.relay.frames_dropped >= 5);
        assert_eq!(stats.active_streams, vec!["c1".to_string()]);

        // The store still holds the newest frame
        let detail = hub.client_detail("c1").await.unwrap();
        assert_eq!(detail.stream.unwrap().payload.as_str(), "frame-4");

        assert_eq!(
            assert_ok!(viewer_rx.try_recv()).event_name(),
            "available-clients"
        );
    }

    #[tokio::test]
    async fn test_concurrent_frames_from_many_clients() {
        let hub = Arc::new(RelayHub::new());
        let mut clients = Vec::new();

        for n in 0..8 {
            let (id, rx) = attach(&hub, 256).await;
            hub.dispatch(
                id,
                ClientMessage::ClientConnect {
                    client_id: format!("c{}", n),
                    client_name: String::new(),
                },
            )
            .await;
            clients.push((n, id, rx));
        }

        let mut tasks = Vec::new();
        for (n, id, _) in &clients {
            let hub = Arc::clone(&hub);
            let (n, id) = (*n, *id);
            tasks.push(tokio::spawn(async move {
                for seq in 0..20u64 {
                    hub.dispatch(id, frame(format!("c{}-{}", n, seq), seq)).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        for (n, _, _) in &clients {
            let detail = hub.client_detail(&format!("c{}", n)).await.unwrap();
            let stream = detail.stream.unwrap();
            assert_eq!(stream.payload.as_str(), format!("c{}-19", n));
            assert_eq!(stream.captured_at, 19);
        }

        let stats = hub.server_stats().await;
        assert_eq!(stats.clients, 8);
        assert_eq!(stats.active_streams.len(), 8);
    }

    #[tokio::test]
    async fn test_status_logger_survives_zero_interval() {
        let hub = Arc::new(RelayHub::new());

        let handle = hub.spawn_status_logger(Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(MIN_STATUS_INTERVAL_MS * 2)).await;

        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_server_stats_and_clear() {
        let hub = RelayHub::new();
        let (client, _client_rx) = attach(&hub, 8).await;
        let (_unregistered, _rx) = attach(&hub, 8).await;

        hub.dispatch(
            client,
            ClientMessage::ClientConnect {
                client_id: "c1".into(),
                client_name: "Desk".into(),
            },
        )
        .await;

        let stats = hub.server_stats().await;
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.active_connections, 2);
        assert_eq!(stats.clients, 1);
        assert_eq!(stats.viewers, 0);
        assert!(stats.active_streams.is_empty());

        let summaries = hub.client_summaries().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].client_name, "Desk");

        hub.clear().await;
        let stats = hub.server_stats().await;
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.clients, 0);
    }
}
