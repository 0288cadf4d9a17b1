//! Relay server listener
//!
//! Binds the HTTP listener and routes the WebSocket endpoint and the
//! query API onto the shared hub.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::protocol::constants::WS_PATH;
use crate::relay::RelayHub;
use crate::server::api;
use crate::server::config::ServerConfig;
use crate::server::connection::ws_handler;

/// State shared by every route
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) hub: Arc<RelayHub>,
    pub(crate) config: Arc<ServerConfig>,
    pub(crate) connection_semaphore: Option<Arc<Semaphore>>,
}

impl AppState {
    pub(crate) fn new(hub: Arc<RelayHub>, config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            hub,
            config: Arc::new(config),
            connection_semaphore,
        }
    }
}

/// Screen relay server
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let hub = Arc::new(RelayHub::with_config(config.relay.clone()));
        Self::with_hub(config, hub)
    }

    /// Create a server around an existing hub
    pub fn with_hub(config: ServerConfig, hub: Arc<RelayHub>) -> Self {
        Self {
            state: AppState::new(hub, config),
        }
    }

    /// Get a reference to the relay hub
    pub fn hub(&self) -> &Arc<RelayHub> {
        &self.state.hub
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.state.config.bind_addr
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route(WS_PATH, get(ws_handler))
            .route("/api/status", get(api::status))
            .route("/api/health", get(api::health))
            .route("/api/clients", get(api::list_clients))
            .route("/api/clients/{client_id}", get(api::client_detail))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.state.config.cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.state.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, ws = WS_PATH, "Screen relay listening");

        let status_handle = self
            .state
            .hub
            .spawn_status_logger(self.state.config.status_interval);

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        // Stop status task and release open connections
        status_handle.abort();
        self.state.hub.clear().await;

        result?;
        Ok(())
    }
}
