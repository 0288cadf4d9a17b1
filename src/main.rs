//! Screen relay server binary
//!
//! Run with: screen-relay [--host 0.0.0.0] [--port 3000] [--fanout targeted|broadcast]
//!
//! Every flag can also be set through its environment variable, e.g.
//! `PORT=8080 screen-relay`. Log filtering honours `RUST_LOG`.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::prelude::*;

use screen_relay::protocol::constants::{DEFAULT_PORT, DEFAULT_STATUS_INTERVAL_SECS, WS_PATH};
use screen_relay::{Error, FanoutMode, RelayServer, Result, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "screen-relay")]
#[command(about = "Relay screen-capture frames from clients to viewers over WebSocket")]
struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    #[arg(long, env = "MAX_CONNECTIONS", default_value_t = 0)]
    max_connections: usize,

    /// Recipient selection: targeted or broadcast
    #[arg(long, env = "FANOUT", default_value = "targeted")]
    fanout: FanoutMode,

    /// Seconds between status log lines
    #[arg(long, env = "STATUS_INTERVAL_SECS", default_value_t = DEFAULT_STATUS_INTERVAL_SECS)]
    status_interval_secs: u64,

    /// Largest accepted message, in MiB
    #[arg(long, env = "MAX_MESSAGE_MB", default_value_t = 100)]
    max_message_mb: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn server_config(&self) -> Result<ServerConfig> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::Config(format!("host {:?}: {}", self.host, e)))?;

        if self.status_interval_secs == 0 {
            return Err(Error::Config("status interval must be at least 1s".into()));
        }

        Ok(ServerConfig::with_addr(SocketAddr::new(ip, self.port))
            .max_connections(self.max_connections)
            .max_message_size(self.max_message_mb.saturating_mul(1024 * 1024))
            .status_interval(Duration::from_secs(self.status_interval_secs))
            .fanout(self.fanout))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_directive = if args.debug {
        "screen_relay=debug,tower_http=debug,info"
    } else {
        "screen_relay=info,tower_http=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let config = args.server_config()?;

    tracing::info!(
        addr = %config.bind_addr,
        fanout = ?config.relay.fanout,
        max_connections = config.max_connections,
        "Starting screen relay"
    );
    tracing::info!("WebSocket endpoint: ws://{}{}", config.bind_addr, WS_PATH);
    tracing::info!("API endpoints:");
    tracing::info!("  GET /api/status");
    tracing::info!("  GET /api/health");
    tracing::info!("  GET /api/clients");
    tracing::info!("  GET /api/clients/{{clientId}}");

    let server = RelayServer::new(config);
    server.run_until(shutdown_signal()).await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
