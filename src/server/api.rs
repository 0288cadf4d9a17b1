//! HTTP query API
//!
//! Read-only JSON views over the hub. Nothing here mutates relay state.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::ClientSummary;

use super::listener::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub server: ServerInfo,
    pub connections: ConnectionCounts,
    pub streams: StreamSummary,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub uptime_secs: u64,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCounts {
    /// Registered peers
    pub total: u64,
    pub clients: u64,
    pub viewers: u64,
    /// Open sockets, registered or not
    pub open: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSummary {
    pub active: usize,
    pub details: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientsResponse {
    pub clients: Vec<ClientSummary>,
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetailResponse {
    pub client: ClientInfo,
    pub stream: StreamStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub client_name: String,
    pub connected_at: DateTime<Utc>,
}

/// Latest-frame metadata; the payload itself is never included
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

/// `GET /api/status`
pub(crate) async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let stats = state.hub.server_stats().await;

    Json(StatusResponse {
        status: "online",
        server: ServerInfo {
            uptime_secs: stats.uptime.as_secs(),
            version: env!("CARGO_PKG_VERSION"),
        },
        connections: ConnectionCounts {
            total: stats.registered(),
            clients: stats.clients,
            viewers: stats.viewers,
            open: stats.active_connections,
        },
        streams: StreamSummary {
            active: stats.active_streams.len(),
            details: stats.active_streams,
        },
        timestamp: Utc::now(),
    })
}

/// `GET /api/health`
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        uptime_secs: state.hub.uptime().as_secs(),
    })
}

/// `GET /api/clients`
pub(crate) async fn list_clients(State(state): State<AppState>) -> Json<ClientsResponse> {
    let clients = state.hub.client_summaries().await;

    Json(ClientsResponse {
        count: clients.len(),
        clients,
        timestamp: Utc::now(),
    })
}

/// `GET /api/clients/{client_id}`
pub(crate) async fn client_detail(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Response {
    let Some(detail) = state.hub.client_detail(&client_id).await else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "client not found" })),
        )
            .into_response();
    };

    let stream = match detail.stream {
        Some(entry) => StreamStatus {
            is_active: true,
            quality: entry.quality.clone(),
            last_update: Some(entry.last_update),
            timestamp: Some(entry.captured_at),
            size: Some(entry.size()),
        },
        None => StreamStatus {
            is_active: false,
            quality: None,
            last_update: None,
            timestamp: None,
            size: None,
        },
    };

    Json(ClientDetailResponse {
        client: ClientInfo {
            client_id: detail.peer.business_id,
            client_name: detail.peer.display_name,
            connected_at: detail.peer.connected_at,
        },
        stream,
        timestamp: Utc::now(),
    })
    .into_response()
}
