//! WebSocket message types
//!
//! Every WebSocket text frame carries one JSON envelope:
//!
//! ```json
//! {"event": "screen-stream", "data": {"imageData": "data:image/jpeg;...", "timestamp": 1000}}
//! ```
//!
//! Event names are kebab-case, payload fields camelCase.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::registry::Peer;
use crate::stream::{FramePayload, StreamEntry};

/// Messages sent FROM a client or viewer TO the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Register this connection as a frame source
    ClientConnect {
        client_id: String,
        #[serde(default)]
        client_name: String,
    },

    /// Register this connection as a viewer
    ViewerConnect {
        viewer_id: String,
        #[serde(default)]
        viewer_name: String,
    },

    /// A captured frame
    ///
    /// Fields are optional on the wire, and a field of the wrong type reads
    /// as absent, so that incomplete or malformed frames can be answered
    /// with `stream-error` instead of being dropped as undecodable.
    ScreenStream {
        #[serde(default, deserialize_with = "lenient")]
        client_id: Option<String>,
        #[serde(default, deserialize_with = "lenient")]
        image_data: Option<FramePayload>,
        #[serde(default, deserialize_with = "lenient")]
        timestamp: Option<u64>,
        #[serde(default, deserialize_with = "lenient")]
        quality: Option<String>,
    },

    /// Ask for the latest frame of a client
    RequestStream { client_id: String },

    /// Control command for a client
    RemoteControl {
        client_id: String,
        action: String,
        #[serde(default)]
        params: serde_json::Value,
    },

    /// Status report from a client
    ClientStatus {
        client_id: Option<String>,
        status: String,
        #[serde(default)]
        details: serde_json::Value,
    },

    /// Leave; the relay closes the socket afterwards
    ///
    /// Any `data` payload is accepted and ignored.
    SignOff(Option<serde_json::Value>),
}

/// Read an optional field, treating a value of the wrong type as absent
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

impl ClientMessage {
    /// Wire name of the event
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::ClientConnect { .. } => "client-connect",
            ClientMessage::ViewerConnect { .. } => "viewer-connect",
            ClientMessage::ScreenStream { .. } => "screen-stream",
            ClientMessage::RequestStream { .. } => "request-stream",
            ClientMessage::RemoteControl { .. } => "remote-control",
            ClientMessage::ClientStatus { .. } => "client-status",
            ClientMessage::SignOff(_) => "sign-off",
        }
    }
}

/// A connected client as seen by viewers and the query surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub client_id: String,
    pub client_name: String,
    pub connected_at: DateTime<Utc>,
    pub is_streaming: bool,
}

impl ClientSummary {
    pub fn new(peer: &Peer, is_streaming: bool) -> Self {
        Self {
            client_id: peer.business_id.clone(),
            client_name: peer.display_name.clone(),
            connected_at: peer.connected_at,
            is_streaming,
        }
    }
}

/// Messages sent FROM the relay TO a client or viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Registration failed
    ConnectionError { message: String },

    /// Client registration succeeded
    ClientConnected {
        client_id: String,
        client_name: String,
        message: String,
    },

    /// Viewer registration succeeded
    ViewerConnected {
        viewer_id: String,
        viewer_name: String,
        message: String,
    },

    /// The set of connected clients changed
    ClientListUpdated { clients: Vec<ClientSummary> },

    /// Connected clients, sent once to a newly registered viewer
    AvailableClients { clients: Vec<ClientSummary> },

    /// A client's frame
    ScreenUpdate {
        client_id: String,
        image_data: FramePayload,
        timestamp: u64,
        quality: Option<String>,
    },

    /// Control command addressed to `client_id`
    RemoteCommand {
        client_id: String,
        action: String,
        params: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// Status report from `client_id`
    ClientStatusUpdate {
        client_id: String,
        status: String,
        details: serde_json::Value,
        timestamp: DateTime<Utc>,
    },

    /// A client went away
    ClientDisconnected {
        client_id: String,
        client_name: String,
        timestamp: DateTime<Utc>,
    },

    /// A frame or stream request was rejected
    StreamError { message: String },

    /// Acknowledgement of an accepted frame
    StreamReceived {
        client_id: String,
        timestamp: u64,
        message: String,
    },
}

impl ServerMessage {
    pub fn connection_error(message: impl Into<String>) -> Self {
        ServerMessage::ConnectionError {
            message: message.into(),
        }
    }

    pub fn stream_error(message: impl Into<String>) -> Self {
        ServerMessage::StreamError {
            message: message.into(),
        }
    }

    /// Frame message for a stored entry
    pub fn screen_update(entry: &StreamEntry) -> Self {
        ServerMessage::ScreenUpdate {
            client_id: entry.client_id.clone(),
            image_data: entry.payload.clone(),
            timestamp: entry.captured_at,
            quality: entry.quality.clone(),
        }
    }

    /// Wire name of the event
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::ConnectionError { .. } => "connection-error",
            ServerMessage::ClientConnected { .. } => "client-connected",
            ServerMessage::ViewerConnected { .. } => "viewer-connected",
            ServerMessage::ClientListUpdated { .. } => "client-list-updated",
            ServerMessage::AvailableClients { .. } => "available-clients",
            ServerMessage::ScreenUpdate { .. } => "screen-update",
            ServerMessage::RemoteCommand { .. } => "remote-command",
            ServerMessage::ClientStatusUpdate { .. } => "client-status-update",
            ServerMessage::ClientDisconnected { .. } => "client-disconnected",
            ServerMessage::StreamError { .. } => "stream-error",
            ServerMessage::StreamReceived { .. } => "stream-received",
        }
    }

    /// Whether this message carries a frame
    pub fn is_frame(&self) -> bool {
        matches!(self, ServerMessage::ScreenUpdate { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_client_connect() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"client-connect","data":{"clientId":"c1","clientName":"Desk"}}"#,
        )
        .unwrap();

        assert_eq!(
            msg,
            ClientMessage::ClientConnect {
                client_id: "c1".into(),
                client_name: "Desk".into()
            }
        );
        assert_eq!(msg.event_name(), "client-connect");
    }

    #[test]
    fn test_decode_partial_frame() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"screen-stream","data":{"timestamp":1000}}"#)
                .unwrap();

        match msg {
            ClientMessage::ScreenStream {
                client_id,
                image_data,
                timestamp,
                quality,
            } => {
                assert!(client_id.is_none());
                assert!(image_data.is_none());
                assert_eq!(timestamp, Some(1000));
                assert!(quality.is_none());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_remote_control_params() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"event":"remote-control","data":{"clientId":"c1","action":"set-quality","params":{"level":"high"}}}"#,
        )
        .unwrap();

        match msg {
            ClientMessage::RemoteControl {
                client_id,
                action,
                params,
            } => {
                assert_eq!(client_id, "c1");
                assert_eq!(action, "set-quality");
                assert_eq!(params, json!({"level": "high"}));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_malformed_frame_fields_as_absent() {
        let cases = [
            (r#"{"imageData":"AAA","timestamp":"1000"}"#, true, false),
            (r#"{"imageData":"AAA","timestamp":1000.5}"#, true, false),
            (r#"{"imageData":42,"timestamp":1000}"#, false, true),
            (r#"{"imageData":"AAA","timestamp":-5,"quality":7}"#, true, false),
        ];

        for (data, has_payload, has_timestamp) in cases {
            let text = format!(r#"{{"event":"screen-stream","data":{}}}"#, data);
            let msg: ClientMessage = serde_json::from_str(&text).unwrap();
            match msg {
                ClientMessage::ScreenStream {
                    image_data,
                    timestamp,
                    quality,
                    ..
                } => {
                    assert_eq!(image_data.is_some(), has_payload, "{}", data);
                    assert_eq!(timestamp.is_some(), has_timestamp, "{}", data);
                    assert!(quality.is_none());
                }
                other => panic!("unexpected message: {:?}", other),
            }
        }
    }

    #[test]
    fn test_decode_sign_off_with_or_without_data() {
        let bare: ClientMessage = serde_json::from_str(r#"{"event":"sign-off"}"#).unwrap();
        assert_eq!(bare, ClientMessage::SignOff(None));

        let with_data: ClientMessage =
            serde_json::from_str(r#"{"event":"sign-off","data":{}}"#).unwrap();
        assert_eq!(with_data.event_name(), "sign-off");

        let with_null: ClientMessage =
            serde_json::from_str(r#"{"event":"sign-off","data":null}"#).unwrap();
        assert_eq!(with_null, ClientMessage::SignOff(None));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let result = serde_json::from_str::<ClientMessage>(r#"{"event":"bogus","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_screen_update() {
        let entry = StreamEntry::new("c1", FramePayload::from("AAA"), 1000, Some("low".into()));
        let value = serde_json::to_value(ServerMessage::screen_update(&entry)).unwrap();

        assert_eq!(
            value,
            json!({
                "event": "screen-update",
                "data": {
                    "clientId": "c1",
                    "imageData": "AAA",
                    "timestamp": 1000,
                    "quality": "low"
                }
            })
        );
    }

    #[test]
    fn test_encode_client_list() {
        let connected_at = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let msg = ServerMessage::ClientListUpdated {
            clients: vec![ClientSummary {
                client_id: "c1".into(),
                client_name: "Desk".into(),
                connected_at,
                is_streaming: true,
            }],
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["event"], "client-list-updated");
        assert_eq!(value["data"]["clients"][0]["clientId"], "c1");
        assert_eq!(value["data"]["clients"][0]["isStreaming"], true);
        assert_eq!(
            value["data"]["clients"][0]["connectedAt"],
            "2024-01-01T00:00:00Z"
        );
    }
}
