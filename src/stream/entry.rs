//! Stream entry type
//!
//! The latest frame known for one client.

use chrono::{DateTime, Utc};

use super::frame::FramePayload;

/// Latest frame for a single client
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    /// Business id of the owning client
    pub client_id: String,

    /// Encoded image
    pub payload: FramePayload,

    /// Sender-assigned capture time (epoch milliseconds)
    pub captured_at: u64,

    /// Sender-chosen quality descriptor, passed through untouched
    pub quality: Option<String>,

    /// When the relay stored this frame
    pub last_update: DateTime<Utc>,
}

impl StreamEntry {
    pub fn new(
        client_id: impl Into<String>,
        payload: FramePayload,
        captured_at: u64,
        quality: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            payload,
            captured_at,
            quality,
            last_update: Utc::now(),
        }
    }

    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}
