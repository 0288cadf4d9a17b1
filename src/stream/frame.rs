//! Frame payload type
//!
//! Screen frames arrive as data-URL text inside JSON. They are kept as
//! `Bytes` so that storing a frame and fanning it out to every viewer only
//! bumps a reference count.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Encoded image data, opaque to the relay
///
/// Cheap to clone. Always valid UTF-8 since it can only be built from text.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct FramePayload(Bytes);

impl FramePayload {
    /// Length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow as text
    pub fn as_str(&self) -> &str {
        // Only constructed from `String`/`&str`, see the From impls below
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Underlying shared buffer
    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }
}

impl From<String> for FramePayload {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

impl From<&'static str> for FramePayload {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }
}

impl std::fmt::Debug for FramePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Frames are large; never dump them into logs
        write!(f, "FramePayload({} bytes)", self.0.len())
    }
}

impl Serialize for FramePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FramePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FramePayload::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_json_is_plain_string() {
        let payload = FramePayload::from("data:image/jpeg;base64,AAA");
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, "\"data:image/jpeg;base64,AAA\"");

        let back: FramePayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.len(), 26);
    }

    #[test]
    fn test_clone_shares_buffer() {
        let payload = FramePayload::from(String::from("BBB"));
        let copy = payload.clone();
        assert_eq!(payload.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }

    #[test]
    fn test_debug_hides_contents() {
        let payload = FramePayload::from("secret-pixels");
        assert_eq!(format!("{:?}", payload), "FramePayload(13 bytes)");
    }
}
