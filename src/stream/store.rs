//! Stream store implementation
//!
//! One slot per client holding its most recent frame. A write replaces the
//! slot wholesale; nothing is queued.

use std::collections::HashMap;
use std::sync::Arc;

use super::entry::StreamEntry;
use super::frame::FramePayload;

/// Latest-frame table keyed by client business id
///
/// Entries are handed out as `Arc` snapshots: a reader holding an entry keeps
/// seeing that complete frame even after a newer one replaces it.
#[derive(Debug, Default)]
pub struct StreamStore {
    streams: HashMap<String, Arc<StreamEntry>>,
}

impl StreamStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a frame for a client, replacing any previous one
    pub fn put(
        &mut self,
        client_id: &str,
        payload: FramePayload,
        captured_at: u64,
        quality: Option<String>,
    ) -> Arc<StreamEntry> {
        let entry = Arc::new(StreamEntry::new(client_id, payload, captured_at, quality));

        tracing::debug!(
            client_id = client_id,
            captured_at = captured_at,
            size = entry.size(),
            "Frame stored"
        );

        self.streams
            .insert(client_id.to_string(), Arc::clone(&entry));
        entry
    }

    /// Latest frame for a client
    pub fn get(&self, client_id: &str) -> Option<Arc<StreamEntry>> {
        self.streams.get(client_id).cloned()
    }

    /// Whether a client has a stored frame
    pub fn contains(&self, client_id: &str) -> bool {
        self.streams.contains_key(client_id)
    }

    /// Drop a client's frame
    pub fn remove(&mut self, client_id: &str) -> Option<Arc<StreamEntry>> {
        let removed = self.streams.remove(client_id);
        if removed.is_some() {
            tracing::debug!(client_id = client_id, "Stream removed");
        }
        removed
    }

    /// Ids of all clients with a stored frame
    pub fn ids(&self) -> Vec<String> {
        self.streams.keys().cloned().collect()
    }

    /// Number of stored streams
    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Drop every stream
    pub fn clear(&mut self) {
        self.streams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get() {
        let mut store = StreamStore::new();
        assert!(store.get("c1").is_none());

        store.put("c1", FramePayload::from("AAA"), 1000, Some("low".into()));

        let entry = store.get("c1").unwrap();
        assert_eq!(entry.payload.as_str(), "AAA");
        assert_eq!(entry.captured_at, 1000);
        assert_eq!(entry.quality.as_deref(), Some("low"));
        assert_eq!(entry.size(), 3);
    }

    #[test]
    fn test_last_write_wins() {
        let mut store = StreamStore::new();
        store.put("c1", FramePayload::from("AAA"), 1000, Some("low".into()));
        store.put("c1", FramePayload::from("BBB"), 2000, None);

        assert_eq!(store.len(), 1);
        let entry = store.get("c1").unwrap();
        assert_eq!(entry.payload.as_str(), "BBB");
        assert_eq!(entry.captured_at, 2000);
        assert_eq!(entry.quality, None);
    }

    #[test]
    fn test_snapshot_survives_overwrite() {
        let mut store = StreamStore::new();
        store.put("c1", FramePayload::from("AAA"), 1000, None);

        let held = store.get("c1").unwrap();
        store.put("c1", FramePayload::from("BBB"), 2000, None);

        assert_eq!(held.payload.as_str(), "AAA");
        assert_eq!(store.get("c1").unwrap().payload.as_str(), "BBB");
    }

    #[test]
    fn test_captured_at_is_not_an_ordering_key() {
        let mut store = StreamStore::new();
        store.put("c1", FramePayload::from("new"), 2000, None);
        store.put("c1", FramePayload::from("old"), 1000, None);

        // The later write wins even with an earlier capture time
        assert_eq!(store.get("c1").unwrap().payload.as_str(), "old");
    }

    #[test]
    fn test_remove() {
        let mut store = StreamStore::new();
        store.put("c1", FramePayload::from("AAA"), 1000, None);
        store.put("c2", FramePayload::from("CCC"), 1000, None);

        assert!(store.remove("c1").is_some());
        assert!(store.get("c1").is_none());
        assert!(store.contains("c2"));
        assert!(store.remove("c1").is_none());

        assert_eq!(store.ids(), vec!["c2".to_string()]);
    }
}
