//! Stream store
//!
//! Holds the single most recent frame of every streaming client.
//!
//! # Zero-Copy Design
//!
//! `FramePayload` wraps `bytes::Bytes`. Storing a frame, replying to a
//! `request-stream`, and fanning a frame out to N viewers all share one
//! allocation; only the reference count changes.

pub mod entry;
pub mod frame;
pub mod store;

pub use entry::StreamEntry;
pub use frame::FramePayload;
pub use store::StreamStore;
