//! Port adapters for the verifier
//!
//! - `memory_store` / `file_store`: claim payload storage
//! - `channel_source`: in-process claim event subscription
//! - `sinks`: decision destinations

pub mod channel_source;
pub mod file_store;
pub mod memory_store;
pub mod sinks;

pub use channel_source::{ChannelEventPublisher, ChannelEventSource, DEFAULT_EVENT_BUFFER};
pub use file_store::FileClaimStore;
pub use memory_store::InMemoryClaimStore;
pub use sinks::{InMemoryDecisionSink, LoggingDecisionSink};

use core_kernel::Hash32;
use sha2::{Digest, Sha256};

/// SHA-256 of an encoded payload, as carried in `ClaimEvent::data_hash`
pub fn payload_digest(bytes: &[u8]) -> Hash32 {
    Hash32::from_bytes(Sha256::digest(bytes).into())
}

/// Content reference for an encoded payload: lowercase hex of its digest
pub fn content_reference(bytes: &[u8]) -> String {
    payload_digest(bytes).to_hex()
}
