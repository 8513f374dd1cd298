//! Recording lifecycle
//!
//! - `schema`: the metadata record kept per clip
//! - `manager`: save/list/update/delete over the blob store and ledger
//! - `cache`: event-invalidated view of the recordings list

pub mod cache;
pub mod manager;
pub mod schema;

pub use cache::RecordingsCache;
pub use manager::{RecordingEvent, RecordingManager, StorageCapacity};
pub use schema::{MetadataFields, RecordingMetadata};
