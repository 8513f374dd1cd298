//! Storage layer
//!
//! - `blob`: durable copies of recorded clips
//! - `kv`: key-value persistence with single-key atomic writes
//! - `ledger`: the JSON list of recording metadata kept in the key-value store

pub mod blob;
pub mod kv;
pub mod ledger;

pub use blob::{BlobStore, DiskSpace};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};
pub use ledger::Ledger;
