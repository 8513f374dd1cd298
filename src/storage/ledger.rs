//! Metadata ledger
//!
//! The ordered list of recording metadata, newest first, stored as a single
//! JSON array under one key-value key.

use super::kv::KeyValueStore;
use crate::recordings::schema::RecordingMetadata;
use crate::utils::AppResult;
use std::sync::Arc;

pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the ledger, surfacing decode and store failures.
    ///
    /// A key that was never written is an empty ledger, not an error.
    pub async fn load(&self) -> AppResult<Vec<RecordingMetadata>> {
        match self.store.get(&self.key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Read the ledger, degrading to an empty list on any failure.
    ///
    /// A corrupt ledger reads as empty so the app stays usable; the next
    /// write replaces it and the old metadata is lost.
    pub async fn read_all(&self) -> Vec<RecordingMetadata> {
        match self.load().await {
            Ok(recordings) => recordings,
            Err(e) => {
                tracing::warn!("Ledger '{}' unreadable, treating as empty: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Persist the full ledger in one write
    pub async fn write_all(&self, recordings: &[RecordingMetadata]) -> AppResult<()> {
        let raw = serde_json::to_string(recordings)?;
        self.store.set(&self.key, &raw).await?;
        tracing::debug!("Wrote {} ledger entries", recordings.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::kv::MemoryKvStore;
    use chrono::Utc;

    fn record(id: &str) -> RecordingMetadata {
        RecordingMetadata::build(
            id,
            &format!("recording_{id}.m4a"),
            &format!("/r/recording_{id}.m4a"),
            Utc::now(),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_empty_when_never_written() {
        let ledger = Ledger::new(Arc::new(MemoryKvStore::new()), "recordings");
        assert!(ledger.load().await.unwrap().is_empty());
        assert!(ledger.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_ledger_is_fail_soft() {
        let store = Arc::new(MemoryKvStore::new());
        store.set("recordings", "{not json").await.unwrap();
        let ledger = Ledger::new(store, "recordings");

        assert!(ledger.load().await.is_err());
        assert!(ledger.read_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read_keeps_order() {
        let ledger = Ledger::new(Arc::new(MemoryKvStore::new()), "recordings");
        let records = vec![record("c"), record("b"), record("a")];

        ledger.write_all(&records).await.unwrap();
        assert_eq!(ledger.read_all().await, records);
    }

    #[tokio::test]
    async fn test_rewrite_is_byte_stable() {
        let store = Arc::new(MemoryKvStore::new());
        let ledger = Ledger::new(store.clone(), "recordings");

        let mut with_extra = record("x");
        with_extra
            .extra
            .insert("label".to_string(), serde_json::json!("night"));
        ledger.write_all(&[with_extra, record("y")]).await.unwrap();
        let first = store.get("recordings").await.unwrap().unwrap();

        let reread = ledger.read_all().await;
        ledger.write_all(&reread).await.unwrap();
        let second = store.get("recordings").await.unwrap().unwrap();

        assert_eq!(first, second);
    }
}
