//! Recording lifecycle manager
//!
//! Orchestrates save/read/update/delete across the blob store and the
//! metadata ledger. Ledger read-modify-write cycles are serialized through a
//! single async mutex, and every successful write is broadcast as a
//! [`RecordingEvent`] so cached views can invalidate themselves.

use super::schema::{MetadataFields, RecordingMetadata};
use crate::config::StorageConfig;
use crate::storage::{BlobStore, FileKvStore, KeyValueStore, Ledger};
use crate::utils::{AppError, AppResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

/// Events emitted after a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingEvent {
    /// A recording was stored (id)
    Saved(String),
    /// A recording's metadata changed (id)
    Updated(String),
    /// A recording and its blob were removed (id)
    Deleted(String),
    /// Orphaned blobs were removed (count)
    Swept(usize),
}

/// Device capacity as reported to the frontend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCapacity {
    pub total: u64,
    pub free: u64,
    pub used: u64,
}

/// Owns the blob store and ledger and keeps them consistent
pub struct RecordingManager {
    blobs: BlobStore,
    ledger: Ledger,

    /// Held for the duration of every ledger read-modify-write
    write_lock: Mutex<()>,

    sweep_orphans_on_start: bool,

    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingManager {
    pub fn new(blobs: BlobStore, ledger: Ledger) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            blobs,
            ledger,
            write_lock: Mutex::new(()),
            sweep_orphans_on_start: false,
            event_tx,
        }
    }

    /// Manager over the file-backed key-value store in `config.data_dir`
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::with_store(config, Arc::new(FileKvStore::new(&config.data_dir)))
    }

    /// Manager over an arbitrary key-value store
    pub fn with_store(config: &StorageConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let blobs = BlobStore::new(&config.recordings_dir, &config.file_extension);
        let ledger = Ledger::new(store, config.ledger_key.clone());
        let mut manager = Self::new(blobs, ledger);
        manager.sweep_orphans_on_start = config.sweep_orphans_on_start;
        manager
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Subscribe to write events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    fn emit(&self, event: RecordingEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Prepare storage. Safe to call more than once.
    pub async fn initialize(&self) -> AppResult<()> {
        self.blobs
            .ensure_directory_exists()
            .await
            .map_err(|e| AppError::storage("initialize", e))?;

        if self.sweep_orphans_on_start {
            match self.sweep_orphaned_blobs().await {
                Ok(removed) if !removed.is_empty() => {
                    tracing::info!("Startup sweep removed {} orphaned blobs", removed.len())
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Startup sweep skipped: {}", e),
            }
        }

        tracing::debug!("Recording storage ready at {:?}", self.blobs.root());
        Ok(())
    }

    /// Copy `source` into the store and prepend its metadata to the ledger.
    ///
    /// If the copy succeeds but the ledger write fails, the blob stays on
    /// disk without a ledger entry; `sweep_orphaned_blobs` reclaims it.
    pub async fn save_recording(
        &self,
        source: &str,
        metadata: Option<MetadataFields>,
    ) -> AppResult<RecordingMetadata> {
        let op = "save";
        self.blobs
            .ensure_directory_exists()
            .await
            .map_err(|e| AppError::storage(op, e))?;

        let id = Uuid::new_v4().to_string();
        let filename = self.blobs.filename_for(&id);
        let mut record = RecordingMetadata::build(&id, &filename, "", Utc::now(), metadata)
            .map_err(|e| AppError::storage(op, e))?;

        // Held across the copy too, so a sweep never sees the blob without its entry
        let _guard = self.write_lock.lock().await;
        let stored = self
            .blobs
            .copy_to_storage(source, &id)
            .await
            .map_err(|e| AppError::storage(op, e))?;
        record.uri = stored.to_string_lossy().into_owned();

        let mut recordings = self.ledger.read_all().await;
        recordings.insert(0, record.clone());

        if let Err(e) = self.ledger.write_all(&recordings).await {
            tracing::warn!("Ledger write failed, blob {:?} left orphaned", stored);
            return Err(AppError::storage(op, e));
        }

        tracing::info!("Saved recording {} ({})", record.id, record.filename);
        self.emit(RecordingEvent::Saved(record.id.clone()));
        Ok(record)
    }

    /// All recordings, newest first. An unreadable ledger reads as empty.
    pub async fn get_recordings(&self) -> Vec<RecordingMetadata> {
        self.ledger.read_all().await
    }

    /// All recordings, newest first, surfacing ledger failures
    pub async fn try_get_recordings(&self) -> AppResult<Vec<RecordingMetadata>> {
        self.ledger.load().await
    }

    /// Look up one recording; `None` when the id is unknown
    pub async fn get_recording_by_id(&self, id: &str) -> Option<RecordingMetadata> {
        self.ledger
            .read_all()
            .await
            .into_iter()
            .find(|recording| recording.id == id)
    }

    /// Shallow-merge `patch` into the recording with `id`.
    ///
    /// The ledger is rewritten even when nothing matched; an unknown id
    /// returns `Ok(None)` rather than an error.
    pub async fn update_recording(
        &self,
        id: &str,
        patch: &MetadataFields,
    ) -> AppResult<Option<RecordingMetadata>> {
        let op = "update";
        let _guard = self.write_lock.lock().await;
        let mut recordings = self.ledger.read_all().await;

        let mut updated = None;
        if let Some(recording) = recordings.iter_mut().find(|r| r.id == id) {
            recording
                .apply_patch(patch)
                .map_err(|e| AppError::storage(op, e))?;
            updated = Some(recording.clone());
        }

        self.ledger
            .write_all(&recordings)
            .await
            .map_err(|e| AppError::storage(op, e))?;

        match &updated {
            Some(recording) => {
                tracing::info!("Updated recording {}", recording.id);
                self.emit(RecordingEvent::Updated(recording.id.clone()));
            }
            None => tracing::debug!("Update for unknown recording {} was a no-op", id),
        }

        Ok(updated)
    }

    /// Remove a recording's blob, then its ledger entry.
    ///
    /// If the blob cannot be deleted the ledger is left untouched. If the blob
    /// is deleted but the ledger write fails, the entry outlives its blob and
    /// later deletes of that id keep failing with `Storage`; this is the
    /// reverse of the orphaned-blob gap in `save_recording`.
    pub async fn delete_recording(&self, id: &str) -> AppResult<()> {
        let op = "delete";
        let _guard = self.write_lock.lock().await;
        let mut recordings = self.ledger.read_all().await;

        let index = recordings
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        self.blobs
            .delete_blob(Path::new(&recordings[index].uri))
            .await
            .map_err(|e| AppError::storage(op, e))?;

        recordings.remove(index);
        self.ledger
            .write_all(&recordings)
            .await
            .map_err(|e| AppError::storage(op, e))?;

        tracing::info!("Deleted recording {}", id);
        self.emit(RecordingEvent::Deleted(id.to_string()));
        Ok(())
    }

    /// Device capacity, or `None` when the platform query fails
    pub async fn get_available_storage(&self) -> Option<StorageCapacity> {
        match self.blobs.query_free_space().await {
            Ok(space) => Some(StorageCapacity {
                total: space.total,
                free: space.free,
                used: space.total.saturating_sub(space.free),
            }),
            Err(e) => {
                tracing::warn!("Storage capacity unavailable: {}", e);
                None
            }
        }
    }

    /// Delete blob files that no ledger entry references.
    ///
    /// Uses the strict ledger read: if the ledger cannot be decoded nothing
    /// is deleted. Individual delete failures are logged and skipped.
    pub async fn sweep_orphaned_blobs(&self) -> AppResult<Vec<PathBuf>> {
        let op = "sweep";
        let _guard = self.write_lock.lock().await;

        let recordings = self
            .ledger
            .load()
            .await
            .map_err(|e| AppError::storage(op, e))?;
        let referenced: HashSet<&str> = recordings.iter().map(|r| r.filename.as_str()).collect();

        let blobs = self
            .blobs
            .list_blobs()
            .await
            .map_err(|e| AppError::storage(op, e))?;

        let mut removed = Vec::new();
        for blob in blobs {
            let name = blob
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if referenced.contains(name) {
                continue;
            }
            match self.blobs.delete_blob(&blob).await {
                Ok(()) => removed.push(blob),
                Err(e) => tracing::warn!("Could not remove orphaned blob {:?}: {}", blob, e),
            }
        }

        if !removed.is_empty() {
            tracing::info!("Swept {} orphaned blobs", removed.len());
            self.emit(RecordingEvent::Swept(removed.len()));
        }
        Ok(removed)
    }
}
