//! Recording commands
//!
//! Frontend-facing entry points. Errors are flattened to strings in the
//! `[CODE] message` form produced by `ErrorResponse`.

use crate::config::StorageConfig;
use crate::recordings::{
    MetadataFields, RecordingManager, RecordingMetadata, RecordingsCache, StorageCapacity,
};
use crate::utils::{AppError, AppResult, ErrorResponse};
use std::sync::Arc;

/// Application state for recording storage
pub struct RecorderState {
    pub manager: Arc<RecordingManager>,
    pub cache: RecordingsCache,
}

impl RecorderState {
    pub fn new(manager: Arc<RecordingManager>) -> Self {
        let cache = RecordingsCache::new(manager.clone());
        Self { manager, cache }
    }

    /// Build the file-backed manager for `config` and initialize it
    pub async fn open(config: &StorageConfig) -> AppResult<Self> {
        config.validate()?;
        let manager = Arc::new(RecordingManager::from_config(config));
        manager.initialize().await?;
        Ok(Self::new(manager))
    }
}

fn to_message(error: AppError) -> String {
    ErrorResponse::from(error).to_string()
}

/// Store a freshly captured clip
pub async fn save_recording(
    state: &RecorderState,
    source_uri: String,
    metadata: Option<MetadataFields>,
) -> Result<RecordingMetadata, String> {
    state
        .manager
        .save_recording(&source_uri, metadata)
        .await
        .map_err(to_message)
}

/// List recordings, newest first
pub async fn get_recordings(state: &RecorderState) -> Result<Vec<RecordingMetadata>, String> {
    Ok(state.cache.get().await)
}

/// Get one recording by id
pub async fn get_recording(
    state: &RecorderState,
    id: String,
) -> Result<Option<RecordingMetadata>, String> {
    Ok(state.manager.get_recording_by_id(&id).await)
}

/// Merge fields into an existing recording
pub async fn update_recording(
    state: &RecorderState,
    id: String,
    fields: MetadataFields,
) -> Result<Option<RecordingMetadata>, String> {
    state
        .manager
        .update_recording(&id, &fields)
        .await
        .map_err(to_message)
}

/// Delete a recording and its audio file
pub async fn delete_recording(state: &RecorderState, id: String) -> Result<(), String> {
    state.manager.delete_recording(&id).await.map_err(to_message)
}

/// Device storage capacity, `None` when unavailable
pub async fn get_available_storage(
    state: &RecorderState,
) -> Result<Option<StorageCapacity>, String> {
    Ok(state.manager.get_available_storage().await)
}

/// Remove audio files with no metadata entry
pub async fn sweep_orphaned_recordings(state: &RecorderState) -> Result<Vec<String>, String> {
    let removed = state
        .manager
        .sweep_orphaned_blobs()
        .await
        .map_err(to_message)?;
    Ok(removed
        .into_iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_command_round_trip() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::with_data_dir(dir.path().join("data"));
        let state = RecorderState::open(&config).await.unwrap();

        let clip = dir.path().join("clip.tmp");
        std::fs::write(&clip, b"audio").unwrap();

        let meta = match json!({"duration": 1.5}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let saved = save_recording(&state, clip.to_string_lossy().into_owned(), Some(meta))
            .await
            .unwrap();

        let listed = get_recordings(&state).await.unwrap();
        assert_eq!(listed, vec![saved.clone()]);
        assert!(dir.path().join("data").join("recordings.json").exists());

        delete_recording(&state, saved.id.clone()).await.unwrap();
        assert!(get_recordings(&state).await.unwrap().is_empty());
        assert_eq!(get_recording(&state, saved.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_errors_carry_codes() {
        let dir = tempdir().unwrap();
        let config = StorageConfig::with_data_dir(dir.path());
        let state = RecorderState::open(&config).await.unwrap();

        let err = delete_recording(&state, "missing".to_string())
            .await
            .unwrap_err();
        assert!(err.starts_with("[NOT_FOUND]"));

        let err = save_recording(&state, "/definitely/not/here.tmp".to_string(), None)
            .await
            .unwrap_err();
        assert!(err.starts_with("[STORAGE_ERROR]"));
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let mut config = StorageConfig::with_data_dir(dir.path());
        config.file_extension = "a/b".to_string();
        assert!(RecorderState::open(&config).await.is_err());
    }
}
