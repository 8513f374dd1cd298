//! Durable blob store
//!
//! Recording clips arrive as temporary files written by the capture layer.
//! This module copies them into a flat recordings directory where each blob
//! is named `recording_<id>.<ext>`, and removes them again on delete.

use crate::utils::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix shared by every blob file name
pub const BLOB_PREFIX: &str = "recording_";

/// Device capacity for the volume holding the recordings directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    pub total: u64,
    pub free: u64,
}

/// File-backed blob storage for recordings
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
    extension: String,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Recordings directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Blob file name for a recording id
    pub fn filename_for(&self, id: &str) -> String {
        format!("{}{}.{}", BLOB_PREFIX, id, self.extension)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(self.filename_for(id))
    }

    /// Create the recordings directory if it is missing
    pub async fn ensure_directory_exists(&self) -> AppResult<()> {
        if tokio::fs::metadata(&self.root).await.is_err() {
            tracing::info!("Creating recordings directory {:?}", self.root);
        }
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Copy a transient clip into the store under the name derived from `id`.
    ///
    /// `source` may be a filesystem path or a `file://` URI. Returns the
    /// absolute path of the stored blob. A failed copy may leave a partial
    /// file behind.
    pub async fn copy_to_storage(&self, source: &str, id: &str) -> AppResult<PathBuf> {
        let source_path = resolve_source(source)?;
        let destination = self.path_for(id);

        let bytes = tokio::fs::copy(&source_path, &destination).await?;
        let destination = tokio::fs::canonicalize(&destination).await?;

        tracing::debug!(
            "Copied {} bytes from {:?} to {:?}",
            bytes,
            source_path,
            destination
        );

        Ok(destination)
    }

    /// Remove a stored blob. Missing files are an error.
    pub async fn delete_blob(&self, path: &Path) -> AppResult<()> {
        tokio::fs::remove_file(path).await?;
        tracing::debug!("Deleted blob {:?}", path);
        Ok(())
    }

    /// Every blob file currently in the recordings directory
    pub async fn list_blobs(&self) -> AppResult<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut blobs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_blob = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(BLOB_PREFIX))
                .unwrap_or(false);
            if is_blob && entry.file_type().await?.is_file() {
                blobs.push(entry.path());
            }
        }
        blobs.sort();
        Ok(blobs)
    }

    /// Query total and free space for the volume holding the store
    pub async fn query_free_space(&self) -> AppResult<DiskSpace> {
        let probe = nearest_existing(&self.root);
        let stats = tokio::task::spawn_blocking(move || fs2::statvfs(&probe))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

        Ok(DiskSpace {
            total: stats.total_space(),
            free: stats.available_space(),
        })
    }
}

/// Turn a path or `file://` URI into a filesystem path
fn resolve_source(source: &str) -> AppResult<PathBuf> {
    match source.strip_prefix("file://") {
        Some(rest) => {
            let decoded = urlencoding::decode(rest).map_err(|e| {
                AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("Invalid file URI {source}: {e}"),
                ))
            })?;
            Ok(PathBuf::from(decoded.into_owned()))
        }
        None => Ok(PathBuf::from(source)),
    }
}

/// The store directory may not exist yet; statvfs needs a real path
fn nearest_existing(path: &Path) -> PathBuf {
    path.ancestors()
        .find(|p| !p.as_os_str().is_empty() && p.exists())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_ensure_directory_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("nested").join("recordings"), "m4a");

        store.ensure_directory_exists().await.unwrap();
        store.ensure_directory_exists().await.unwrap();

        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_copy_and_delete() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("capture.tmp");
        std::fs::write(&source, b"audio bytes").unwrap();

        let store = BlobStore::new(dir.path().join("recordings"), ".m4a");
        store.ensure_directory_exists().await.unwrap();

        let stored = store
            .copy_to_storage(source.to_str().unwrap(), "abc")
            .await
            .unwrap();

        assert!(stored.is_absolute());
        assert_eq!(stored.file_name().unwrap(), "recording_abc.m4a");
        assert_eq!(std::fs::read(&stored).unwrap(), b"audio bytes");
        // Source is copied, not moved
        assert!(source.exists());

        store.delete_blob(&stored).await.unwrap();
        assert!(!stored.exists());

        // Second delete fails
        assert!(matches!(
            store.delete_blob(&stored).await,
            Err(AppError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_from_file_uri() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("my clip.tmp");
        std::fs::write(&source, b"x").unwrap();

        let store = BlobStore::new(dir.path().join("recordings"), "m4a");
        store.ensure_directory_exists().await.unwrap();

        let uri = format!("file://{}", source.to_str().unwrap().replace(' ', "%20"));
        let stored = store.copy_to_storage(&uri, "uri").await.unwrap();
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn test_copy_missing_source_fails() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("recordings"), "m4a");
        store.ensure_directory_exists().await.unwrap();

        let missing = dir.path().join("nope.tmp");
        let result = store.copy_to_storage(missing.to_str().unwrap(), "x").await;
        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[tokio::test]
    async fn test_list_blobs_ignores_other_files() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path(), "m4a");

        std::fs::write(dir.path().join("recording_a.m4a"), b"a").unwrap();
        std::fs::write(dir.path().join("recording_b.m4a"), b"b").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"n").unwrap();

        let blobs = store.list_blobs().await.unwrap();
        assert_eq!(blobs.len(), 2);
    }

    #[tokio::test]
    async fn test_list_blobs_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("absent"), "m4a");
        assert!(store.list_blobs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_free_space() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("not-yet-created"), "m4a");

        let space = store.query_free_space().await.unwrap();
        assert!(space.total > 0);
        assert!(space.free <= space.total);
    }
}
