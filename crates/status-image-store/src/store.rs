//! Flat file store, one `<code>.jpg` per key

use crate::error::{Result, StoreError};
use crate::key::StatusKey;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tracing::{debug, info, warn};

/// Suffix counter so concurrent writers in this process never share a temp file
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Status image store rooted at a single directory
#[derive(Debug, Clone)]
pub struct ImageStore {
    cache_dir: PathBuf,
}

impl ImageStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory (recursive, idempotent)
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| StoreError::io(&self.cache_dir, e))?;
        info!(cache_dir = ?self.cache_dir, "Image store initialized");
        Ok(())
    }

    pub fn path_for(&self, key: &StatusKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Read an entry. `Ok(None)` means the entry does not exist; any other
    /// failure is an error and must not be treated as a miss.
    pub async fn read(&self, key: &StatusKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(data) => {
                debug!(key = %key, size = data.len(), "Read cached image");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    pub async fn contains(&self, key: &StatusKey) -> Result<bool> {
        let path = self.path_for(key);
        fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }

    /// Replace an entry with `data`.
    ///
    /// The bytes land in a temp file next to the target which is then renamed
    /// into place, so readers see either the previous or the new payload.
    pub async fn write(&self, key: &StatusKey, data: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let temp_path = self.temp_path_for(key);

        if let Err(e) = fs::write(&temp_path, data).await {
            discard_temp(&temp_path).await;
            return Err(StoreError::io(temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            discard_temp(&temp_path).await;
            return Err(StoreError::io(path, e));
        }

        debug!(key = %key, size = data.len(), "Stored image");
        Ok(())
    }

    /// Delete an entry. `Ok(false)` means there was nothing to delete.
    pub async fn remove(&self, key: &StatusKey) -> Result<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "Removed image");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn temp_path_for(&self, key: &StatusKey) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        self.cache_dir
            .join(format!(".{}.{}.{}.tmp", key.file_name(), process::id(), seq))
    }
}

async fn discard_temp(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = ?temp_path, error = %e, "Failed to remove temp file");
        }
    }
}
