//! Key/value image storage shared by the capture and edit steps
//!
//! The capture step writes `processed_image` and `original_image`; the edit
//! step reads them back when a session starts. Two implementations are
//! provided: an in-memory store for a single process and a directory-backed
//! store so both steps can run as separate invocations.

use crate::error::{BgEditError, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Environment variable overriding the default store directory
pub const STORE_DIR_ENV: &str = "IMGLY_BGEDIT_STORE_DIR";

/// Well-known entries in the image store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// Post-segmentation composite whose alpha carries the raw segmentation
    ProcessedImage,
    /// Pre-segmentation source, used as the true pixel source when present
    OriginalImage,
}

impl ImageKey {
    /// Every key, in write order
    pub const ALL: [Self; 2] = [Self::ProcessedImage, Self::OriginalImage];

    /// Storage name of the key
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProcessedImage => "processed_image",
            Self::OriginalImage => "original_image",
        }
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide image storage
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Read an entry, `None` when it was never written
    async fn get(&self, key: ImageKey) -> Result<Option<Vec<u8>>>;

    /// Write an entry, replacing any previous value
    ///
    /// # Errors
    /// - `Storage` when the backend rejects the write
    async fn put(&self, key: ImageKey, bytes: Vec<u8>) -> Result<()>;

    /// Delete an entry; deleting a missing entry is not an error
    async fn remove(&self, key: ImageKey) -> Result<()>;

    /// Human-readable backend description for logs
    fn describe(&self) -> String;
}

/// In-memory store with an optional byte quota
///
/// The quota mimics browser storage limits: a write that would push the total
/// stored size over the quota fails with a `Storage` error.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    entries: Mutex<HashMap<ImageKey, Vec<u8>>>,
    quota: Option<usize>,
}

impl MemoryImageStore {
    /// Create an unbounded store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that holds at most `quota` bytes in total
    #[must_use]
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Total bytes currently stored
    pub fn used_bytes(&self) -> Result<usize> {
        Ok(self.lock()?.values().map(Vec::len).sum())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<ImageKey, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| BgEditError::internal("Image store lock poisoned"))
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn get(&self, key: ImageKey) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn put(&self, key: ImageKey, bytes: Vec<u8>) -> Result<()> {
        let mut entries = self.lock()?;

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(existing, _)| **existing != key)
                .map(|(_, value)| value.len())
                .sum();
            if others + bytes.len() > quota {
                return Err(BgEditError::storage_write_error(
                    key.as_str(),
                    &format!(
                        "quota of {} bytes exceeded ({} bytes requested)",
                        quota,
                        others + bytes.len()
                    ),
                ));
            }
        }

        entries.insert(key, bytes);
        Ok(())
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        self.lock()?.remove(&key);
        Ok(())
    }

    fn describe(&self) -> String {
        match self.quota {
            Some(quota) => format!("memory (quota {} bytes)", quota),
            None => "memory".to_string(),
        }
    }
}

/// Directory-backed store, one file per key
#[derive(Debug, Clone)]
pub struct FileImageStore {
    dir: PathBuf,
}

impl FileImageStore {
    /// Use `dir` as the store directory; it is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Store rooted at [`FileImageStore::default_dir`]
    ///
    /// # Errors
    /// - `InvalidConfig` when no cache directory can be determined
    pub fn with_default_dir() -> Result<Self> {
        Ok(Self::new(Self::default_dir()?))
    }

    /// Default store location
    ///
    /// `$IMGLY_BGEDIT_STORE_DIR` when set, otherwise:
    /// - Linux: `~/.cache/imgly-bgedit/store/`
    /// - macOS: `~/Library/Caches/imgly-bgedit/store/`
    /// - Windows: `%LOCALAPPDATA%/imgly-bgedit/store/`
    ///
    /// # Errors
    /// - `InvalidConfig` when no cache directory can be determined
    pub fn default_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                BgEditError::invalid_config(format!(
                    "Failed to determine cache directory. Set {} or pass a store directory.",
                    STORE_DIR_ENV
                ))
            })?
            .join("imgly-bgedit")
            .join("store"))
    }

    /// Directory holding the entries
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    #[must_use]
    pub fn path_for(&self, key: ImageKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    /// Staging file a write goes through before it replaces `key`
    fn temp_path_for(&self, key: ImageKey) -> PathBuf {
        self.dir.join(format!(".{}.tmp-{}", key.as_str(), std::process::id()))
    }
}

#[async_trait]
impl ImageStore for FileImageStore {
    async fn get(&self, key: ImageKey) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: ImageKey, bytes: Vec<u8>) -> Result<()> {
        let write_error =
            |e: std::io::Error| BgEditError::storage_write_error(key.as_str(), &e.to_string());

        tokio::fs::create_dir_all(&self.dir).await.map_err(write_error)?;

        // Readers only ever see the previous entry or the complete new one.
        let temp_path = self.temp_path_for(key);
        if let Err(e) = tokio::fs::write(&temp_path, bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_error(e));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, self.path_for(key)).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(write_error(e));
        }
        Ok(())
    }

    async fn remove(&self, key: ImageKey) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
