//! Key-addressed blob storage with a filesystem backend.
//!
//! Three on-disk collections (journeys, threads, media) live under one
//! base directory. Journey and thread records are `{key}.json` documents;
//! media blobs are raw `{key}` files. Writes are atomic per key: temp
//! file + `sync_all` + rename. There is no transaction across keys.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use waymark_core::{Error, Result};

/// On-disk collection a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Journeys,
    Threads,
    Media,
}

impl Collection {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Journeys => "journeys",
            Self::Threads => "threads",
            Self::Media => "media",
        }
    }

    fn file_name(self, key: &str) -> String {
        match self {
            Self::Journeys | Self::Threads => format!("{}.json", key),
            Self::Media => key.to_string(),
        }
    }

    fn key_from_file(self, file_name: &str) -> Option<String> {
        match self {
            Self::Journeys | Self::Threads => {
                file_name.strip_suffix(".json").map(str::to_string)
            }
            Self::Media => Some(file_name.to_string()),
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Blob storage trait for different storage implementations.
///
/// Allows abstracting over filesystem, S3, or other storage providers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write data under the key, replacing any existing blob.
    async fn put(&self, collection: Collection, key: &str, data: &[u8]) -> Result<()>;

    /// Read the blob. `Error::NotFound` if the key is absent.
    async fn get(&self, collection: Collection, key: &str) -> Result<Vec<u8>>;

    /// Delete the blob. Returns `false` (not an error) if already absent,
    /// so cleanup is idempotent.
    async fn delete(&self, collection: Collection, key: &str) -> Result<bool>;

    /// Check whether a key exists.
    async fn exists(&self, collection: Collection, key: &str) -> Result<bool>;

    /// List every key in the collection, sorted.
    async fn list(&self, collection: Collection) -> Result<Vec<String>>;
}

/// Filesystem blob store.
///
/// Layout: `{base_path}/{collection}/{key}[.json]`. The base path comes
/// from explicit configuration at construction; there are no ambient
/// path globals.
pub struct FsBlobStore {
    base_path: PathBuf,
}

impl FsBlobStore {
    /// Create a new filesystem store rooted at the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.base_path.join(collection.dir_name())
    }

    fn entry_path(&self, collection: Collection, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.collection_dir(collection).join(collection.file_name(key)))
    }

    /// Create the collection directories and verify the store can write,
    /// read, and delete files.
    ///
    /// Performs a full round-trip test at startup to catch filesystem
    /// issues (overlayfs quirks, permission errors) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        for collection in [Collection::Journeys, Collection::Threads, Collection::Media] {
            let dir = self.collection_dir(collection);
            fs::create_dir_all(&dir)
                .await
                .map_err(|e| format!("create_dir_all({:?}): {}", dir, e))?;
        }

        let probe = self.base_path.join(".startup-probe");
        let payload = b"waymark-startup-probe";
        fs::write(&probe, payload)
            .await
            .map_err(|e| format!("probe write {:?}: {}", probe, e))?;
        let echoed = fs::read(&probe)
            .await
            .map_err(|e| format!("probe read {:?}: {}", probe, e))?;
        if echoed != payload {
            return Err("probe read back different bytes".to_string());
        }
        fs::remove_file(&probe)
            .await
            .map_err(|e| format!("probe remove {:?}: {}", probe, e))?;

        Ok(())
    }
}

/// Validate that a key is safe for use as a filename.
/// Rejects path separators, `..`, NUL, and control characters.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("storage key cannot be empty".to_string()));
    }
    if key.contains('/') || key.contains('\\') || key.contains("..") || key.contains('\0') {
        return Err(Error::InvalidInput(format!(
            "storage key contains invalid characters: {key:?}"
        )));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(Error::InvalidInput(format!(
            "storage key contains control characters: {key:?}"
        )));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, collection: Collection, key: &str, data: &[u8]) -> Result<()> {
        let path = self.entry_path(collection, key)?;
        debug!(collection = %collection, key = %key, bytes = data.len(), "blob: put");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(dir = %parent.display(), error = %e, "blob: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "blob: File::create failed");
            e
        })?;
        file.write_all(data).await.map_err(|e| {
            warn!(error = %e, "blob: write_all failed");
            e
        })?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %path.display(), error = %e, "blob: rename failed");
            e
        })?;

        // 0644, no execute
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn get(&self, collection: Collection, key: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(collection, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(format!(
                "{}/{}",
                collection.dir_name(),
                key
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, collection: Collection, key: &str) -> Result<bool> {
        let path = self.entry_path(collection, key)?;
        if fs::try_exists(&path).await? {
            fs::remove_file(&path).await?;
            return Ok(true);
        }
        Ok(false)
    }

    async fn exists(&self, collection: Collection, key: &str) -> Result<bool> {
        let path = self.entry_path(collection, key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn list(&self, collection: Collection) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // In-flight temp files from atomic writes are not keys
            if name.ends_with(".tmp") {
                continue;
            }
            if let Some(key) = collection.key_from_file(name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}
