//! Media attachment storage.
//!
//! Blobs live in the media collection under generated keys; the upload
//! filename never becomes a storage key. A blob's lifetime is tied to
//! being referenced by some message's `media_files`; release is the
//! engine-driven half of that contract, the sweep the recovery half.

use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;
use waymark_core::{detect_content_type, safe_extension, MediaFile, Result};

use crate::blob::{BlobStore, Collection};

/// An uploaded attachment not yet written to the media collection.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Attachment lifecycle operations over the media collection.
#[derive(Clone)]
pub struct MediaStore {
    blobs: Arc<dyn BlobStore>,
}

impl MediaStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Store attachment bytes verbatim under a fresh key.
    ///
    /// The key is a UUIDv4, keeping the sanitized extension of the upload
    /// filename when one exists. A blank claimed content type is resolved
    /// by magic-byte detection before the descriptor is built.
    pub async fn store(
        &self,
        original_filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<MediaFile> {
        let key = match safe_extension(original_filename) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let content_type = if content_type.trim().is_empty() {
            detect_content_type(original_filename, data, "application/octet-stream")
        } else {
            content_type.to_string()
        };

        self.blobs.put(Collection::Media, &key, data).await?;
        debug!(
            subsystem = "store",
            component = "media",
            media_key = %key,
            bytes = data.len(),
            "media stored"
        );

        Ok(MediaFile {
            filename: key,
            content_type,
        })
    }

    /// Delete the blob behind a descriptor. Idempotent: an already-absent
    /// blob is a no-op, not an error.
    pub async fn release(&self, file: &MediaFile) -> Result<()> {
        let removed = self.blobs.delete(Collection::Media, &file.filename).await?;
        debug!(
            subsystem = "store",
            component = "media",
            media_key = %file.filename,
            removed,
            "media released"
        );
        Ok(())
    }

    /// Release each file, continuing past individual failures so one bad
    /// descriptor cannot block cleanup of the rest. Returns the number of
    /// successful releases.
    pub async fn release_all<'a, I>(&self, files: I) -> usize
    where
        I: IntoIterator<Item = &'a MediaFile>,
    {
        let mut released = 0;
        for file in files {
            match self.release(file).await {
                Ok(()) => released += 1,
                Err(e) => {
                    warn!(
                        subsystem = "store",
                        component = "media",
                        media_key = %file.filename,
                        error = %e,
                        "media release failed, continuing"
                    );
                }
            }
        }
        released
    }

    /// Read attachment bytes back for serving. `Error::NotFound` if the
    /// key is absent; key validation rejects traversal attempts.
    pub async fn retrieve(&self, filename: &str) -> Result<Vec<u8>> {
        self.blobs.get(Collection::Media, filename).await
    }
}
