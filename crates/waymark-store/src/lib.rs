//! # waymark-store
//!
//! Filesystem persistence layer for waymark.
//!
//! This crate provides:
//! - A pluggable blob store with an atomic-write filesystem backend
//! - Repositories for journeys, threads, and media attachments
//! - The thread message engine (append, truncating edit, delete)
//! - Orphaned media sweep for crash recovery
//!
//! Records are pretty-printed JSON files named `{id}.json` inside one
//! directory per collection; media blobs are stored verbatim under
//! their generated keys.
//!
//! ## Example
//!
//! ```rust,ignore
//! use waymark_store::{CreateJourneyRequest, CreateThreadRequest, MessageRole, Storage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Storage::open("storage").await?;
//!
//!     let journey = storage.journeys.create(CreateJourneyRequest {
//!         name: "Onboarding".to_string(),
//!         description: "First-run walkthrough".to_string(),
//!         initial_message: Some("Welcome! How can I help?".to_string()),
//!     }).await?;
//!
//!     let thread = storage.threads.create(CreateThreadRequest {
//!         name: "First visit".to_string(),
//!         journey_id: journey.id,
//!     }).await?;
//!
//!     storage.threads
//!         .append_message(&thread.id, MessageRole::User, "Hi!".to_string(), None, &[])
//!         .await?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

pub mod blob;
pub mod journeys;
pub mod media;
pub mod sweep;
pub mod threads;

// Re-export core types
pub use waymark_core::*;

// Re-export repository implementations
pub use blob::{BlobStore, Collection, FsBlobStore};
pub use journeys::JourneyStore;
pub use media::{MediaStore, MediaUpload};
pub use sweep::sweep_orphaned_media;
pub use threads::ThreadStore;

/// Combined storage context with all repositories.
pub struct Storage {
    /// The underlying blob store.
    pub blobs: Arc<dyn BlobStore>,
    /// Journey repository for CRUD operations.
    pub journeys: JourneyStore,
    /// Media repository for attachment blobs.
    pub media: MediaStore,
    /// Thread repository and message mutation engine.
    pub threads: ThreadStore,
}

impl Storage {
    /// Create a new Storage instance over the given blob store.
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        let journeys = JourneyStore::new(blobs.clone());
        let media = MediaStore::new(blobs.clone());
        let threads = ThreadStore::new(blobs.clone(), journeys.clone(), media.clone());
        Self {
            journeys,
            media,
            threads,
            blobs,
        }
    }

    /// Open a filesystem-backed store rooted at the given directory.
    ///
    /// Creates the collection directories and runs a write/read/delete
    /// health check before returning.
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self> {
        let backend = FsBlobStore::new(base_path);
        backend
            .validate()
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;
        Ok(Self::new(Arc::new(backend)))
    }
}
