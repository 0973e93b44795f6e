//! Thread engine: the state machine over persisted thread records.
//!
//! The record on disk is the entire state; there is no in-memory session.
//! Every mutation is load, validate, compute the next message sequence,
//! reconcile media, persist the whole record. Mutations on the same
//! thread id are serialized by a per-id lock; different ids are fully
//! independent.
//!
//! Media ordering invariant: releases happen before the record is
//! persisted. A crash mid-operation then leaves a record pointing at
//! already-gone media (detectable, recoverable by the sweep) rather than
//! live blobs with no owning record (a silent leak).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use waymark_core::{
    CreateThreadRequest, Error, MediaFile, Message, MessageRole, Result, Thread, ThreadSummary,
};

use crate::blob::{BlobStore, Collection};
use crate::journeys::JourneyStore;
use crate::media::{MediaStore, MediaUpload};

/// Owns thread records and applies message append/edit/delete operations.
pub struct ThreadStore {
    blobs: Arc<dyn BlobStore>,
    journeys: JourneyStore,
    media: MediaStore,
    /// Per-thread-id mutation locks, created lazily on first use.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ThreadStore {
    pub fn new(blobs: Arc<dyn BlobStore>, journeys: JourneyStore, media: MediaStore) -> Self {
        Self {
            blobs,
            journeys,
            media,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    async fn lock_for(&self, thread_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn load(&self, thread_id: &str) -> Result<Thread> {
        let data = match self.blobs.get(Collection::Threads, thread_id).await {
            Ok(data) => data,
            Err(Error::NotFound(_)) => return Err(Error::ThreadNotFound(thread_id.to_string())),
            Err(e) => return Err(e),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    async fn persist(&self, thread: &Thread) -> Result<()> {
        let data = serde_json::to_vec_pretty(thread)?;
        self.blobs.put(Collection::Threads, &thread.id, &data).await
    }

    /// Create a thread from a journey.
    ///
    /// The journey must resolve. When it declares a non-empty
    /// `initial_message`, the thread is seeded with exactly one hidden
    /// user message carrying that text; otherwise it starts empty.
    pub async fn create(&self, req: CreateThreadRequest) -> Result<Thread> {
        let journey = self.journeys.get(&req.journey_id).await?;

        let mut thread = Thread::new(req.name, req.journey_id);
        if let Some(initial) = journey.initial_message.as_deref() {
            if !initial.is_empty() {
                thread.messages.push(Message::seed(initial.to_string()));
            }
        }

        self.persist(&thread).await?;
        info!(
            subsystem = "store",
            component = "threads",
            op = "create",
            thread_id = %thread.id,
            journey_id = %thread.journey_id,
            message_count = thread.messages.len(),
            "thread created"
        );
        Ok(thread)
    }

    /// Load a full thread record.
    pub async fn get(&self, thread_id: &str) -> Result<Thread> {
        self.load(thread_id).await
    }

    /// Summary projection of every thread. Malformed records are skipped
    /// so one corrupt file cannot take down the listing.
    pub async fn list(&self) -> Result<Vec<ThreadSummary>> {
        let keys = self.blobs.list(Collection::Threads).await?;
        let mut summaries = Vec::with_capacity(keys.len());
        for key in keys {
            let data = match self.blobs.get(Collection::Threads, &key).await {
                Ok(data) => data,
                // Removed between list and read
                Err(Error::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };
            match serde_json::from_slice::<Thread>(&data) {
                Ok(thread) => summaries.push(ThreadSummary {
                    id: thread.id,
                    name: thread.name,
                    journey_id: thread.journey_id,
                }),
                Err(e) => {
                    tracing::warn!(
                        subsystem = "store",
                        component = "threads",
                        thread_id = %key,
                        error = %e,
                        "skipping malformed thread record"
                    );
                }
            }
        }
        Ok(summaries)
    }

    /// Replace the thread's name.
    pub async fn rename(&self, thread_id: &str, new_name: &str) -> Result<Thread> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let mut thread = self.load(thread_id).await?;
        thread.name = new_name.to_string();
        self.persist(&thread).await?;
        Ok(thread)
    }

    /// Append a message to the end of the sequence.
    ///
    /// A caller-supplied `message_id` makes the call an idempotent retry:
    /// if that id already exists, the stored message is returned unchanged
    /// and the attachments are not stored again. Existing messages are
    /// never mutated; the appended message is always visible.
    pub async fn append_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: String,
        message_id: Option<String>,
        attachments: &[MediaUpload],
    ) -> Result<Message> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let mut thread = self.load(thread_id).await?;

        if let Some(id) = message_id.as_deref() {
            if let Some(existing) = thread.messages.iter().find(|m| m.id == id) {
                debug!(
                    subsystem = "store",
                    component = "threads",
                    op = "append_message",
                    thread_id = %thread_id,
                    message_id = %id,
                    "duplicate append ignored"
                );
                return Ok(existing.clone());
            }
        }

        let mut media_files = Vec::with_capacity(attachments.len());
        for upload in attachments {
            media_files.push(
                self.media
                    .store(&upload.filename, &upload.content_type, &upload.data)
                    .await?,
            );
        }

        let mut message = Message::new(role, content);
        if let Some(id) = message_id {
            message.id = id;
        }
        message.media_files = media_files;

        thread.messages.push(message.clone());
        self.persist(&thread).await?;
        info!(
            subsystem = "store",
            component = "threads",
            op = "append_message",
            thread_id = %thread_id,
            message_id = %message.id,
            message_count = thread.messages.len(),
            media_count = message.media_files.len(),
            "message appended"
        );
        Ok(message)
    }

    /// Truncating edit: replace the message's content and discard every
    /// message after it.
    ///
    /// Media of the discarded tail is released first. When new attachments
    /// are supplied, the edited message's old media is released and
    /// replaced; otherwise its media is kept untouched. `role` and
    /// `visible` are preserved from the pre-edit message.
    pub async fn edit_message(
        &self,
        thread_id: &str,
        message_id: &str,
        new_content: String,
        new_attachments: &[MediaUpload],
    ) -> Result<Message> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let mut thread = self.load(thread_id).await?;
        let position = thread
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;

        let discarded: Vec<MediaFile> = thread.messages[position + 1..]
            .iter()
            .flat_map(|m| m.media_files.iter().cloned())
            .collect();
        self.media.release_all(&discarded).await;

        let replacement = if new_attachments.is_empty() {
            None
        } else {
            let old = thread.messages[position].media_files.clone();
            self.media.release_all(&old).await;
            let mut stored = Vec::with_capacity(new_attachments.len());
            for upload in new_attachments {
                stored.push(
                    self.media
                        .store(&upload.filename, &upload.content_type, &upload.data)
                        .await?,
                );
            }
            Some(stored)
        };

        thread.messages.truncate(position + 1);
        let message = &mut thread.messages[position];
        message.content = new_content;
        if let Some(files) = replacement {
            message.media_files = files;
        }
        let message = message.clone();

        self.persist(&thread).await?;
        info!(
            subsystem = "store",
            component = "threads",
            op = "edit_message",
            thread_id = %thread_id,
            message_id = %message_id,
            message_count = thread.messages.len(),
            "message edited, tail truncated"
        );
        Ok(message)
    }

    /// Remove exactly one message and release its media. Later messages
    /// are kept; deletion and edit have different truncation policies.
    pub async fn delete_message(&self, thread_id: &str, message_id: &str) -> Result<()> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let mut thread = self.load(thread_id).await?;
        let position = thread
            .messages
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| Error::MessageNotFound(message_id.to_string()))?;

        let removed = thread.messages.remove(position);
        self.media.release_all(&removed.media_files).await;

        self.persist(&thread).await?;
        info!(
            subsystem = "store",
            component = "threads",
            op = "delete_message",
            thread_id = %thread_id,
            message_id = %message_id,
            message_count = thread.messages.len(),
            "message deleted"
        );
        Ok(())
    }

    /// Delete the thread record and every media file it references.
    /// Media first, record second.
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let lock = self.lock_for(thread_id).await;
        let _guard = lock.lock().await;

        let thread = self.load(thread_id).await?;
        let media: Vec<MediaFile> = thread
            .messages
            .iter()
            .flat_map(|m| m.media_files.iter().cloned())
            .collect();
        let released = self.media.release_all(&media).await;

        self.blobs.delete(Collection::Threads, thread_id).await?;
        info!(
            subsystem = "store",
            component = "threads",
            op = "delete_thread",
            thread_id = %thread_id,
            media_count = released,
            "thread deleted"
        );
        Ok(())
    }
}
