//! Lifecycle tests for the thread message engine.
//!
//! Verifies the whole-record mutation semantics: seeded creation,
//! append, truncating edit, single-message delete, and cascade delete,
//! with media blobs released in lockstep with the messages that
//! reference them.

use std::sync::Arc;

use tempfile::TempDir;
use waymark_store::{
    BlobStore, Collection, CreateJourneyRequest, CreateThreadRequest, Error, FsBlobStore,
    MediaUpload, MessageRole, Storage, Thread,
};

fn setup_storage(temp_dir: &TempDir) -> Storage {
    Storage::new(Arc::new(FsBlobStore::new(temp_dir.path())))
}

async fn create_journey(storage: &Storage, initial_message: Option<&str>) -> String {
    storage
        .journeys
        .create(CreateJourneyRequest {
            name: "Demo journey".to_string(),
            description: "Lifecycle test journey".to_string(),
            initial_message: initial_message.map(str::to_string),
        })
        .await
        .expect("Failed to create journey")
        .id
}

async fn create_thread(storage: &Storage, journey_id: &str) -> Thread {
    storage
        .threads
        .create(CreateThreadRequest {
            name: "Test thread".to_string(),
            journey_id: journey_id.to_string(),
        })
        .await
        .expect("Failed to create thread")
}

fn upload(name: &str, data: &[u8]) -> MediaUpload {
    MediaUpload {
        filename: name.to_string(),
        content_type: "application/octet-stream".to_string(),
        data: data.to_vec(),
    }
}

/// A journey with an initial message seeds every new thread with one
/// hidden user message carrying that content.
#[tokio::test]
async fn test_thread_created_with_hidden_seed_message() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, Some("Welcome aboard!")).await;

    let thread = create_thread(&storage, &journey_id).await;

    assert_eq!(
        thread.messages.len(),
        1,
        "Seeded thread should start with exactly one message"
    );
    let seed = &thread.messages[0];
    assert_eq!(seed.role, MessageRole::User);
    assert!(!seed.visible, "Seed message must be hidden from transcripts");
    assert_eq!(seed.content, "Welcome aboard!");
}

/// No initial message (absent or empty) means the thread starts empty.
#[tokio::test]
async fn test_thread_without_initial_message_starts_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);

    let without = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &without).await;
    assert!(thread.messages.is_empty());

    let blank = create_journey(&storage, Some("")).await;
    let thread = create_thread(&storage, &blank).await;
    assert!(
        thread.messages.is_empty(),
        "Empty initial message should not seed a blank message"
    );
}

/// Creating a thread against an unknown journey fails without persisting
/// anything.
#[tokio::test]
async fn test_create_thread_requires_existing_journey() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);

    let err = storage
        .threads
        .create(CreateThreadRequest {
            name: "Orphan".to_string(),
            journey_id: "no-such-journey".to_string(),
        })
        .await
        .expect_err("Thread creation should fail for unknown journey");
    assert!(matches!(err, Error::JourneyNotFound(_)));

    let summaries = storage
        .threads
        .list()
        .await
        .expect("Failed to list threads");
    assert!(summaries.is_empty(), "Failed creation must not leave a record");
}

/// Append adds to the end and never mutates messages already present.
#[tokio::test]
async fn test_append_preserves_existing_messages() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, Some("Hi")).await;
    let thread = create_thread(&storage, &journey_id).await;
    let seed = thread.messages[0].clone();

    let appended = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::Assistant,
            "Hello there".to_string(),
            None,
            &[],
        )
        .await
        .expect("Failed to append message");

    assert!(appended.visible, "Appended messages are always visible");
    assert_eq!(appended.role, MessageRole::Assistant);

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(reloaded.messages.len(), 2);
    assert_eq!(
        reloaded.messages[0], seed,
        "Append must not touch earlier messages"
    );
    assert_eq!(reloaded.messages[1].id, appended.id);
}

/// Attachment bytes survive the append and come back under the stored key.
#[tokio::test]
async fn test_append_stores_attachments() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let message = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "see attachment".to_string(),
            None,
            &[upload("report.txt", b"quarterly numbers")],
        )
        .await
        .expect("Failed to append message with attachment");

    assert_eq!(message.media_files.len(), 1);
    let stored = &message.media_files[0];
    assert!(stored.filename.ends_with(".txt"), "Stored key keeps the extension");

    let data = storage
        .media
        .retrieve(&stored.filename)
        .await
        .expect("Attachment should be retrievable after append");
    assert_eq!(data, b"quarterly numbers");
}

/// Retrying an append with the same client-supplied message id must not
/// duplicate the message or leak attachment blobs.
#[tokio::test]
async fn test_append_with_client_id_is_idempotent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let first = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "retry me".to_string(),
            Some("client-msg-1".to_string()),
            &[upload("once.bin", &[1, 2, 3])],
        )
        .await
        .expect("Failed to append message");

    let second = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "retry me".to_string(),
            Some("client-msg-1".to_string()),
            &[upload("once.bin", &[1, 2, 3])],
        )
        .await
        .expect("Retried append should succeed");

    assert_eq!(second, first, "Retry must return the already-stored message");

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(reloaded.messages.len(), 1, "Retry must not duplicate the message");

    let media_keys = storage
        .blobs
        .list(Collection::Media)
        .await
        .expect("Failed to list media");
    assert_eq!(media_keys.len(), 1, "Retry must not store duplicate blobs");
}

/// Editing message i discards every later message and releases their
/// media along with them.
#[tokio::test]
async fn test_edit_discards_later_messages_and_their_media() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let m0 = storage
        .threads
        .append_message(&thread.id, MessageRole::User, "first".to_string(), None, &[])
        .await
        .expect("Failed to append m0");
    let m1 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::Assistant,
            "second".to_string(),
            None,
            &[upload("m1.bin", b"m1 data")],
        )
        .await
        .expect("Failed to append m1");
    let m2 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "third".to_string(),
            None,
            &[upload("m2.bin", b"m2 data")],
        )
        .await
        .expect("Failed to append m2");

    let edited = storage
        .threads
        .edit_message(&thread.id, &m0.id, "first, revised".to_string(), &[])
        .await
        .expect("Failed to edit message");
    assert_eq!(edited.id, m0.id);
    assert_eq!(edited.content, "first, revised");

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(
        reloaded.messages.len(),
        1,
        "Edit must discard every message after the edited one"
    );
    assert_eq!(reloaded.messages[0].id, m0.id);

    for discarded in [&m1, &m2] {
        let key = &discarded.media_files[0].filename;
        let err = storage
            .media
            .retrieve(key)
            .await
            .expect_err("Discarded attachment should be gone");
        assert!(matches!(err, Error::NotFound(_)));
    }
}

/// Without replacement files the edited message keeps its attachments;
/// with replacements the old blobs are released.
#[tokio::test]
async fn test_edit_replaces_media_only_when_new_files_given() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let message = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "with file".to_string(),
            None,
            &[upload("original.bin", b"original")],
        )
        .await
        .expect("Failed to append message");
    let original_key = message.media_files[0].filename.clone();

    // No new files: attachments unchanged.
    let edited = storage
        .threads
        .edit_message(&thread.id, &message.id, "new text".to_string(), &[])
        .await
        .expect("Failed to edit without files");
    assert_eq!(edited.media_files, message.media_files);
    assert!(
        storage.media.retrieve(&original_key).await.is_ok(),
        "Edit without files must keep existing attachments"
    );

    // New files: old attachment released, new one stored.
    let replaced = storage
        .threads
        .edit_message(
            &thread.id,
            &message.id,
            "replaced".to_string(),
            &[upload("replacement.bin", b"replacement")],
        )
        .await
        .expect("Failed to edit with replacement files");
    assert_eq!(replaced.media_files.len(), 1);
    let replacement_key = &replaced.media_files[0].filename;
    assert_ne!(replacement_key, &original_key);

    let err = storage
        .media
        .retrieve(&original_key)
        .await
        .expect_err("Replaced attachment should be released");
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(
        storage
            .media
            .retrieve(replacement_key)
            .await
            .expect("Replacement should be retrievable"),
        b"replacement"
    );
}

/// Edit rewrites content but never the message's role or visibility.
#[tokio::test]
async fn test_edit_preserves_role_and_visibility() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, Some("Hi")).await;
    let thread = create_thread(&storage, &journey_id).await;
    let seed_id = thread.messages[0].id.clone();

    let edited = storage
        .threads
        .edit_message(&thread.id, &seed_id, "Hi there".to_string(), &[])
        .await
        .expect("Failed to edit seed message");

    assert_eq!(edited.role, MessageRole::User);
    assert!(!edited.visible, "Edit must not flip a hidden message visible");
    assert_eq!(edited.content, "Hi there");
}

/// Editing an unknown message fails and leaves the thread untouched.
#[tokio::test]
async fn test_edit_unknown_message_fails() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;
    storage
        .threads
        .append_message(&thread.id, MessageRole::User, "keep".to_string(), None, &[])
        .await
        .expect("Failed to append message");

    let err = storage
        .threads
        .edit_message(&thread.id, "no-such-message", "x".to_string(), &[])
        .await
        .expect_err("Edit of unknown message should fail");
    assert!(matches!(err, Error::MessageNotFound(_)));

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(reloaded.messages.len(), 1);
    assert_eq!(reloaded.messages[0].content, "keep");
}

/// Delete removes exactly the addressed message; earlier and later
/// messages and their media stay intact.
#[tokio::test]
async fn test_delete_message_removes_exactly_one() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let m0 = storage
        .threads
        .append_message(&thread.id, MessageRole::User, "zero".to_string(), None, &[])
        .await
        .expect("Failed to append m0");
    let m1 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::Assistant,
            "one".to_string(),
            None,
            &[upload("doomed.bin", b"doomed")],
        )
        .await
        .expect("Failed to append m1");
    let m2 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "two".to_string(),
            None,
            &[upload("survivor.bin", b"survivor")],
        )
        .await
        .expect("Failed to append m2");

    storage
        .threads
        .delete_message(&thread.id, &m1.id)
        .await
        .expect("Failed to delete message");

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    let ids: Vec<&str> = reloaded.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![m0.id.as_str(), m2.id.as_str()],
        "Delete must remove exactly one message and keep order"
    );

    let err = storage
        .media
        .retrieve(&m1.media_files[0].filename)
        .await
        .expect_err("Deleted message's attachment should be released");
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(
        storage
            .media
            .retrieve(&m2.media_files[0].filename)
            .await
            .expect("Sibling attachment must survive"),
        b"survivor"
    );
}

/// Deleting a thread removes the record and every attachment it owned.
#[tokio::test]
async fn test_delete_thread_releases_all_media() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let m0 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "a".to_string(),
            None,
            &[upload("a.bin", b"a")],
        )
        .await
        .expect("Failed to append m0");
    let m1 = storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::Assistant,
            "b".to_string(),
            None,
            &[upload("b.bin", b"b")],
        )
        .await
        .expect("Failed to append m1");

    storage
        .threads
        .delete_thread(&thread.id)
        .await
        .expect("Failed to delete thread");

    let err = storage
        .threads
        .get(&thread.id)
        .await
        .expect_err("Deleted thread should be gone");
    assert!(matches!(err, Error::ThreadNotFound(_)));

    for message in [&m0, &m1] {
        let key = &message.media_files[0].filename;
        assert!(
            storage.media.retrieve(key).await.is_err(),
            "Thread deletion must release every attachment"
        );
    }

    let err = storage
        .threads
        .delete_thread(&thread.id)
        .await
        .expect_err("Second delete should report the thread missing");
    assert!(matches!(err, Error::ThreadNotFound(_)));
}

/// Rename changes the name and nothing else.
#[tokio::test]
async fn test_rename_preserves_messages() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, Some("Hi")).await;
    let thread = create_thread(&storage, &journey_id).await;

    let renamed = storage
        .threads
        .rename(&thread.id, "Renamed thread")
        .await
        .expect("Failed to rename thread");

    assert_eq!(renamed.name, "Renamed thread");
    assert_eq!(renamed.id, thread.id);
    assert_eq!(renamed.messages, thread.messages);
}

/// Listing yields one summary per thread with id, name, and journey.
#[tokio::test]
async fn test_list_returns_summaries() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, None).await;

    let first = create_thread(&storage, &journey_id).await;
    let second = create_thread(&storage, &journey_id).await;

    let summaries = storage
        .threads
        .list()
        .await
        .expect("Failed to list threads");
    assert_eq!(summaries.len(), 2);

    let mut ids: Vec<&str> = summaries.iter().map(|s| s.id.as_str()).collect();
    ids.sort_unstable();
    let mut expected = vec![first.id.as_str(), second.id.as_str()];
    expected.sort_unstable();
    assert_eq!(ids, expected);
    assert!(summaries.iter().all(|s| s.journey_id == journey_id));
}

/// Concurrent appends to one thread must all land; the whole-record
/// read-modify-write is serialized per thread id.
#[tokio::test]
async fn test_concurrent_appends_are_serialized() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = Arc::new(setup_storage(&temp_dir));
    let journey_id = create_journey(&storage, None).await;
    let thread = create_thread(&storage, &journey_id).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let storage = storage.clone();
        let thread_id = thread.id.clone();
        handles.push(tokio::spawn(async move {
            storage
                .threads
                .append_message(
                    &thread_id,
                    MessageRole::User,
                    format!("message {i}"),
                    None,
                    &[],
                )
                .await
        }));
    }
    for handle in handles {
        handle
            .await
            .expect("Append task panicked")
            .expect("Concurrent append failed");
    }

    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(
        reloaded.messages.len(),
        8,
        "No append may be lost under concurrent writers"
    );
}

/// Full lifecycle walk: seeded creation, append, truncating edit.
#[tokio::test]
async fn test_conversation_lifecycle_end_to_end() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = setup_storage(&temp_dir);
    let journey_id = create_journey(&storage, Some("Hi")).await;

    let thread = create_thread(&storage, &journey_id).await;
    assert_eq!(thread.messages.len(), 1);
    assert!(!thread.messages[0].visible);
    assert_eq!(thread.messages[0].content, "Hi");

    storage
        .threads
        .append_message(
            &thread.id,
            MessageRole::User,
            "Hello".to_string(),
            None,
            &[],
        )
        .await
        .expect("Failed to append greeting");
    let reloaded = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(reloaded.messages.len(), 2);

    let seed_id = reloaded.messages[0].id.clone();
    storage
        .threads
        .edit_message(&thread.id, &seed_id, "Hi there".to_string(), &[])
        .await
        .expect("Failed to edit seed message");

    let final_state = storage
        .threads
        .get(&thread.id)
        .await
        .expect("Failed to reload thread");
    assert_eq!(
        final_state.messages.len(),
        1,
        "Edit of the first message should leave only that message"
    );
    assert_eq!(final_state.messages[0].content, "Hi there");
    assert_eq!(final_state.messages[0].role, MessageRole::User);
    assert!(!final_state.messages[0].visible);
}
