//! Core data models for waymark.
//!
//! These types are shared across all waymark crates and represent
//! the core domain entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_visible() -> bool {
    true
}

// =============================================================================
// JOURNEY TYPES
// =============================================================================

/// A conversation template. Every thread is started from a journey and
/// carries its id for the lifetime of the thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Journey {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Seeded into new threads as a hidden user message when present.
    /// Serializes as `null` when absent, matching stored documents.
    #[serde(default)]
    pub initial_message: Option<String>,
}

impl Journey {
    pub fn new(name: String, description: String, initial_message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            initial_message,
        }
    }
}

// =============================================================================
// THREAD TYPES
// =============================================================================

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for MessageRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Invalid message role: {}", s)),
        }
    }
}

/// Reference to a stored media blob, embedded in the message that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Storage key in the media collection, not the upload filename.
    pub filename: String,
    pub content_type: String,
}

/// A single message in a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub media_files: Vec<MediaFile>,
    /// Hidden messages are part of the model transcript but not shown
    /// to end users. Used for journey seed messages.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Message {
    /// Create a visible message with a fresh id and no attachments.
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            media_files: Vec::new(),
            visible: true,
        }
    }

    /// Create the hidden seed message a new thread starts with.
    pub fn seed(content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content,
            media_files: Vec::new(),
            visible: false,
        }
    }
}

/// A conversation instance, persisted as a single record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub name: String,
    pub journey_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Thread {
    pub fn new(name: String, journey_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            journey_id,
            messages: Vec::new(),
        }
    }

    /// Storage keys of every media file referenced by any message.
    pub fn media_keys(&self) -> Vec<String> {
        self.messages
            .iter()
            .flat_map(|m| m.media_files.iter().map(|f| f.filename.clone()))
            .collect()
    }
}

/// Summary view of a thread for listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
    pub name: String,
    pub journey_id: String,
}

// =============================================================================
// REQUEST/RESPONSE TYPES
// =============================================================================

/// Request body for creating a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJourneyRequest {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub initial_message: Option<String>,
}

/// Request body for creating a thread from a journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThreadRequest {
    pub name: String,
    pub journey_id: String,
}

/// Request body for renaming a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameThreadRequest {
    pub name: String,
}

/// One turn of model context, as sent by the frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: MessageRole,
    pub content: String,
}

/// Request body for streaming an assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

/// Outcome of an orphaned-media sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    /// Blobs present in the media collection.
    pub scanned: usize,
    /// Blobs referenced by at least one thread.
    pub referenced: usize,
    /// Blobs removed as unreferenced.
    pub removed: usize,
}
