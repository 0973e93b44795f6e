//! Structured logging schema and field name constants for waymark.
//!
//! Every crate tags its log events with these field names, so aggregation
//! tooling can follow one request across the api, store, and inference
//! subsystems without per-crate field mappings.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Service degraded, an operator has to look |
//! | WARN  | Recovered automatically (skipped record, failed release) |
//! | INFO  | Lifecycle and completed mutations |
//! | DEBUG | Decisions and intermediate state |
//! | TRACE | Per-token / per-blob volume |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation id assigned by the HTTP layer and carried through
/// store and inference calls. UUIDv7, so ids sort by time.
pub const REQUEST_ID: &str = "request_id";

/// Originating subsystem: "api", "store", or "inference".
pub const SUBSYSTEM: &str = "subsystem";

/// Component within the subsystem.
/// Examples: "threads", "media", "sweep", "anthropic"
pub const COMPONENT: &str = "component";

/// Name of the operation being performed.
/// Examples: "append_message", "edit_message", "stream", "sweep"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Journey ID being operated on.
pub const JOURNEY_ID: &str = "journey_id";

/// Thread ID being operated on.
pub const THREAD_ID: &str = "thread_id";

/// Message ID within a thread.
pub const MESSAGE_ID: &str = "message_id";

/// Storage key of a media blob.
pub const MEDIA_KEY: &str = "media_key";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Elapsed wall-clock time in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of messages in a thread after an operation.
pub const MESSAGE_COUNT: &str = "message_count";

/// Number of media blobs touched by an operation.
pub const MEDIA_COUNT: &str = "media_count";

/// Byte length of a payload or blob.
pub const BYTES: &str = "bytes";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for a streamed turn.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation completed.
pub const SUCCESS: &str = "success";

/// Failure detail when it did not.
pub const ERROR_MSG: &str = "error";
