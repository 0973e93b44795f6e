//! Centralized default constants for waymark.
//!
//! Single source of truth for shared default values. Crates reference
//! these constants instead of defining their own magic numbers.

// =============================================================================
// STORAGE
// =============================================================================

/// Default root directory for on-disk records and media.
/// Configurable via `STORAGE_PATH` env var.
pub const STORAGE_PATH: &str = "storage";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default CORS origin for the local frontend.
/// Configurable via `ALLOWED_ORIGINS` env var (comma-separated).
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Maximum request body size in bytes (50 MB), bounding media uploads.
pub const MAX_BODY_SIZE_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Anthropic API base URL.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model for streamed assistant turns.
pub const CHAT_MODEL: &str = "claude-3-sonnet-20240229";

/// Default max tokens per streamed turn.
pub const CHAT_MAX_TOKENS: u32 = 1000;

/// Timeout for streaming requests in seconds.
pub const CHAT_TIMEOUT_SECS: u64 = 120;
