//! # waymark-inference
//!
//! Streaming chat backend abstraction for waymark.
//!
//! This crate provides:
//! - Pluggable streaming chat trait returning a token stream
//! - Anthropic messages API implementation (default)
//! - SSE parsing for Anthropic streaming events
//! - Deterministic mock backend (feature `mock`)
//!
//! # Feature Flags
//!
//! - `mock`: Enable the deterministic mock backend outside tests
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use waymark_core::{ChatTurn, MessageRole};
//! use waymark_inference::{AnthropicBackend, StreamingChat};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = AnthropicBackend::from_env().unwrap();
//!     let transcript = vec![ChatTurn {
//!         role: MessageRole::User,
//!         content: "Hello!".to_string(),
//!     }];
//!     let mut tokens = backend.stream_chat(&transcript).await.unwrap();
//!     while let Some(token) = tokens.next().await {
//!         print!("{}", token.unwrap());
//!     }
//! }
//! ```

pub mod anthropic;
pub mod streaming;

// Mock chat backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use waymark_core::*;

pub use anthropic::{
    AnthropicBackend, AnthropicConfig, DEFAULT_ANTHROPIC_URL, DEFAULT_CHAT_MODEL,
    DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS,
};
pub use streaming::{parse_sse_stream, StreamingChat, TokenStream};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockChatBackend;
