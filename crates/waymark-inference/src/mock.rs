//! Mock chat backend for deterministic testing.
//!
//! Streams a configured response in fixed-size chunks so handler and
//! end-to-end tests can assert on exact streamed output without a live
//! API endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use waymark_inference::mock::MockChatBackend;
//!
//! let backend = MockChatBackend::new()
//!     .with_response("Hello from the mock")
//!     .with_chunk_size(5);
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use waymark_core::{ChatTurn, Error, Result};

use crate::streaming::{StreamingChat, TokenStream};

/// Mock streaming chat backend for testing.
#[derive(Clone)]
pub struct MockChatBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<Vec<ChatTurn>>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    response: String,
    chunk_size: usize,
    fail_request: bool,
    fail_mid_stream: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            response: "Mock response".to_string(),
            chunk_size: 4,
            fail_request: false,
            fail_mid_stream: false,
        }
    }
}

impl MockChatBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the response text to stream.
    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).response = response.into();
        self
    }

    /// Set the number of characters per streamed token.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        Arc::make_mut(&mut self.config).chunk_size = chunk_size.max(1);
        self
    }

    /// Make `stream_chat` fail before any token is produced.
    pub fn with_request_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_request = true;
        self
    }

    /// Make the stream yield its tokens and then an error.
    pub fn with_mid_stream_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_mid_stream = true;
        self
    }

    /// Get all logged transcripts for assertion.
    pub fn get_calls(&self) -> Vec<Vec<ChatTurn>> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of `stream_chat` invocations.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamingChat for MockChatBackend {
    async fn stream_chat(&self, messages: &[ChatTurn]) -> Result<TokenStream> {
        self.call_log.lock().unwrap().push(messages.to_vec());

        if self.config.fail_request {
            return Err(Error::Inference("Simulated request failure".to_string()));
        }

        let chars: Vec<char> = self.config.response.chars().collect();
        let mut tokens: Vec<Result<String>> = chars
            .chunks(self.config.chunk_size)
            .map(|chunk| Ok(chunk.iter().collect::<String>()))
            .collect();

        if self.config.fail_mid_stream {
            tokens.push(Err(Error::Inference(
                "Simulated mid-stream failure".to_string(),
            )));
        }

        Ok(Box::pin(futures::stream::iter(tokens)))
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}
