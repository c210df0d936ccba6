//! Model relay: the seam between the chat route and a text-generation
//! provider.
//!
//! A [`ChatProvider`] turns a validated request into a [`ChunkStream`]. The
//! stream is lazy and single pass: each call issues exactly one upstream
//! request and nothing is retried.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use super::request::{ChatMessage, ChatModel, ChatRequest};

/// One fragment of generated text, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatChunk(String);

impl ChatChunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Ordered, finite sequence of chunks produced by one upstream call.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, RelayError>> + Send>>;

/// Failures while talking to the provider.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The connection to the provider could not be established.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider answered with a non-success status.
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    /// No response (or no further chunk) arrived in time.
    #[error("upstream timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The stream broke after it started.
    #[error("upstream stream error: {0}")]
    Stream(String),

    /// The provider sent something that is not a valid stream event.
    #[error("failed to decode upstream event: {0}")]
    Decode(String),

    /// The upstream request could not be assembled.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

/// What the provider needs to start a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub model: ChatModel,
    pub system_instruction: String,
    pub messages: Vec<ChatMessage>,
}

impl From<ChatRequest> for ProviderRequest {
    fn from(req: ChatRequest) -> Self {
        Self {
            model: req.model,
            system_instruction: req.system_prompt,
            messages: req.messages,
        }
    }
}

/// A streaming text-generation backend.
///
/// `stream_chat` resolves once the provider has accepted the request; a
/// connection failure must surface here as an error, never as an empty
/// stream.
#[async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    async fn stream_chat(&self, request: ProviderRequest) -> Result<ChunkStream, RelayError>;
}
