//! OpenAI-compatible streaming provider.
//!
//! Built on `async-openai`: one `chat().create_stream` call per request,
//! each non-empty `choices[0].delta.content` becomes a [`ChatChunk`].

use std::future::ready;
use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseStream, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    CreateChatCompletionStreamResponse,
};
use async_openai::Client;
use async_trait::async_trait;
use futures::{Stream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use super::relay::{ChatChunk, ChatProvider, ChunkStream, ProviderRequest, RelayError};
use super::request::{ChatMessage, Role};

/// Prefix of the stream error reported for a non-success HTTP status.
const INVALID_STATUS_PREFIX: &str = "Invalid status code: ";
/// Stream error reported when the upstream closes the body without `[DONE]`.
const STREAM_ENDED: &str = "Stream ended";

/// Provider backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    upstream_timeout: Duration,
}

impl OpenAiProvider {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        upstream_timeout: Duration,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            upstream_timeout,
        }
    }
}

fn to_openai_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

/// The system instruction goes first, followed by the history in order.
fn build_request(request: &ProviderRequest) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let system: ChatCompletionRequestMessage = ChatCompletionRequestSystemMessageArgs::default()
        .content(request.system_instruction.clone())
        .build()?
        .into();

    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    messages.push(system);
    for message in &request.messages {
        messages.push(to_openai_message(message)?);
    }

    CreateChatCompletionRequestArgs::default()
        .model(request.model.as_ref())
        .messages(messages)
        .stream(true)
        .build()
}

/// Classify a failure reported before the first chunk arrived.
fn open_error(e: OpenAIError) -> RelayError {
    match e {
        OpenAIError::StreamError(message) => {
            let status = message
                .strip_prefix(INVALID_STATUS_PREFIX)
                .and_then(|rest| rest.split_whitespace().next())
                .and_then(|code| code.parse::<u16>().ok());
            match status {
                Some(status) => RelayError::UpstreamStatus(status),
                None => RelayError::UpstreamUnavailable(message),
            }
        }
        OpenAIError::Reqwest(e) => RelayError::UpstreamUnavailable(e.to_string()),
        other => stream_error(other),
    }
}

/// Classify a failure after streaming began.
fn stream_error(e: OpenAIError) -> RelayError {
    match e {
        OpenAIError::JSONDeserialize(e) => RelayError::Decode(e.to_string()),
        OpenAIError::ApiError(api) => RelayError::Stream(api.message),
        other => RelayError::Stream(other.to_string()),
    }
}

fn delta_text(response: CreateChatCompletionStreamResponse) -> Option<ChatChunk> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|text| !text.is_empty())
        .map(ChatChunk::new)
}

/// Adapt the completion stream into a chunk stream.
///
/// Ends when the upstream finishes or closes, or right after the first error.
fn chunks<S>(upstream: S) -> impl Stream<Item = Result<ChatChunk, RelayError>> + Send
where
    S: Stream<Item = Result<CreateChatCompletionStreamResponse, OpenAIError>> + Send,
{
    upstream
        .scan(false, |failed, item| {
            if *failed {
                return ready(None);
            }
            let next = match item {
                Ok(response) => Some(Ok(response)),
                Err(OpenAIError::StreamError(message)) if message == STREAM_ENDED => None,
                Err(e) => {
                    *failed = true;
                    Some(Err(stream_error(e)))
                }
            };
            ready(next)
        })
        .try_filter_map(|response| ready(Ok(delta_text(response))))
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn stream_chat(&self, request: ProviderRequest) -> Result<ChunkStream, RelayError> {
        let body = build_request(&request).map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
        debug!(model = %request.model, messages = request.messages.len(), "opening upstream stream");

        let mut upstream: ChatCompletionResponseStream = self
            .client
            .chat()
            .create_stream(body)
            .await
            .map_err(open_error)?;

        // The stream connects lazily; wait for the first event so a refused
        // connection or a rejected request fails the call itself.
        let first = tokio::time::timeout(self.upstream_timeout, upstream.next())
            .await
            .map_err(|_| RelayError::Timeout(self.upstream_timeout))?;

        match first {
            None => Ok(Box::pin(futures::stream::empty())),
            Some(Err(OpenAIError::StreamError(message))) if message == STREAM_ENDED => {
                Ok(Box::pin(futures::stream::empty()))
            }
            Some(Err(e)) => {
                let e = open_error(e);
                warn!(error = %e, "upstream rejected chat request");
                Err(e)
            }
            Some(Ok(response)) => {
                let rest = futures::stream::once(ready(Ok(response))).chain(upstream);
                Ok(Box::pin(chunks(rest)))
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
