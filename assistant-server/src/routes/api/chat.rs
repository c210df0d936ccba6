//! `POST /api/chat`: validate, relay, stream.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde_json::Value;
use tracing::{info, info_span, warn, Instrument};

use crate::chat::{streaming_response, validate_chat_request, ChatPhase, ChatRequestError};
use crate::error::ServerError;
use crate::schemas::chat::ChatRequestBody;
use crate::schemas::ErrorBody;
use crate::state::AppState;

/// Relay a conversation to the model and stream the answer back.
///
/// The body is the concatenation of the generated text fragments in the
/// order the model produced them. Validation failures are reported before
/// any upstream call is made. If the upstream breaks after streaming began,
/// the connection is closed without a trailing error body.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "api",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Generated text, streamed", content_type = "text/event-stream", body = String),
        (status = 400, description = "Invalid chat request", body = ErrorBody),
        (status = 502, description = "Model provider unavailable", body = ErrorBody),
        (status = 504, description = "Model provider timed out", body = ErrorBody),
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServerError> {
    let span = info_span!("chat");
    async move {
        info!(phase = %ChatPhase::Received, "chat request received");

        let request = body
            .map_err(|rejection| {
                warn!(phase = %ChatPhase::Invalid, reason = %rejection.body_text(), "unreadable chat body");
                ChatRequestError::InvalidPayload
            })
            .and_then(|Json(body)| {
                validate_chat_request(&body, &state.config.default_system_prompt)
            })
            .inspect_err(|e| warn!(phase = %ChatPhase::Invalid, reason = %e, "chat request rejected"))?;

        info!(
            phase = %ChatPhase::Validated,
            model = %request.model,
            messages = request.messages.len(),
            "chat request validated"
        );

        info!(phase = %ChatPhase::Relaying, "calling model provider");
        let chunks = state
            .provider
            .stream_chat(request.into())
            .await
            .inspect_err(|e| warn!(phase = %ChatPhase::Failed, error = %e, "model provider call failed"))?;

        info!(phase = %ChatPhase::Streaming, "streaming response");
        Ok::<_, ServerError>(streaming_response(chunks, state.config.stream_idle_timeout))
    }
    .instrument(span)
    .await
}

// ── Tests ──────────────────────────────────────────────────────────────────────
