//! Request validation for `POST /api/chat`.
//!
//! Works on the raw JSON value rather than a serde-derived struct so each
//! failure maps onto one precise rejection reason. Checks run in a fixed
//! order: messages, message shape, model, history bounds, system prompt.

use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use super::request::{ChatMessage, ChatModel, ChatRequest, Role};

/// Maximum number of messages accepted in one request.
pub const MAX_MESSAGES: usize = 100;

/// Maximum total size of all message contents, in bytes.
pub const MAX_HISTORY_BYTES: usize = 128 * 1024; // 128 KiB

/// Why a chat request body was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatRequestError {
    #[error("messages must be a non-empty array")]
    InvalidPayload,

    #[error("invalid message format")]
    InvalidMessageShape,

    #[error("Unsupported model")]
    UnsupportedModel,

    #[error("message history too large: at most {MAX_MESSAGES} messages and {MAX_HISTORY_BYTES} bytes of content")]
    HistoryTooLarge,

    #[error("systemPrompt must be a string")]
    InvalidSystemPrompt,
}

/// Validate an inbound body and build a [`ChatRequest`].
///
/// `default_system_prompt` is used when `systemPrompt` is absent, `null`
/// or empty.
pub fn validate_chat_request(
    body: &Value,
    default_system_prompt: &str,
) -> Result<ChatRequest, ChatRequestError> {
    let raw_messages = match body.get("messages") {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => return Err(ChatRequestError::InvalidPayload),
    };

    let messages = raw_messages
        .iter()
        .map(parse_message)
        .collect::<Result<Vec<_>, _>>()?;

    let model = body
        .get("model")
        .and_then(Value::as_str)
        .and_then(|m| ChatModel::from_str(m).ok())
        .ok_or(ChatRequestError::UnsupportedModel)?;

    let history_bytes: usize = messages.iter().map(|m| m.content.len()).sum();
    if messages.len() > MAX_MESSAGES || history_bytes > MAX_HISTORY_BYTES {
        return Err(ChatRequestError::HistoryTooLarge);
    }

    let system_prompt = match body.get("systemPrompt") {
        None | Some(Value::Null) => default_system_prompt.to_owned(),
        Some(Value::String(s)) if s.is_empty() => default_system_prompt.to_owned(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(ChatRequestError::InvalidSystemPrompt),
    };

    Ok(ChatRequest {
        messages,
        model,
        system_prompt,
    })
}

fn parse_message(value: &Value) -> Result<ChatMessage, ChatRequestError> {
    let role = value
        .get("role")
        .and_then(Value::as_str)
        .and_then(|r| Role::from_str(r).ok())
        .ok_or(ChatRequestError::InvalidMessageShape)?;
    let content = value
        .get("content")
        .and_then(Value::as_str)
        .ok_or(ChatRequestError::InvalidMessageShape)?;
    Ok(ChatMessage {
        role,
        content: content.to_owned(),
    })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
