//! Documentation schema for `POST /api/chat`.
//!
//! The handler validates the raw JSON itself (see `chat::validate`) so that
//! each failure maps to its exact message; these types only describe the
//! accepted shape in the OpenAPI document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageBody {
    /// One of `system`, `user`, `assistant`.
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = "Hello!")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    /// Conversation history, oldest first. Must not be empty.
    pub messages: Vec<ChatMessageBody>,
    /// One of `gpt-3.5-turbo`, `gpt-4`.
    #[schema(example = "gpt-4")]
    pub model: Option<String>,
    /// Overrides the server's default system instruction.
    pub system_prompt: Option<String>,
}
