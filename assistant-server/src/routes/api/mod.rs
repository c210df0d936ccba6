//! `/api` routes: the chat relay and the hello-world check.

mod chat;
mod hello;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::schemas::chat::{ChatMessageBody, ChatRequestBody};
use crate::schemas::ErrorBody;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(chat::chat, hello::hello_world),
    components(schemas(ChatRequestBody, ChatMessageBody, ErrorBody))
)]
pub struct ApiApi;

/// Routes mounted under `/api`.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/hello-world", get(hello::hello_world))
}
