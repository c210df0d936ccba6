//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a `{"error": "..."}` JSON body with an appropriate status code.
//!
//! Database errors are logged with full detail but only a generic message
//! is returned to the caller, so SQL never leaks to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::chat::{ChatRequestError, RelayError};

/// All errors that can occur in the assistant-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with existing data.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The model provider failed before streaming began.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// Propagated from the store.
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl ServerError {
    pub fn not_found() -> Self {
        ServerError::NotFound("Not found".to_owned())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Conflict(_) => StatusCode::CONFLICT,
            ServerError::Relay(RelayError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ServerError::Relay(_) => StatusCode::BAD_GATEWAY,
            ServerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let client_message = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::BadRequest(m) | ServerError::NotFound(m) | ServerError::Conflict(m) => {
                m.clone()
            }

            ServerError::Relay(e) => {
                warn!(error = %e, "model provider request failed");
                match e {
                    RelayError::Timeout(_) => "model provider timed out".to_owned(),
                    _ => "model provider unavailable".to_owned(),
                }
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                "internal server error".to_owned()
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<sqlx::Error> for ServerError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => ServerError::not_found(),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                ServerError::Conflict("referenced resource is missing or still in use".to_owned())
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServerError::Conflict("resource already exists".to_owned())
            }
            _ => ServerError::Database(e),
        }
    }
}

impl From<ChatRequestError> for ServerError {
    fn from(e: ChatRequestError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}
