//! Request extractors shared by the CRUD routes.
//!
//! - [`ValidatedJson`] deserializes a JSON body and runs the `validator`
//!   rules declared on the target type.
//! - [`ResourceId`] reads a single UUID path segment.
//!
//! Both reject with [`ServerError`] so failures render as `{"error": ...}`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::error::ServerError;

/// A JSON body that passed both deserialization and validation.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err: JsonRejection| {
                let message = match err {
                    JsonRejection::JsonDataError(e) => format!("Invalid JSON data: {}", e.body_text()),
                    JsonRejection::JsonSyntaxError(e) => format!("JSON syntax error: {}", e.body_text()),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".to_owned()
                    }
                    other => format!("Failed to parse JSON: {}", other.body_text()),
                };
                ServerError::BadRequest(message)
            })?;

        data.validate()
            .map_err(|errors| ServerError::BadRequest(errors.to_string()))?;

        Ok(ValidatedJson(data))
    }
}

/// A resource id taken from the path.
///
/// Ids are UUIDs; anything else cannot name an existing row, so it is
/// reported as `404 Not found` rather than a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub Uuid);

impl ResourceId {
    /// Canonical (lower-case, hyphenated) text form, as stored in the database.
    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ServerError::not_found())?;
        Uuid::parse_str(&raw)
            .map(ResourceId)
            .map_err(|_| ServerError::not_found())
    }
}
