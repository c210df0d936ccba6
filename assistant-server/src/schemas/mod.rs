//! Wire request / response types.
//!
//! JSON field names are camelCase. Request bodies carry `validator` rules
//! and are extracted with [`crate::extract::ValidatedJson`].

pub mod assistant;
pub mod chat;
pub mod project;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
