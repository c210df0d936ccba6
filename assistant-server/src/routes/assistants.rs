use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{AssistantRecord, AssistantStore, ProjectStore, Tool};
use crate::error::ServerError;
use crate::extract::{ResourceId, ValidatedJson};
use crate::schemas::assistant::{
    AssistantResponse, CreateAssistantRequest, ToolBody, UpdateAssistantRequest,
};
use crate::schemas::ErrorBody;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(create_assistant, get_assistant, update_assistant, delete_assistant),
    components(schemas(
        CreateAssistantRequest,
        UpdateAssistantRequest,
        AssistantResponse,
        ToolBody
    ))
)]
pub struct AssistantsApi;

/// Register assistant routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/assistants", post(create_assistant))
        .route(
            "/assistants/{id}",
            get(get_assistant).patch(update_assistant).delete(delete_assistant),
        )
}

#[utoipa::path(
    post,
    path = "/assistants",
    tag = "assistants",
    request_body = CreateAssistantRequest,
    responses(
        (status = 201, description = "Assistant created", body = AssistantResponse),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 404, description = "Project not found", body = ErrorBody),
    )
)]
pub async fn create_assistant(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateAssistantRequest>,
) -> Result<(StatusCode, Json<AssistantResponse>), ServerError> {
    // Validation guarantees a UUID; normalise it to the stored form.
    let project_id = Uuid::parse_str(&req.project_id)
        .map_err(|_| ServerError::BadRequest("projectId must be a UUID".to_owned()))?
        .to_string();
    if state.store.get_project(&project_id).await?.is_none() {
        return Err(ServerError::not_found());
    }

    let now = Utc::now();
    let assistant = AssistantRecord {
        id: Uuid::new_v4().to_string(),
        external_id: req.external_id,
        project_id,
        name: req.name,
        description: req.description,
        instructions: Some(req.instructions),
        model: req.model,
        tools: req.tools.into_iter().map(Tool::from).collect(),
        metadata: req
            .metadata
            .unwrap_or_else(|| Value::Object(Default::default())),
        created_at: now,
        updated_at: now,
    };
    state.store.create_assistant(assistant.clone()).await?;
    info!(assistant_id = %assistant.id, project_id = %assistant.project_id, "assistant created");
    Ok((StatusCode::CREATED, Json(assistant.to_response())))
}

#[utoipa::path(
    get,
    path = "/assistants/{id}",
    tag = "assistants",
    params(("id" = String, Path, description = "Assistant id (UUID)")),
    responses(
        (status = 200, description = "Assistant found", body = AssistantResponse),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn get_assistant(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
) -> Result<Json<AssistantResponse>, ServerError> {
    let assistant = state
        .store
        .get_assistant(&id.key())
        .await?
        .ok_or_else(ServerError::not_found)?;
    Ok(Json(assistant.to_response()))
}

#[utoipa::path(
    patch,
    path = "/assistants/{id}",
    tag = "assistants",
    params(("id" = String, Path, description = "Assistant id (UUID)")),
    request_body = UpdateAssistantRequest,
    responses(
        (status = 200, description = "Assistant updated", body = AssistantResponse),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn update_assistant(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateAssistantRequest>,
) -> Result<Json<AssistantResponse>, ServerError> {
    let assistant = state
        .store
        .update_assistant(&id.key(), req.into())
        .await?
        .ok_or_else(ServerError::not_found)?;
    Ok(Json(assistant.to_response()))
}

#[utoipa::path(
    delete,
    path = "/assistants/{id}",
    tag = "assistants",
    params(("id" = String, Path, description = "Assistant id (UUID)")),
    responses(
        (status = 200, description = "Assistant deleted", body = AssistantResponse),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn delete_assistant(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
) -> Result<Json<AssistantResponse>, ServerError> {
    let assistant = state
        .store
        .delete_assistant(&id.key())
        .await?
        .ok_or_else(ServerError::not_found)?;
    info!(assistant_id = %assistant.id, "assistant deleted");
    Ok(Json(assistant.to_response()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
