use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{AssistantStore, ProjectRecord, ProjectStore};
use crate::error::ServerError;
use crate::extract::{ResourceId, ValidatedJson};
use crate::schemas::assistant::AssistantResponse;
use crate::schemas::project::{CreateProjectRequest, ProjectResponse, UpdateProjectRequest};
use crate::schemas::ErrorBody;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_projects,
        create_project,
        get_project,
        update_project,
        delete_project,
        list_project_assistants,
        delete_project_assistants
    ),
    components(schemas(CreateProjectRequest, UpdateProjectRequest, ProjectResponse))
)]
pub struct ProjectsApi;

/// Register project routes.
///
/// The nested assistant routes reuse the `{id}` segment name; the router
/// does not allow two names for the same position.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
        .route(
            "/projects/{id}/assistants",
            get(list_project_assistants).delete(delete_project_assistants),
        )
}

// ── Project handlers ──────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/projects",
    tag = "projects",
    responses(
        (status = 200, description = "All projects, newest first", body = Vec<ProjectResponse>),
        (status = 500, description = "Backend error", body = ErrorBody),
    )
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectResponse>>, ServerError> {
    let projects = state.store.list_projects().await?;
    Ok(Json(projects.iter().map(ProjectRecord::to_response).collect()))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 500, description = "Backend error", body = ErrorBody),
    )
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ServerError> {
    let now = Utc::now();
    let project = ProjectRecord {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        created_at: now,
        updated_at: now,
    };
    state.store.create_project(project.clone()).await?;
    info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project.to_response())))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Project found", body = ProjectResponse),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
) -> Result<Json<ProjectResponse>, ServerError> {
    let project = state
        .store
        .get_project(&id.key())
        .await?
        .ok_or_else(ServerError::not_found)?;
    Ok(Json(project.to_response()))
}

#[utoipa::path(
    patch,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id (UUID)")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Bad request", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ServerError> {
    let project = state
        .store
        .update_project(&id.key(), req.into())
        .await?
        .ok_or_else(ServerError::not_found)?;
    Ok(Json(project.to_response()))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "projects",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Project deleted", body = ProjectResponse),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Project still owns assistants", body = ErrorBody),
    )
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    id: ResourceId,
) -> Result<Json<ProjectResponse>, ServerError> {
    let key = id.key();
    let owned = state.store.list_assistants_by_project(&key).await?;
    if !owned.is_empty() {
        return Err(ServerError::Conflict(format!(
            "project still owns {} assistant(s); delete them first",
            owned.len()
        )));
    }
    let project = state
        .store
        .delete_project(&key)
        .await?
        .ok_or_else(ServerError::not_found)?;
    info!(project_id = %project.id, "project deleted");
    Ok(Json(project.to_response()))
}

// ── Assistants of a project ───────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/projects/{id}/assistants",
    tag = "projects",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Assistants of the project", body = Vec<AssistantResponse>),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn list_project_assistants(
    State(state): State<Arc<AppState>>,
    project_id: ResourceId,
) -> Result<Json<Vec<AssistantResponse>>, ServerError> {
    let assistants = state.store.list_assistants_by_project(&project_id.key()).await?;
    Ok(Json(assistants.iter().map(|a| a.to_response()).collect()))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}/assistants",
    tag = "projects",
    params(("id" = String, Path, description = "Project id (UUID)")),
    responses(
        (status = 200, description = "Deleted assistants", body = Vec<AssistantResponse>),
        (status = 404, description = "Not found", body = ErrorBody),
    )
)]
pub async fn delete_project_assistants(
    State(state): State<Arc<AppState>>,
    project_id: ResourceId,
) -> Result<Json<Vec<AssistantResponse>>, ServerError> {
    let removed = state
        .store
        .delete_assistants_by_project(&project_id.key())
        .await?;
    info!(project_id = %project_id.0, count = removed.len(), "project assistants deleted");
    Ok(Json(removed.iter().map(|a| a.to_response()).collect()))
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::test_support::{body_json, json_request, test_app, ScriptedProvider};

    async fn app() -> Router {
        test_app(ScriptedProvider::replying(&[])).await.0
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let resp = app
            .clone()
            .oneshot(json_request(method, uri, body))
            .await
            .unwrap();
        let status = resp.status();
        (status, body_json(resp).await)
    }

    #[tokio::test]
    async fn create_get_delete_round_trip() {
        let app = app().await;

        let (status, created) = call(
            &app,
            "POST",
            "/projects",
            Some(json!({ "name": "Support", "description": "Help desk bots" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_owned();
        assert!(created["createdAt"].is_string());

        let (status, fetched) = call(&app, "GET", &format!("/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["name"], "Support");
        assert_eq!(fetched["description"], "Help desk bots");

        let (status, deleted) = call(&app, "DELETE", &format!("/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["id"], id.as_str());

        let (status, body) = call(&app, "GET", &format!("/projects/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn list_and_partial_update() {
        let app = app().await;
        let (_, a) = call(&app, "POST", "/projects", Some(json!({ "name": "A" }))).await;
        call(&app, "POST", "/projects", Some(json!({ "name": "B" }))).await;

        let (status, all) = call(&app, "GET", "/projects", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 2);

        let id = a["id"].as_str().unwrap();
        let (status, updated) = call(
            &app,
            "PATCH",
            &format!("/projects/{id}"),
            Some(json!({ "description": "now described" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "A");
        assert_eq!(updated["description"], "now described");
    }

    #[tokio::test]
    async fn invalid_bodies_are_400() {
        let app = app().await;
        for body in [json!({}), json!({ "name": "" }), json!({ "name": "x".repeat(256) })] {
            let (status, err) = call(&app, "POST", "/projects", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(err["error"].is_string());
        }
    }

    #[tokio::test]
    async fn unknown_or_malformed_ids_are_404() {
        let app = app().await;
        let missing = uuid::Uuid::new_v4();
        for uri in [format!("/projects/{missing}"), "/projects/not-a-uuid".to_owned()] {
            let (status, _) = call(&app, "GET", &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let (status, _) = call(&app, "DELETE", &uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            let (status, _) = call(&app, "PATCH", &uri, Some(json!({ "name": "x" }))).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn deleting_a_project_with_assistants_conflicts() {
        let app = app().await;
        let (_, project) = call(&app, "POST", "/projects", Some(json!({ "name": "Owner" }))).await;
        let project_id = project["id"].as_str().unwrap().to_owned();
        let (status, _) = call(
            &app,
            "POST",
            "/assistants",
            Some(json!({
                "externalId": "asst_1",
                "name": "Tutor",
                "instructions": "Teach.",
                "model": "gpt-4",
                "projectId": project_id,
                "tools": [],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = call(&app, "DELETE", &format!("/projects/{project_id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, listed) =
            call(&app, "GET", &format!("/projects/{project_id}/assistants"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, removed) =
            call(&app, "DELETE", &format!("/projects/{project_id}/assistants"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removed[0]["externalId"], "asst_1");

        let (status, _) = call(&app, "DELETE", &format!("/projects/{project_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
