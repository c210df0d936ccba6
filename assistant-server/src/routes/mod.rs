//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional OpenAPI document (disable with `ASSISTANT_ENABLE_DOCS=false`)
//! - Health route
//! - `/api` chat relay
//! - Project and assistant CRUD routes

mod api;
mod assistants;
pub mod doc;
mod health;
mod projects;

use axum::routing::get;
use axum::{middleware, Router};
use crate::middleware::{cors, trace};
use crate::state::AppState;
use std::sync::Arc;

// ── Router builder ────────────────────────────────────────────────────────────

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/api", api::router())
        .merge(projects::router())
        .merge(assistants::router());

    if state.config.enable_docs {
        app = app.route("/api-docs/openapi.json", get(doc::openapi_json));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(cors::cors_layer(&state.config))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

#[cfg(test)]
mod test {
    use crate::middleware::trace::X_TRACE_ID;
    use crate::test_support::{body_json, json_request, test_app, ScriptedProvider};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (app, _) = test_app(ScriptedProvider::replying(&[])).await;
        let resp = app
            .oneshot(json_request("GET", "/api-docs/openapi.json", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let doc = body_json(resp).await;
        assert!(doc["paths"]["/api/chat"].is_object());
    }

    #[tokio::test]
    async fn responses_carry_trace_id() {
        let (app, _) = test_app(ScriptedProvider::replying(&[])).await;
        let resp = app
            .oneshot(json_request("GET", "/api/hello-world", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(X_TRACE_ID));
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (app, _) = test_app(ScriptedProvider::replying(&[])).await;
        let resp = app
            .oneshot(json_request("GET", "/nope", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
