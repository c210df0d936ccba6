use axum::Json;
use serde_json::{json, Value};

/// Liveness check kept for the desktop client.
#[utoipa::path(
    get,
    path = "/api/hello-world",
    tag = "api",
    responses(
        (status = 200, description = "Greeting", body = Value)
    )
)]
pub async fn hello_world() -> Json<Value> {
    Json(json!({ "data": "Hello World!" }))
}
