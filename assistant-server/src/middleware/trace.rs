//! Per-request trace-id middleware.
//!
//! Every request runs inside an `http_request` span carrying a trace id
//! taken from the inbound `x-trace-id` header (when it is a UUID) or freshly
//! generated. The id is forwarded to handlers and echoed on the response.
//!
//! Response bodies are never touched: `POST /api/chat` streams, and
//! buffering here would hold every chunk back until the model finished.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

pub static X_TRACE_ID: &str = "x-trace-id";

/// JSON request bodies below this size are logged at debug level.
const MAX_LOGGED_BODY_BYTES: usize = 1024;

/// Routes whose bodies carry conversation content; only their size is logged.
const WITHHELD_BODY_PATHS: &[&str] = &["/api/chat"];

pub async fn trace_middleware(req: Request, next: Next) -> Response {
    let start_time = Instant::now();

    let trace_id = req
        .headers()
        .get(X_TRACE_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);
    let trace_header = HeaderValue::from_str(&trace_id.to_string()).ok();

    let span = info_span!(
        "http_request",
        trace_id = %trace_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        info!("→ request started");

        let mut req = log_small_json_body(req).await;
        if let Some(value) = &trace_header {
            req.headers_mut().insert(X_TRACE_ID, value.clone());
        }

        let mut response = next.run(req).await;

        if let Some(value) = trace_header {
            response.headers_mut().insert(X_TRACE_ID, value);
        }
        info!(
            status = response.status().as_u16(),
            latency_ms = start_time.elapsed().as_millis(),
            "← response finished"
        );
        response
    }
    .instrument(span)
    .await
}

/// Log a request body when it is JSON with a small declared length.
///
/// Other bodies pass through untouched, so large uploads are not buffered.
async fn log_small_json_body(req: Request) -> Request {
    if !is_small_json(req.headers()) {
        return req;
    }
    let withheld = WITHHELD_BODY_PATHS.contains(&req.uri().path());
    let (parts, body) = req.into_parts();
    match to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
        Ok(bytes) => {
            if withheld {
                debug!(body_bytes = bytes.len(), "request body withheld");
            } else if let Ok(text) = std::str::from_utf8(&bytes) {
                debug!(body = %text, "request body");
            }
            Request::from_parts(parts, Body::from(bytes))
        }
        // Content-Length lied; the handler will see an empty body and reject it.
        Err(_) => Request::from_parts(parts, Body::empty()),
    }
}

fn is_small_json(headers: &HeaderMap) -> bool {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    is_json && declared_len.is_some_and(|len| len > 0 && len < MAX_LOGGED_BODY_BYTES)
}
