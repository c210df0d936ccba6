//! Shared helpers for unit and router tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::Value;

use crate::chat::relay::{ChatChunk, ChatProvider, ChunkStream, ProviderRequest, RelayError};
use crate::config::Config;
use crate::entities::AnyStore;
use crate::state::AppState;

// ── Store / app ───────────────────────────────────────────────────────────────

/// A migrated, private in-memory SQLite database.
pub async fn memory_store() -> AnyStore {
    AnyStore::connect("sqlite::memory:", 1)
        .await
        .expect("in-memory store")
}

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "OPENAI_API_KEY" => Some("sk-test".to_owned()),
        "ASSISTANT_SYSTEM_PROMPT" => Some("default test instruction".to_owned()),
        _ => None,
    })
    .expect("test config")
}

/// The full application router over an in-memory store and `provider`.
pub async fn test_app(provider: Arc<dyn ChatProvider>) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        store: Arc::new(memory_store().await),
        provider,
    });
    (crate::routes::build(state.clone()), state)
}

/// Build a request with an optional JSON body.
pub fn json_request(method: &str, uri: &str, body: Option<Value>) -> axum::extract::Request {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    };
    request.expect("request")
}

pub async fn body_bytes(resp: Response) -> bytes::Bytes {
    resp.into_body()
        .collect()
        .await
        .expect("response body")
        .to_bytes()
}

pub async fn body_text(resp: Response) -> String {
    String::from_utf8(body_bytes(resp).await.to_vec()).expect("utf-8 body")
}

pub async fn body_json(resp: Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("json body")
}

// ── Scripted provider ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Script {
    Chunks(Vec<String>),
    Unavailable,
    TimedOut,
    FailAfter(Vec<String>),
}

/// In-process [`ChatProvider`] that replays a fixed script and records the
/// requests it receives.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Script,
    seen: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replying(chunks: &[&str]) -> Arc<Self> {
        Self::with(Script::Chunks(chunks.iter().map(|c| c.to_string()).collect()))
    }

    /// Fails the call itself, as a refused connection would.
    pub fn unavailable() -> Arc<Self> {
        Self::with(Script::Unavailable)
    }

    /// Fails the call itself, as a provider that never answers would.
    pub fn timing_out() -> Arc<Self> {
        Self::with(Script::TimedOut)
    }

    /// Streams `chunks`, then breaks the stream.
    pub fn failing_after(chunks: &[&str]) -> Arc<Self> {
        Self::with(Script::FailAfter(chunks.iter().map(|c| c.to_string()).collect()))
    }

    fn with(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.seen.lock().ok().and_then(|s| s.last().cloned())
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn stream_chat(&self, request: ProviderRequest) -> Result<ChunkStream, RelayError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request);
        }
        let items: Vec<Result<ChatChunk, RelayError>> = match &self.script {
            Script::Unavailable => {
                return Err(RelayError::UpstreamUnavailable("connection refused".into()));
            }
            Script::TimedOut => return Err(RelayError::Timeout(Duration::from_secs(30))),
            Script::Chunks(chunks) => chunks.iter().map(|c| Ok(ChatChunk::new(c.as_str()))).collect(),
            Script::FailAfter(chunks) => chunks
                .iter()
                .map(|c| Ok(ChatChunk::new(c.as_str())))
                .chain(std::iter::once(Err(RelayError::Stream("connection reset".into()))))
                .collect(),
        };
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

// ── Mock OpenAI-compatible upstream ───────────────────────────────────────────

/// Canned answer of the mock upstream.
#[derive(Debug, Clone)]
pub struct MockUpstream {
    status: StatusCode,
    content_type: &'static str,
    body: String,
    delay: Option<Duration>,
}

impl MockUpstream {
    /// `200 OK` with `body` as a `text/event-stream`.
    pub fn sse(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: "text/event-stream",
            body: body.into(),
            delay: None,
        }
    }

    /// A non-success answer with a JSON body.
    pub fn status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_owned(),
            delay: None,
        }
    }

    /// Hold the answer back for `delay` before sending headers.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Debug, Default)]
struct Recorded {
    request: Option<Value>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct MockState {
    answer: MockUpstream,
    recorded: Arc<Mutex<Recorded>>,
}

/// Handle to a running mock upstream.
pub struct MockUpstreamHandle {
    /// API root to hand to the provider, e.g. `http://127.0.0.1:PORT/v1`.
    pub base_url: String,
    recorded: Arc<Mutex<Recorded>>,
}

impl MockUpstreamHandle {
    pub fn last_request(&self) -> Option<Value> {
        self.recorded.lock().ok().and_then(|r| r.request.clone())
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.recorded.lock().ok().and_then(|r| r.authorization.clone())
    }
}

async fn mock_completions(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Ok(mut recorded) = state.recorded.lock() {
        recorded.request = Some(body);
        recorded.authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
    }
    let answer = state.answer;
    if let Some(delay) = answer.delay {
        tokio::time::sleep(delay).await;
    }
    (
        answer.status,
        [(header::CONTENT_TYPE, answer.content_type)],
        Body::from(answer.body),
    )
        .into_response()
}

/// Serve `answer` on `127.0.0.1:<ephemeral>/v1/chat/completions`.
pub async fn spawn_mock_upstream(answer: MockUpstream) -> MockUpstreamHandle {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let app = Router::new()
        .route("/v1/chat/completions", post(mock_completions))
        .with_state(MockState {
            answer,
            recorded: recorded.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstreamHandle {
        base_url: format!("http://{addr}/v1"),
        recorded,
    }
}

/// A base URL on which nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway socket");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    format!("http://{addr}/v1")
}
