//! Stream forwarder: copies relay chunks onto the client connection.
//!
//! [`forward`] spawns one task per response that pulls chunks from the
//! relay and pushes their raw bytes into a small bounded channel backing
//! the HTTP body. The task ends when the relay finishes, when the relay
//! fails, when no chunk arrives within the idle timeout, or when the
//! client goes away (the body, and with it the receiver, is dropped).
//! In every case the upstream stream is dropped on exit, which releases
//! the upstream connection.

use std::io;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn, Instrument};

use super::relay::{ChunkStream, RelayError};
use super::request::ChatPhase;

/// Chunks allowed in flight between the relay task and the socket writer.
const CHANNEL_CAPACITY: usize = 16;

/// How a forwarding task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The relay produced its last chunk.
    Completed,
    /// The client disconnected first.
    ClientGone,
    /// The relay failed or went silent; the connection is aborted.
    Failed,
}

/// Spawn the forwarding task and return the body stream it feeds.
pub fn forward(
    chunks: ChunkStream,
    idle_timeout: Duration,
) -> (ReceiverStream<Result<Bytes, io::Error>>, tokio::task::JoinHandle<ForwardOutcome>) {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handle = tokio::spawn(pump(chunks, tx, idle_timeout).in_current_span());
    (ReceiverStream::new(rx), handle)
}

/// Build the streaming `200 OK` response around [`forward`].
pub fn streaming_response(chunks: ChunkStream, idle_timeout: Duration) -> Response {
    let (body, _task) = forward(chunks, idle_timeout);
    let mut response = Response::new(Body::from_stream(body));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response
}

async fn pump(
    mut chunks: ChunkStream,
    tx: mpsc::Sender<Result<Bytes, io::Error>>,
    idle_timeout: Duration,
) -> ForwardOutcome {
    let mut forwarded = 0usize;
    let mut bytes = 0usize;

    let outcome = loop {
        let next = tokio::select! {
            _ = tx.closed() => break ForwardOutcome::ClientGone,
            next = tokio::time::timeout(idle_timeout, chunks.next()) => next,
        };

        match next {
            Ok(Some(Ok(chunk))) => {
                let data = Bytes::from(chunk.into_string());
                bytes += data.len();
                forwarded += 1;
                if tx.send(Ok(data)).await.is_err() {
                    break ForwardOutcome::ClientGone;
                }
            }
            Ok(Some(Err(e))) => {
                warn!(phase = %ChatPhase::Failed, error = %e, forwarded, "upstream failed mid-stream");
                let _ = tx.send(Err(io::Error::other(e))).await;
                break ForwardOutcome::Failed;
            }
            Ok(None) => break ForwardOutcome::Completed,
            Err(_) => {
                let e = RelayError::Timeout(idle_timeout);
                warn!(phase = %ChatPhase::Failed, error = %e, forwarded, "upstream went idle");
                let _ = tx.send(Err(io::Error::other(e))).await;
                break ForwardOutcome::Failed;
            }
        }
    };

    match outcome {
        ForwardOutcome::Completed => {
            info!(phase = %ChatPhase::Completed, chunks = forwarded, bytes, "chat stream completed");
        }
        ForwardOutcome::ClientGone => {
            debug!(chunks = forwarded, "client disconnected; releasing upstream stream");
        }
        ForwardOutcome::Failed => {}
    }
    outcome
}

// ── Tests ──────────────────────────────────────────────────────────────────────
