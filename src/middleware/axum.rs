//! axum integration
//!
//! Mount [`log_requests`] with `axum::middleware::from_fn_with_state`:
//!
//! ```rust
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use reqlog::{Config, RequestLogger};
//! use reqlog::middleware::axum::log_requests;
//!
//! let logger = RequestLogger::shared(Config::default().with_format(["status", "route"]));
//! let app: Router = Router::new()
//!     .route("/users/:id", get(|| async { "user" }))
//!     .route_layer(from_fn_with_state(logger, log_requests));
//! ```
//!
//! With `route_layer` the middleware runs after routing, so the `route` tag
//! sees the matched pattern. With `layer` it runs before routing and `route`
//! is empty.
//!
//! Request and response bodies are read ahead only when `body`, `form:*` or
//! `resBody` is tagged, and only up to
//! [`Config::body_limit`](crate::config::Config::body_limit) bytes. The
//! body passed on yields exactly what the original did, errors included. Handler errors are reported by returning
//! [`HandlerError`] (or any response carrying an
//! [`ErrorMessage`](super::ErrorMessage) extension).

use super::{install_locals, ErrorMessage, HttpExchange, RequestHead};
use crate::engine::exchange::content_length;
use crate::engine::RequestLogger;
use axum::body::{Body, Bytes, HttpBody};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;
use futures::{future, stream, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Log one event per request through `logger`.
pub async fn log_requests(
    State(logger): State<Arc<RequestLogger>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    if logger.skips(&parts) {
        return next.run(Request::from_parts(parts, body)).await;
    }

    let locals = install_locals(&mut parts);
    let head = RequestHead::capture(&parts, locals);

    let limit = logger.config().body_limit;

    let received_hint = body_size(&body, &head.headers);
    let (body, request_body, received) = if logger.needs_request_body() {
        let captured = capture(body, limit, "request").await;
        (captured.body, captured.bytes, captured.total)
    } else {
        (body, None, None)
    };
    let bytes_received = received.map_or(received_hint, |n| n as i64);

    let start = logger.start_timer();
    let response = next.run(Request::from_parts(parts, body)).await;
    let latency = start.map(|start| start.elapsed());

    let (parts, body) = response.into_parts();
    let error = parts.extensions.get::<ErrorMessage>().map(|e| e.0.clone());

    let sent_hint = body_size(&body, &parts.headers);
    let (body, response_body, sent) = if logger.needs_response_body() {
        let captured = capture(body, limit, "response").await;
        (captured.body, captured.bytes, captured.total)
    } else {
        (body, None, None)
    };
    let bytes_sent = sent.map_or(sent_hint, |n| n as i64);

    let exchange = HttpExchange {
        client_ip: head.peer_ip(),
        head,
        status: parts.status.as_u16(),
        bytes_received,
        bytes_sent,
        request_body,
        response_body,
    };
    logger.log(&exchange, latency, error.as_deref());

    Response::from_parts(parts, body)
}

/// A body read ahead for logging, and the body to forward in its place.
struct Captured {
    /// Yields the same bytes, and the same error if any, as the original.
    body: Body,
    /// At most `limit` bytes; `None` when the stream failed.
    bytes: Option<Bytes>,
    /// Full length, known only when the whole body was read.
    total: Option<usize>,
}

/// Read up to `limit` bytes of `body` without changing what the other side
/// receives.
async fn capture(body: Body, limit: usize, which: &'static str) -> Captured {
    let mut data = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut read = 0usize;

    while read <= limit {
        match data.next().await {
            Some(Ok(chunk)) => {
                read += chunk.len();
                chunks.push(chunk);
            }
            Some(Err(e)) => {
                tracing::warn!(body = which, error = %e, "body stream failed while capturing for logging");
                let replay = stream::iter(chunks.into_iter().map(Ok))
                    .chain(stream::once(future::ready(Err(e))));
                return Captured {
                    body: Body::from_stream(replay),
                    bytes: None,
                    total: None,
                };
            }
            None => {
                let bytes = concat(&chunks);
                return Captured {
                    body: Body::from(bytes.clone()),
                    bytes: Some(bytes),
                    total: Some(read),
                };
            }
        }
    }

    tracing::debug!(body = which, limit, "body exceeds capture limit, logging a prefix");
    let prefix = concat(&chunks).slice(..limit);
    let rest = stream::iter(chunks.into_iter().map(Ok)).chain(data);
    Captured {
        body: Body::from_stream(rest),
        bytes: Some(prefix),
        total: None,
    }
}

fn concat(chunks: &[Bytes]) -> Bytes {
    match chunks {
        [] => Bytes::new(),
        [single] => single.clone(),
        many => {
            let mut buf = BytesMut::with_capacity(many.iter().map(Bytes::len).sum());
            for chunk in many {
                buf.extend_from_slice(chunk);
            }
            buf.freeze()
        }
    }
}

/// Exact size hint, else `Content-Length`.
fn body_size(body: &Body, headers: &HeaderMap) -> i64 {
    match body.size_hint().exact() {
        Some(len) => len as i64,
        None => content_length(headers),
    }
}

/// Error returned by a handler, rendered as a plain-text response and
/// reported under the `error` tag.
///
/// ```rust
/// use axum::http::StatusCode;
/// use reqlog::middleware::axum::HandlerError;
///
/// async fn handler() -> Result<&'static str, HandlerError> {
///     Err(HandlerError::with_status(StatusCode::BAD_GATEWAY, "upstream down"))
/// }
/// ```
///
/// Any `std::error::Error` converts into a 500 via `?`.
#[derive(Debug, Clone)]
pub struct HandlerError {
    status: StatusCode,
    message: String,
}

impl HandlerError {
    /// A 500 with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<E> From<E> for HandlerError
where
    E: std::error::Error,
{
    fn from(err: E) -> Self {
        Self::new(err.to_string())
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.message.clone()).into_response();
        response.extensions_mut().insert(ErrorMessage(self.message));
        response
    }
}
