//! Generic tower integration
//!
//! [`RequestLoggerLayer`] wraps any `http` service. It never touches bodies:
//! `body` and `resBody` emit nothing, `form:*` reads the query string only and
//! `bytesReceived` comes from `Content-Length`. The client IP honours
//! `X-Forwarded-For` and `X-Real-IP` before falling back to the peer address.
//!
//! An `Err` from the inner service is logged with status 500 and its
//! `Display` text under `error`, then returned unchanged.

use super::{install_locals, ErrorMessage, HttpExchange, RequestHead};
use crate::config::Config;
use crate::engine::exchange::{content_length, X_FORWARDED_FOR, X_REAL_IP};
use crate::engine::RequestLogger;
use axum::body::HttpBody;
use axum::http::{HeaderMap, Request, Response, StatusCode};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Layer that logs one event per request.
#[derive(Debug, Clone)]
pub struct RequestLoggerLayer {
    logger: Arc<RequestLogger>,
}

impl RequestLoggerLayer {
    pub fn new(config: Config) -> Self {
        Self::from_logger(RequestLogger::shared(config))
    }

    /// Share an existing engine, e.g. with the axum middleware.
    pub fn from_logger(logger: Arc<RequestLogger>) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Arc<RequestLogger> {
        &self.logger
    }
}

impl<S> Layer<S> for RequestLoggerLayer {
    type Service = RequestLoggerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLoggerService {
            inner,
            logger: Arc::clone(&self.logger),
        }
    }
}

/// Service produced by [`RequestLoggerLayer`].
#[derive(Debug, Clone)]
pub struct RequestLoggerService<S> {
    inner: S,
    logger: Arc<RequestLogger>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestLoggerService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ReqBody: Send + 'static,
    ResBody: HttpBody + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Keep the instance that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let (mut parts, body) = request.into_parts();
        if self.logger.skips(&parts) {
            return Box::pin(inner.call(Request::from_parts(parts, body)));
        }

        let logger = Arc::clone(&self.logger);
        let locals = install_locals(&mut parts);
        let head = RequestHead::capture(&parts, locals);
        let request = Request::from_parts(parts, body);

        Box::pin(async move {
            let start = logger.start_timer();
            let result = inner.call(request).await;
            let latency = start.map(|start| start.elapsed());

            let client_ip = forwarded_client_ip(&head);
            let bytes_received = content_length(&head.headers);

            let (status, bytes_sent, error) = match &result {
                Ok(response) => (
                    response.status(),
                    response
                        .body()
                        .size_hint()
                        .exact()
                        .map(|len| len as i64)
                        .unwrap_or_else(|| content_length(response.headers())),
                    response
                        .extensions()
                        .get::<ErrorMessage>()
                        .map(|e| e.0.clone()),
                ),
                Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, 0, Some(err.to_string())),
            };

            let exchange = HttpExchange {
                head,
                status: status.as_u16(),
                client_ip,
                bytes_received,
                bytes_sent,
                request_body: None,
                response_body: None,
            };
            logger.log(&exchange, latency, error.as_deref());

            result
        })
    }
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
fn forwarded_client_ip(head: &RequestHead) -> String {
    if let Some(first) = header_value(&head.headers, X_FORWARDED_FOR)
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header_value(&head.headers, X_REAL_IP) {
        return real.to_string();
    }
    head.peer_ip()
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Locals;
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    fn head(headers: &[(&'static str, &'static str)]) -> RequestHead {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 8080))));
        RequestHead::capture(&parts, Locals::new())
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let head = head(&[("x-forwarded-for", " 203.0.113.9, 10.0.0.1"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(forwarded_client_ip(&head), "203.0.113.9");
    }

    #[test]
    fn test_client_ip_from_real_ip() {
        let head = head(&[("x-real-ip", "198.51.100.2")]);
        assert_eq!(forwarded_client_ip(&head), "198.51.100.2");
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        assert_eq!(forwarded_client_ip(&head(&[])), "127.0.0.1");
        assert_eq!(forwarded_client_ip(&head(&[("x-forwarded-for", "")])), "127.0.0.1");
    }
}
