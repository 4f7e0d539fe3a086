//! Host framework integrations
//!
//! Both front ends capture the request head before calling downstream, time
//! the call when latency is logged, then describe the finished exchange to
//! the shared [`RequestLogger`](crate::engine::RequestLogger) through
//! [`HttpExchange`].

pub mod axum;
pub mod tower;

use crate::engine::exchange::{first_form_value, Exchange};
use crate::engine::Locals;
use ::axum::extract::{ConnectInfo, MatchedPath};
use ::axum::http::request::Parts;
use ::axum::http::{HeaderMap, Method, Uri, Version};
use bytes::Bytes;
use std::net::SocketAddr;

/// Error text attached to a response by the handler that produced it.
///
/// Responses carrying this extension are logged with the `error` tag set.
/// [`HandlerError`](self::axum::HandlerError) inserts it automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage(pub String);

/// Reuse the request's [`Locals`] if an outer layer already installed one,
/// otherwise install a fresh store.
pub(crate) fn install_locals(parts: &mut Parts) -> Locals {
    if let Some(locals) = parts.extensions.get::<Locals>() {
        return locals.clone();
    }
    let locals = Locals::new();
    parts.extensions.insert(locals.clone());
    locals
}

/// What the engine needs from the request once it has been handed downstream.
#[derive(Debug, Clone)]
pub(crate) struct RequestHead {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
    pub route: String,
    pub locals: Locals,
}

impl RequestHead {
    pub fn capture(parts: &Parts, locals: Locals) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
            remote_addr: parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            route: parts
                .extensions
                .get::<MatchedPath>()
                .map(|path| path.as_str().to_string())
                .unwrap_or_default(),
            locals,
        }
    }

    /// Socket peer address, empty when the server doesn't provide it.
    pub fn peer_ip(&self) -> String {
        self.remote_addr
            .map(|addr| addr.ip().to_string())
            .unwrap_or_default()
    }
}

/// A finished request/response pair as seen by one of the integrations.
#[derive(Debug)]
pub(crate) struct HttpExchange {
    pub head: RequestHead,
    pub status: u16,
    pub client_ip: String,
    pub bytes_received: i64,
    pub bytes_sent: i64,
    pub request_body: Option<Bytes>,
    pub response_body: Option<Bytes>,
}

impl Exchange for HttpExchange {
    fn method(&self) -> &Method {
        &self.head.method
    }

    fn uri(&self) -> &Uri {
        &self.head.uri
    }

    fn version(&self) -> Version {
        self.head.version
    }

    fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    fn locals(&self) -> &Locals {
        &self.head.locals
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn client_ip(&self) -> String {
        self.client_ip.clone()
    }

    fn route(&self) -> &str {
        &self.head.route
    }

    /// Query string first, then an urlencoded request body if one was captured.
    fn form_value(&self, name: &str) -> String {
        first_form_value(self.raw_query().as_bytes(), name)
            .or_else(|| {
                self.request_body
                    .as_deref()
                    .filter(|_| is_urlencoded_form(&self.head.headers))
                    .and_then(|body| first_form_value(body, name))
            })
            .unwrap_or_default()
    }

    fn bytes_received(&self) -> i64 {
        self.bytes_received
    }

    fn bytes_sent(&self) -> i64 {
        self.bytes_sent
    }

    fn request_body(&self) -> Option<&[u8]> {
        self.request_body.as_deref()
    }

    fn response_body(&self) -> Option<&[u8]> {
        self.response_body.as_deref()
    }
}

fn is_urlencoded_form(headers: &HeaderMap) -> bool {
    headers
        .get(::axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::axum::http::{HeaderValue, Request};

    fn parts(uri: &str) -> Parts {
        Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn exchange(head: RequestHead, body: Option<&'static [u8]>) -> HttpExchange {
        HttpExchange {
            head,
            status: 200,
            client_ip: String::new(),
            bytes_received: 0,
            bytes_sent: 0,
            request_body: body.map(Bytes::from_static),
            response_body: None,
        }
    }

    #[test]
    fn test_install_locals_reuses_existing() {
        let mut parts = parts("/");
        let first = install_locals(&mut parts);
        first.set("user", "a");

        let second = install_locals(&mut parts);
        assert_eq!(second.get("user").unwrap().render(), "a");
    }

    #[test]
    fn test_capture_reads_extensions() {
        let mut parts = parts("/users/1");
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 4000))));
        let head = RequestHead::capture(&parts, Locals::new());
        assert_eq!(head.peer_ip(), "10.0.0.7");
        assert_eq!(head.route, "");
        assert_eq!(head.uri.path(), "/users/1");
    }

    #[test]
    fn test_form_value_query_then_body() {
        let mut parts = parts("/form?name=query");
        parts.headers.insert(
            "content-type",
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let head = RequestHead::capture(&parts, Locals::new());
        let ex = exchange(head, Some(b"name=body&other=1"));
        assert_eq!(ex.form_value("name"), "query");
        assert_eq!(ex.form_value("other"), "1");
        assert_eq!(ex.form_value("missing"), "");
    }

    #[test]
    fn test_form_value_ignores_non_form_body() {
        let parts = parts("/form");
        let head = RequestHead::capture(&parts, Locals::new());
        let ex = exchange(head, Some(b"name=body"));
        assert_eq!(ex.form_value("name"), "");
    }
}
