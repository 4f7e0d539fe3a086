//! The accessor surface a host integration exposes to the engine
//!
//! An [`Exchange`] is a finished request/response pair as seen by one web
//! front end. Integrations implement the handful of required methods; the
//! header-derived accessors have shared default implementations.

use super::locals::{LocalValue, Locals};
use axum::http::{header, HeaderMap, Method, Uri, Version};
use url::form_urlencoded;

/// Header carrying the request id for the `id` tag.
pub const X_REQUEST_ID: &str = "x-request-id";
/// Header carrying the proxy chain for the `ips` tag.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
/// Header consulted by forwarding-aware client IP resolution.
pub const X_REAL_IP: &str = "x-real-ip";

pub trait Exchange {
    fn method(&self) -> &Method;
    fn uri(&self) -> &Uri;
    fn version(&self) -> Version;
    fn headers(&self) -> &HeaderMap;
    fn locals(&self) -> &Locals;

    /// Final response status, as set by the host.
    fn status(&self) -> u16;

    fn client_ip(&self) -> String;

    /// Matched route pattern, empty when unknown.
    fn route(&self) -> &str;

    fn form_value(&self, name: &str) -> String;

    fn bytes_received(&self) -> i64;

    fn bytes_sent(&self) -> i64;

    /// Raw request body, when the host captured it.
    fn request_body(&self) -> Option<&[u8]> {
        None
    }

    /// Raw response body, when the host captured it.
    fn response_body(&self) -> Option<&[u8]> {
        None
    }

    /// Header value by name; empty when absent or not valid text.
    fn header(&self, name: &str) -> &str {
        self.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
    }

    fn path(&self) -> &str {
        self.uri().path()
    }

    fn url(&self) -> String {
        self.uri().to_string()
    }

    /// The query string exactly as received.
    fn raw_query(&self) -> &str {
        self.uri().query().unwrap_or("")
    }

    fn protocol(&self) -> String {
        format!("{:?}", self.version())
    }

    fn host(&self) -> &str {
        match self.header(header::HOST.as_str()) {
            "" => self.uri().host().unwrap_or(""),
            host => host,
        }
    }

    /// First decoded value of query parameter `name`.
    fn query_param(&self, name: &str) -> String {
        first_form_value(self.raw_query().as_bytes(), name).unwrap_or_default()
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.trim_matches('"').to_string())
    }

    fn local(&self, key: &str) -> Option<LocalValue> {
        self.locals().get(key)
    }
}

/// Look up `name` in an `application/x-www-form-urlencoded` payload.
pub fn first_form_value(input: &[u8], name: &str) -> Option<String> {
    form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// `Content-Length` as a byte count; missing or unparsable counts as zero.
pub fn content_length(headers: &HeaderMap) -> i64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    struct Fixture {
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        locals: Locals,
    }

    impl Fixture {
        fn new(uri: &str) -> Self {
            Self {
                method: Method::GET,
                uri: uri.parse().unwrap(),
                headers: HeaderMap::new(),
                locals: Locals::new(),
            }
        }

        fn header(mut self, name: &'static str, value: &'static str) -> Self {
            self.headers.append(name, HeaderValue::from_static(value));
            self
        }
    }

    impl Exchange for Fixture {
        fn method(&self) -> &Method {
            &self.method
        }
        fn uri(&self) -> &Uri {
            &self.uri
        }
        fn version(&self) -> Version {
            Version::HTTP_11
        }
        fn headers(&self) -> &HeaderMap {
            &self.headers
        }
        fn locals(&self) -> &Locals {
            &self.locals
        }
        fn status(&self) -> u16 {
            200
        }
        fn client_ip(&self) -> String {
            String::new()
        }
        fn route(&self) -> &str {
            ""
        }
        fn form_value(&self, name: &str) -> String {
            self.query_param(name)
        }
        fn bytes_received(&self) -> i64 {
            content_length(&self.headers)
        }
        fn bytes_sent(&self) -> i64 {
            0
        }
    }

    #[test]
    fn test_uri_accessors() {
        let ex = Fixture::new("/info.html?test=true&name=a%20b");
        assert_eq!(ex.path(), "/info.html");
        assert_eq!(ex.url(), "/info.html?test=true&name=a%20b");
        assert_eq!(ex.raw_query(), "test=true&name=a%20b");
        assert_eq!(ex.query_param("name"), "a b");
        assert_eq!(ex.query_param("missing"), "");
        assert_eq!(ex.protocol(), "HTTP/1.1");
    }

    #[test]
    fn test_host_prefers_header() {
        let ex = Fixture::new("http://example.com/").header("host", "api.example.com");
        assert_eq!(ex.host(), "api.example.com");

        let ex = Fixture::new("http://example.com/");
        assert_eq!(ex.host(), "example.com");

        let ex = Fixture::new("/");
        assert_eq!(ex.host(), "");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let ex = Fixture::new("/").header("x-test-header", "test");
        assert_eq!(Exchange::header(&ex, "X-Test-Header"), "test");
        assert_eq!(Exchange::header(&ex, "X-Other"), "");
        assert_eq!(Exchange::header(&ex, "not a header"), "");
    }

    #[test]
    fn test_cookie_lookup() {
        let ex = Fixture::new("/")
            .header("cookie", "a=1; test=value")
            .header("cookie", "quoted=\"q\"");
        assert_eq!(ex.cookie("test").as_deref(), Some("value"));
        assert_eq!(ex.cookie("quoted").as_deref(), Some("q"));
        assert_eq!(ex.cookie("missing"), None);
    }

    #[test]
    fn test_content_length_lenient() {
        assert_eq!(content_length(&HeaderMap::new()), 0);

        let ex = Fixture::new("/").header("content-length", "42");
        assert_eq!(ex.bytes_received(), 42);

        let ex = Fixture::new("/").header("content-length", "lots");
        assert_eq!(ex.bytes_received(), 0);
    }

    #[test]
    fn test_first_form_value() {
        assert_eq!(first_form_value(b"a=1&b=2&a=3", "a").as_deref(), Some("1"));
        assert_eq!(first_form_value(b"name=John+Doe", "name").as_deref(), Some("John Doe"));
        assert_eq!(first_form_value(b"", "a"), None);
    }
}
