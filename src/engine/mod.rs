//! The request logging engine
//!
//! [`RequestLogger`] owns the resolved configuration, the timestamp cache and
//! the sink. Host integrations drive it per request:
//!
//! 1. [`RequestLogger::skips`]: bypass everything when the predicate says so
//! 2. [`RequestLogger::start_timer`]: only reads the clock if `latency` is tagged
//! 3. run the downstream handler
//! 4. [`RequestLogger::log`]: classify, resolve every tag, emit exactly once

pub mod exchange;
pub mod locals;
mod resolver;
pub mod severity;
pub mod tags;
pub mod timestamp;

pub use exchange::Exchange;
pub use locals::{LocalValue, Locals};
pub use severity::Severity;
pub use tags::Tag;
pub use timestamp::{Clock, TimestampCache};

use crate::config::{Config, ResolvedConfig};
use crate::sink::LogEvent;
use axum::http::request::Parts;
use axum::http::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared per-middleware engine. Build once, share behind an `Arc`.
pub struct RequestLogger {
    config: ResolvedConfig,
    timestamp: TimestampCache,
    pid: String,
    needs_request_body: bool,
    needs_response_body: bool,
}

impl RequestLogger {
    /// Resolve `config` and start the timestamp cache.
    ///
    /// The refresh loop only starts when the format contains `time`.
    pub fn new(config: Config) -> Self {
        let config = config.resolve();
        let clock = Clock::new(config.time_zone, config.time_format.clone());
        let timestamp = TimestampCache::new(clock, config.time_interval, config.enable_time);

        let needs_request_body = config
            .tags
            .iter()
            .any(|t| matches!(t, Tag::Body | Tag::Form(_)));
        let needs_response_body = config.tags.iter().any(|t| matches!(t, Tag::ResBody));

        tracing::debug!(
            format = ?config.format,
            time_zone = ?config.time_zone,
            latency = config.enable_latency,
            "request logger configured"
        );

        Self {
            config,
            timestamp,
            pid: std::process::id().to_string(),
            needs_request_body,
            needs_response_body,
        }
    }

    pub fn shared(config: Config) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    pub fn timestamp(&self) -> &TimestampCache {
        &self.timestamp
    }

    /// Whether this request bypasses logging.
    pub fn skips(&self, request: &Parts) -> bool {
        self.config.skip.as_ref().is_some_and(|skip| skip(request))
    }

    /// Start time for latency, or `None` when latency is not logged.
    pub fn start_timer(&self) -> Option<Instant> {
        self.config.enable_latency.then(Instant::now)
    }

    /// Whether a tag reads the request body (`body`, `form:*`).
    pub fn needs_request_body(&self) -> bool {
        self.needs_request_body
    }

    /// Whether a tag reads the response body (`resBody`).
    pub fn needs_response_body(&self) -> bool {
        self.needs_response_body
    }

    /// Build the event for a finished exchange without emitting it.
    ///
    /// Pure in the exchange state: the same inputs yield the same fields.
    pub fn build_event(
        &self,
        exchange: &dyn Exchange,
        latency: Option<Duration>,
        error: Option<&str>,
    ) -> LogEvent {
        let status = exchange.status();
        let mut event = LogEvent::new(Severity::from_status(status));

        let timestamp = self.timestamp.load();
        let ctx = resolver::Context {
            exchange,
            latency,
            error,
            timestamp: timestamp.as_str(),
            pid: &self.pid,
            pretty_latency: self.config.pretty_latency,
        };
        resolver::resolve_all(&self.config.tags, &ctx, &mut event);

        event.with_message(status_text(status))
    }

    /// Build and emit the event for a finished exchange.
    pub fn log(&self, exchange: &dyn Exchange, latency: Option<Duration>, error: Option<&str>) {
        let event = self.build_event(exchange, latency, error);
        self.config.sink.emit(event);
    }

    /// Stop the timestamp refresh loop. Also happens when the logger is dropped.
    pub fn shutdown(&self) {
        self.timestamp.shutdown();
    }
}

impl std::fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLogger")
            .field("config", &self.config)
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

/// Canonical reason phrase for `status`, empty when unknown.
pub fn status_text(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("")
}
