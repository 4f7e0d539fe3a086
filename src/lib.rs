//! reqlog - tag-driven structured request logging
//!
//! This library provides a request-logging middleware that emits exactly one
//! structured event per HTTP request. Which fields end up in the event is
//! selected by an ordered list of tags (`"status"`, `"latency"`,
//! `"header:X-Request-Id"`, ...) resolved against the finished request and
//! response.
//!
//! The engine ([`engine::RequestLogger`]) is shared by two thin front ends:
//!
//! - [`middleware::axum`]: an axum `from_fn_with_state` middleware with body
//!   capture, matched routes and handler error reporting.
//! - [`middleware::tower`]: a generic tower [`Layer`](::tower::Layer) for any
//!   `http` service.
//!
//! # Example
//!
//! ```no_run
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use reqlog::config::Config;
//! use reqlog::engine::RequestLogger;
//! use reqlog::middleware::axum::log_requests;
//!
//! let logger = RequestLogger::shared(Config::default().with_format([
//!     "time", "status", "latency", "method", "path", "header:X-Request-Id",
//! ]));
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .layer(from_fn_with_state(logger, log_requests));
//! ```

pub mod config;
pub mod engine;
pub mod logging;
pub mod middleware;
pub mod sink;

pub use config::Config;
pub use engine::{Locals, LocalValue, RequestLogger, Severity};
pub use sink::{LogEvent, LogSink};
