//! Configuration for the request logger
//!
//! A [`Config`] holds the user-supplied options. It is resolved exactly once,
//! when a [`RequestLogger`](crate::engine::RequestLogger) is built, into an
//! immutable [`ResolvedConfig`]: unset values take their defaults, the time
//! zone is looked up, the tag list is compiled and the latency flag derived.
//!
//! # Example
//!
//! ```rust
//! use reqlog::config::{Config, MIN_TIME_INTERVAL};
//! use std::time::Duration;
//!
//! let resolved = Config {
//!     format: vec!["status".to_string(), "latency".to_string()],
//!     time_interval: Duration::from_millis(10),
//!     ..Config::default()
//! }
//! .resolve();
//!
//! assert!(resolved.enable_latency);
//! assert!(!resolved.enable_time);
//! assert_eq!(resolved.time_interval, MIN_TIME_INTERVAL);
//! ```

pub mod error;
pub mod logging;
pub mod options;
pub mod time;

pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use options::LoggerOptions;
pub use time::TimeZone;

use crate::engine::tags::{self, Tag};
use crate::sink::{self, LogSink};
use axum::http::request::Parts;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timestamp layout (RFC3339, strftime syntax).
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Time zone name that selects the process's local zone.
pub const LOCAL_TIME_ZONE: &str = "Local";

/// Default and lower bound for the timestamp refresh interval.
pub const MIN_TIME_INTERVAL: Duration = Duration::from_millis(500);

/// Default cap on captured request/response body bytes.
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Predicate deciding whether a request bypasses logging entirely.
pub type SkipFn = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

/// Tags emitted when no format is configured: `time status latency method path`.
pub fn default_format() -> Vec<String> {
    [tags::TIME, tags::STATUS, tags::LATENCY, tags::METHOD, tags::PATH]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// User-facing request logger options.
///
/// Zero values (empty strings, empty format, a zero interval) are replaced by
/// their defaults during [`Config::resolve`].
#[derive(Clone)]
pub struct Config {
    /// Skip logging when this returns true. The request is still served.
    pub skip: Option<SkipFn>,
    /// Ordered tag list; order is the field emission order.
    pub format: Vec<String>,
    /// strftime layout for the `time` tag.
    pub time_format: String,
    /// `"Local"`, `"UTC"`, a fixed offset such as `"+02:00"` or an IANA
    /// name such as `"Asia/Tokyo"`.
    pub time_zone: String,
    /// How often the cached timestamp is refreshed (floor: 500ms).
    pub time_interval: Duration,
    /// Emit latency as a human readable string instead of milliseconds.
    pub pretty_latency: bool,
    /// Most bytes of a body captured for `body`, `resBody` and `form:*`.
    /// Longer bodies are logged truncated and still forwarded whole.
    pub body_limit: usize,
    /// Destination for events; `None` uses [`sink::default_sink`].
    pub output: Option<Arc<dyn LogSink>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skip: None,
            format: default_format(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            time_zone: LOCAL_TIME_ZONE.to_string(),
            time_interval: MIN_TIME_INTERVAL,
            pretty_latency: false,
            body_limit: DEFAULT_BODY_LIMIT,
            output: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("skip", &self.skip.is_some())
            .field("format", &self.format)
            .field("time_format", &self.time_format)
            .field("time_zone", &self.time_zone)
            .field("time_interval", &self.time_interval)
            .field("pretty_latency", &self.pretty_latency)
            .field("body_limit", &self.body_limit)
            .field("output", &self.output.is_some())
            .finish()
    }
}

impl Config {
    /// Set the skip predicate.
    pub fn with_skip<F>(mut self, skip: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(skip));
        self
    }

    /// Replace the tag list.
    pub fn with_format<I, S>(mut self, format: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.format = format.into_iter().map(Into::into).collect();
        self
    }

    /// Send events to `sink` instead of the process-wide default.
    pub fn with_output(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.output = Some(sink);
        self
    }

    /// Emit latency as text (`"1.2ms"`).
    pub fn with_pretty_latency(mut self, pretty: bool) -> Self {
        self.pretty_latency = pretty;
        self
    }

    /// Cap the bytes captured from each body.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Set the time zone name.
    pub fn with_time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = zone.into();
        self
    }

    /// Fill in defaults and derive the internal flags.
    ///
    /// Never fails: an unknown time zone falls back to local time and an
    /// invalid time format falls back to [`DEFAULT_TIME_FORMAT`].
    pub fn resolve(self) -> ResolvedConfig {
        let format = if self.format.is_empty() {
            default_format()
        } else {
            self.format
        };

        let time_format = if self.time_format.is_empty() {
            DEFAULT_TIME_FORMAT.to_string()
        } else if !time::is_valid_time_format(&self.time_format) {
            tracing::debug!(
                time_format = %self.time_format,
                "invalid time format, using default"
            );
            DEFAULT_TIME_FORMAT.to_string()
        } else {
            self.time_format
        };

        let zone_name = if self.time_zone.is_empty() {
            LOCAL_TIME_ZONE
        } else {
            self.time_zone.as_str()
        };
        let time_zone = TimeZone::resolve(zone_name);

        let time_interval = self.time_interval.max(MIN_TIME_INTERVAL);

        let body_limit = if self.body_limit == 0 {
            DEFAULT_BODY_LIMIT
        } else {
            self.body_limit
        };

        let tags = Tag::compile(&format);
        let enable_latency = tags.iter().any(|t| matches!(t, Tag::Latency));
        let enable_time = tags.iter().any(|t| matches!(t, Tag::Time));

        ResolvedConfig {
            skip: self.skip,
            format,
            tags,
            time_format,
            time_zone,
            time_interval,
            pretty_latency: self.pretty_latency,
            body_limit,
            sink: self.output.unwrap_or_else(sink::default_sink),
            enable_latency,
            enable_time,
        }
    }
}

/// Resolve zero or one user configuration.
pub fn resolve(config: Option<Config>) -> ResolvedConfig {
    config.unwrap_or_default().resolve()
}

/// Fully populated configuration, immutable for the life of a logger.
#[derive(Clone)]
pub struct ResolvedConfig {
    pub skip: Option<SkipFn>,
    /// The tag list as configured (after defaulting).
    pub format: Vec<String>,
    /// The compiled tag list; unknown tags are already dropped.
    pub tags: Vec<Tag>,
    pub time_format: String,
    pub time_zone: TimeZone,
    pub time_interval: Duration,
    pub pretty_latency: bool,
    pub body_limit: usize,
    pub sink: Arc<dyn LogSink>,
    /// Whether `latency` is among the tags; gates the per-request clock reads.
    pub enable_latency: bool,
    /// Whether `time` is among the tags; gates the refresh task.
    pub enable_time: bool,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("skip", &self.skip.is_some())
            .field("format", &self.format)
            .field("time_format", &self.time_format)
            .field("time_zone", &self.time_zone)
            .field("time_interval", &self.time_interval)
            .field("pretty_latency", &self.pretty_latency)
            .field("body_limit", &self.body_limit)
            .field("enable_latency", &self.enable_latency)
            .field("enable_time", &self.enable_time)
            .finish_non_exhaustive()
    }
}
