//! Line-delimited JSON sink

use super::event::{LogEvent, LEVEL_KEY};
use super::LogSink;
use crate::engine::Severity;
use std::io::Write;
use std::sync::Mutex;

/// Writes each event as one JSON line to a writer.
///
/// Writes are serialized through a mutex so concurrent requests never
/// interleave within a line.
pub struct JsonSink {
    writer: Mutex<Box<dyn Write + Send>>,
    level_key: String,
    min_severity: Severity,
}

impl JsonSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            level_key: LEVEL_KEY.to_string(),
            min_severity: Severity::Debug,
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Render the severity under `key` (e.g. `"severity"` for GCP Cloud Logging).
    pub fn with_level_key(mut self, key: impl Into<String>) -> Self {
        self.level_key = key.into();
        self
    }

    /// Drop events below `severity`.
    pub fn with_min_severity(mut self, severity: Severity) -> Self {
        self.min_severity = severity;
        self
    }
}

impl std::fmt::Debug for JsonSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonSink")
            .field("level_key", &self.level_key)
            .field("min_severity", &self.min_severity)
            .finish_non_exhaustive()
    }
}

impl LogSink for JsonSink {
    fn emit(&self, event: LogEvent) {
        if event.severity() < self.min_severity {
            return;
        }

        let mut line = event.to_json_line(&self.level_key);
        line.push('\n');

        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.write_all(line.as_bytes()).and_then(|_| writer.flush()) {
            tracing::warn!(error = %e, "failed to write request log line");
        }
    }
}
