//! Sink that forwards request events into `tracing`

use super::{LogEvent, LogSink};
use crate::engine::Severity;

/// Target request events are recorded under.
pub const ACCESS_TARGET: &str = "reqlog::access";

/// Forwards each event to the installed `tracing` subscriber at the mapped
/// level, with the fields rendered as one JSON object under `fields`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        let fields = event.fields_json();
        let message = event.message();
        match event.severity() {
            Severity::Debug => tracing::debug!(target: ACCESS_TARGET, fields = %fields, "{}", message),
            Severity::Info => tracing::info!(target: ACCESS_TARGET, fields = %fields, "{}", message),
            Severity::Warn => tracing::warn!(target: ACCESS_TARGET, fields = %fields, "{}", message),
            Severity::Error => tracing::error!(target: ACCESS_TARGET, fields = %fields, "{}", message),
        }
    }
}
