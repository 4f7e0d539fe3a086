//! Structured log sinks
//!
//! The engine builds one [`LogEvent`] per request and hands it to a
//! [`LogSink`]. A sink is chosen per logger at construction time: either the
//! one given in [`Config::output`](crate::config::Config::output) or the
//! process-wide default returned by [`default_sink`].
//!
//! # Default sink
//!
//! The process-wide default starts out as [`TracingSink`].
//! [`set_default_sink`] replaces it; loggers constructed before the
//! replacement keep the sink they captured.

mod event;
mod json;
mod tracing_sink;

pub use event::{Field, FieldValue, LogEvent, ERROR_KEY, LEVEL_KEY, MESSAGE_KEY};
pub use json::JsonSink;
pub use tracing_sink::{TracingSink, ACCESS_TARGET};

use std::sync::{Arc, RwLock};

/// Destination for finished request events.
///
/// Implementations are shared across concurrently served requests and must
/// not interleave the output of two events.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: LogEvent);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn emit(&self, event: LogEvent) {
        (**self).emit(event)
    }
}

static DEFAULT_SINK: RwLock<Option<Arc<dyn LogSink>>> = RwLock::new(None);

/// The process-wide default sink.
pub fn default_sink() -> Arc<dyn LogSink> {
    let guard = match DEFAULT_SINK.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.clone().unwrap_or_else(|| Arc::new(TracingSink))
}

/// Replace the process-wide default sink, returning the previous override.
pub fn set_default_sink(sink: Arc<dyn LogSink>) -> Option<Arc<dyn LogSink>> {
    let mut guard = match DEFAULT_SINK.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.replace(sink)
}

/// Restore [`TracingSink`] as the process-wide default.
pub fn reset_default_sink() -> Option<Arc<dyn LogSink>> {
    let mut guard = match DEFAULT_SINK.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.take()
}
