//! Shared test utilities for reqlog integration tests.
//!
//! Provides a capturing sink, a shared writer for `JsonSink`, and request
//! helpers to reduce duplication across test files.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use reqlog::sink::{FieldValue, LogEvent, LogSink};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

// =============================================================================
// Sinks
// =============================================================================

/// Sink that keeps every event in memory.
#[derive(Clone, Default)]
pub struct CaptureSink {
    events: Arc<Mutex<Vec<LogEvent>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// The only captured event. Panics unless exactly one was emitted.
    pub fn single(&self) -> LogEvent {
        let events = self.events();
        assert_eq!(events.len(), 1, "expected exactly one event, got {:?}", events);
        events.into_iter().next().unwrap()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl LogSink for CaptureSink {
    fn emit(&self, event: LogEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// In-memory writer that can be inspected after handing a clone to a sink.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// =============================================================================
// Field Helpers
// =============================================================================

pub fn str_field(event: &LogEvent, key: &str) -> Option<String> {
    match event.get(key) {
        Some(FieldValue::Str(value)) => Some(value.clone()),
        _ => None,
    }
}

pub fn int_field(event: &LogEvent, key: &str) -> Option<i64> {
    match event.get(key) {
        Some(FieldValue::Int(value)) => Some(*value),
        _ => None,
    }
}

pub fn bytes_field(event: &LogEvent, key: &str) -> Option<Vec<u8>> {
    match event.get(key) {
        Some(FieldValue::Bytes(value)) => Some(value.to_vec()),
        _ => None,
    }
}

pub fn keys(event: &LogEvent) -> Vec<String> {
    event.fields().iter().map(|f| f.key.clone()).collect()
}

// =============================================================================
// Request Builders
// =============================================================================

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
