//! Per-request key/value store
//!
//! The middleware inserts a [`Locals`] handle into the request extensions
//! before calling downstream. Handlers write values into it; the `locals:<key>`
//! tag reads them back once the handler has returned.
//!
//! ```rust
//! use reqlog::engine::{Locals, LocalValue};
//!
//! let locals = Locals::new();
//! locals.set("user", "johndoe");
//! locals.set("attempts", 3);
//!
//! assert_eq!(locals.get("user").unwrap().render(), "johndoe");
//! assert_eq!(locals.get("attempts").unwrap().render(), "3");
//! assert!(locals.get("missing").is_none());
//! ```

use bytes::Bytes;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// A value stored in [`Locals`].
///
/// The variant decides how the value is emitted: text verbatim, bytes as
/// their raw content, anything else through its `Display` rendering.
#[derive(Clone)]
pub enum LocalValue {
    Text(String),
    Bytes(Bytes),
    Other(Arc<dyn fmt::Display + Send + Sync>),
}

impl LocalValue {
    /// Wrap any displayable value.
    pub fn other<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        LocalValue::Other(Arc::new(value))
    }

    /// The bytes this value is emitted as.
    pub fn render(&self) -> Bytes {
        match self {
            LocalValue::Text(text) => Bytes::copy_from_slice(text.as_bytes()),
            LocalValue::Bytes(bytes) => bytes.clone(),
            LocalValue::Other(value) => Bytes::from(value.to_string()),
        }
    }
}

impl fmt::Debug for LocalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            LocalValue::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            LocalValue::Other(value) => f.debug_tuple("Other").field(&value.to_string()).finish(),
        }
    }
}

impl From<String> for LocalValue {
    fn from(value: String) -> Self {
        LocalValue::Text(value)
    }
}

impl From<&str> for LocalValue {
    fn from(value: &str) -> Self {
        LocalValue::Text(value.to_string())
    }
}

impl From<Bytes> for LocalValue {
    fn from(value: Bytes) -> Self {
        LocalValue::Bytes(value)
    }
}

impl From<Vec<u8>> for LocalValue {
    fn from(value: Vec<u8>) -> Self {
        LocalValue::Bytes(Bytes::from(value))
    }
}

impl From<&[u8]> for LocalValue {
    fn from(value: &[u8]) -> Self {
        LocalValue::Bytes(Bytes::copy_from_slice(value))
    }
}

macro_rules! local_value_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for LocalValue {
                fn from(value: $ty) -> Self {
                    LocalValue::other(value)
                }
            }
        )*
    };
}

local_value_from_display!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// Shared handle to one request's key/value store.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Debug, Clone, Default)]
pub struct Locals {
    entries: Arc<DashMap<String, LocalValue>>,
}

impl Locals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one under `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<LocalValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<LocalValue> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<LocalValue> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
