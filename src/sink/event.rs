//! The structured event built for each request

use crate::engine::Severity;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;

/// Key used for [`LogEvent::err`].
pub const ERROR_KEY: &str = "error";
/// Key the message is rendered under.
pub const MESSAGE_KEY: &str = "message";
/// Default key the severity is rendered under.
pub const LEVEL_KEY: &str = "level";

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Dur(Duration),
    Bytes(Bytes),
    Error(String),
}

impl FieldValue {
    /// Render as a JSON value. Durations become fractional milliseconds,
    /// bytes become (lossy) UTF-8 text.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) | FieldValue::Error(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Dur(d) => Value::from(d.as_secs_f64() * 1000.0),
            FieldValue::Bytes(b) => Value::String(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

/// A severity, an ordered list of fields (duplicate keys allowed) and a
/// message.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    severity: Severity,
    fields: Vec<Field>,
    message: String,
}

impl LogEvent {
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            fields: Vec::new(),
            message: String::new(),
        }
    }

    fn push(&mut self, key: impl Into<String>, value: FieldValue) -> &mut Self {
        self.fields.push(Field {
            key: key.into(),
            value,
        });
        self
    }

    pub fn str(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.push(key, FieldValue::Str(value.into()))
    }

    pub fn int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.push(key, FieldValue::Int(value))
    }

    pub fn dur(&mut self, key: impl Into<String>, value: Duration) -> &mut Self {
        self.push(key, FieldValue::Dur(value))
    }

    pub fn bytes(&mut self, key: impl Into<String>, value: impl Into<Bytes>) -> &mut Self {
        self.push(key, FieldValue::Bytes(value.into()))
    }

    /// Attach an error message under `"error"`.
    pub fn err(&mut self, message: impl Into<String>) -> &mut Self {
        self.push(ERROR_KEY, FieldValue::Error(message.into()))
    }

    /// Set the terminal message. The event is complete after this.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Last value written under `key`.
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .rev()
            .find(|field| field.key == key)
            .map(|field| &field.value)
    }

    /// Every value written under `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FieldValue> + 'a {
        self.fields
            .iter()
            .filter(move |field| field.key == key)
            .map(|field| &field.value)
    }

    /// The fields as a JSON object, in order, duplicates included.
    pub fn fields_json(&self) -> String {
        let mut out = String::from("{");
        self.write_fields(&mut out);
        out.push('}');
        out
    }

    /// One JSON line: level first, then the fields, then the message.
    pub fn to_json_line(&self, level_key: &str) -> String {
        let mut out = String::from("{");
        write_pair(&mut out, level_key, &Value::from(self.severity.as_str()));
        if !self.fields.is_empty() {
            out.push(',');
            self.write_fields(&mut out);
        }
        out.push(',');
        write_pair(&mut out, MESSAGE_KEY, &Value::from(self.message.as_str()));
        out.push('}');
        out
    }

    fn write_fields(&self, out: &mut String) {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_pair(out, &field.key, &field.value.to_json());
        }
    }
}

fn write_pair(out: &mut String, key: &str, value: &Value) {
    out.push_str(&Value::from(key).to_string());
    out.push(':');
    out.push_str(&value.to_string());
}
