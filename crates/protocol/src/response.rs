//! Inbound response parsing.
//!
//! The relay's response is not strongly typed: it may be JSON with any
//! subset of the recognised fields, or plain text. Field lookups follow
//! JavaScript truthiness so that `null`, `false`, `0` and `""` count as
//! absent.

use serde_json::{Map, Value};

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsePayload(Value);

impl ResponsePayload {
    /// Parses a response body.
    ///
    /// An empty body becomes `{}`. Text that is not JSON is wrapped as
    /// `{"raw": text}` rather than treated as an error.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self(Value::Object(Map::new()));
        }
        match serde_json::from_str(text) {
            Ok(value) => Self(value),
            Err(_) => {
                let mut map = Map::new();
                map.insert("raw".into(), Value::String(text.to_string()));
                Self(Value::Object(map))
            }
        }
    }

    pub fn filename(&self) -> Option<String> {
        self.field("filename")
    }

    /// `fileId`, falling back to `id`.
    pub fn file_id(&self) -> Option<String> {
        self.field("fileId").or_else(|| self.field("id"))
    }

    /// `fileUrl`, falling back to `url`.
    pub fn file_url(&self) -> Option<String> {
        self.field("fileUrl").or_else(|| self.field("url"))
    }

    /// Logical error reported by the relay, if any.
    pub fn error(&self) -> Option<String> {
        self.field("error")
    }

    pub fn message(&self) -> Option<String> {
        self.field("message")
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns a field as text if it is present and truthy.
    fn field(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::Null | Value::Bool(false) => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            other => Some(other.to_string()),
        }
    }
}

impl From<Value> for ResponsePayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
