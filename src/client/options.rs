//! Per-call inputs.

use std::collections::BTreeMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Values for `$name` segments, keyed without the marker.
    pub path: BTreeMap<String, String>,
    pub query: Map<String, Value>,
    /// Sent only for post, put and patch.
    pub body: Option<Value>,
    /// Highest-precedence headers, applied after the configured ones.
    pub headers: HeaderMap,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.path.insert(name.into(), value.to_string());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}
