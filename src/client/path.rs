//! Path accumulation and the steps shared by every transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::{CallOptions, ClientConfig, ClientError, RawReply, Transport};
use crate::routing::{dynamic_name, Method};

/// A position in the mirrored tree. Navigation returns a new path; nothing
/// is resolved until a method action runs.
#[derive(Clone)]
pub struct ClientPath {
    segments: Vec<String>,
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
}

/// Fully resolved call, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub method: Method,
    /// Percent-encoded, always starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub timeout: Option<Duration>,
}

impl ClientPath {
    pub(crate) fn root(transport: Arc<dyn Transport>, config: Arc<ClientConfig>) -> Self {
        Self {
            segments: Vec::new(),
            transport,
            config,
        }
    }

    pub(crate) fn with_config(&self, config: Arc<ClientConfig>) -> Self {
        Self {
            segments: self.segments.clone(),
            transport: Arc::clone(&self.transport),
            config,
        }
    }

    /// Descend by one segment, or several separated by `/`
    /// (`at("users/$id")` equals `at("users").at("$id")`).
    pub fn at(&self, segment: &str) -> ClientPath {
        let mut next = self.clone();
        next.segments.extend(
            segment
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
        next
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Implicit `get`.
    pub async fn call(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Get, opts).await
    }

    pub async fn get(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Get, opts).await
    }

    pub async fn post(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Post, opts).await
    }

    pub async fn put(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Put, opts).await
    }

    pub async fn patch(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Patch, opts).await
    }

    pub async fn delete(&self, opts: CallOptions) -> Result<Value, ClientError> {
        self.send(Method::Delete, opts).await
    }

    pub async fn send(&self, method: Method, opts: CallOptions) -> Result<Value, ClientError> {
        let call = self.prepare(method, opts)?;
        tracing::debug!(
            transport = self.transport.kind(),
            method = %call.method,
            path = %call.path,
            "Client call"
        );
        let reply = self.transport.send(call).await?;
        finish(reply)
    }

    /// Like [`send`](Self::send), deserializing the result into `T`.
    pub async fn send_as<T: DeserializeOwned>(
        &self,
        method: Method,
        opts: CallOptions,
    ) -> Result<T, ClientError> {
        let value = self.send(method, opts).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Resolve segments, query, headers and body without sending anything.
    pub fn prepare(&self, method: Method, opts: CallOptions) -> Result<PreparedCall, ClientError> {
        let path = build_path(&self.segments, &opts)?;

        let mut headers = self.config.resolve_headers();
        for (name, value) in opts.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        Ok(PreparedCall {
            method,
            path,
            query: encode_query(&opts.query),
            headers,
            body: if method.has_body() { opts.body } else { None },
            timeout: self.config.timeout,
        })
    }
}

impl fmt::Debug for ClientPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientPath")
            .field("segments", &self.segments)
            .field("transport", &self.transport.kind())
            .finish()
    }
}

fn build_path(segments: &[String], opts: &CallOptions) -> Result<String, ClientError> {
    if segments.is_empty() {
        return Ok("/".to_string());
    }
    let mut path = String::new();
    for segment in segments {
        let value = match dynamic_name(segment) {
            Some(name) => opts
                .path
                .get(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ClientError::MissingPathParam(name.to_string()))
                .and_then(|value| match value.as_str() {
                    "." | ".." => Err(ClientError::InvalidPathParam(name.to_string())),
                    _ => Ok(value),
                })?,
            None => segment,
        };
        path.push('/');
        path.push_str(&urlencoding::encode(value));
    }
    Ok(path)
}

/// Query values as wire string pairs. Arrays repeat the key, `null` is
/// dropped, strings go as-is and everything else as JSON text.
pub fn encode_query(query: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in query {
        match value {
            Value::Array(items) => pairs.extend(
                items
                    .iter()
                    .filter_map(scalar_text)
                    .map(|text| (key.clone(), text)),
            ),
            other => {
                if let Some(text) = scalar_text(other) {
                    pairs.push((key.clone(), text));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Shared tail of every call.
pub(crate) fn finish(reply: RawReply) -> Result<Value, ClientError> {
    if !reply.status.is_success() {
        let message = if reply.text.is_empty() {
            reply.status.canonical_reason().unwrap_or_default().to_string()
        } else {
            reply.text
        };
        return Err(ClientError::Status {
            status: reply.status,
            message,
        });
    }
    if reply.text.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&reply.text).unwrap_or(Value::String(reply.text)))
}
