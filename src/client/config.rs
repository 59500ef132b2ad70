//! Immutable client configuration snapshot.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Produces headers at call time, e.g. a freshly minted token.
pub type HeaderResolver = Arc<dyn Fn() -> HeaderMap + Send + Sync>;

#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Sent with every call.
    pub headers: HeaderMap,
    /// Evaluated once per call; its headers override `headers`.
    pub resolver: Option<HeaderResolver>,
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Snapshot from the `[client]` config section. Headers that are not
    /// valid HTTP are skipped with a warning.
    pub fn from_settings(settings: &crate::config::ClientConfig) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Skipping invalid client header"),
            }
        }
        Self {
            headers,
            resolver: None,
            timeout: settings.timeout(),
        }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn() -> HeaderMap + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Static headers overlaid with the resolver's output.
    pub fn resolve_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        if let Some(resolver) = &self.resolver {
            for (name, value) in resolver().iter() {
                headers.insert(name.clone(), value.clone());
            }
        }
        headers
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("headers", &self.headers)
            .field("resolver", &self.resolver.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
