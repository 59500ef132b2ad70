//! Client mirror of a route tree.
//!
//! # Data Flow
//! ```text
//! Client::wire(base) / Client::local(dispatcher)
//!     → .at("users").at("$id")          ClientPath (immutable, segments only)
//!     → .get(CallOptions)               terminal action
//!     → path.rs prepare                 substitute $name, encode query,
//!                                       resolve headers, drop body if no-body method
//!     → Transport::send                 wire.rs (reqwest) | local.rs (dispatcher)
//!     → RawReply { status, text }
//!     → path.rs finish                  non-2xx → ClientError::Status, else JSON value
//! ```
//!
//! Both transports share `prepare` and `finish`; only `send` differs. For
//! any tree and valid input the two flavours return equal values.

pub mod config;
pub mod local;
pub mod options;
pub mod path;
pub mod wire;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::http::Dispatcher;

pub use config::ClientConfig;
pub use local::LocalTransport;
pub use options::CallOptions;
pub use path::{ClientPath, PreparedCall};
pub use wire::WireTransport;

#[derive(Debug, Error)]
pub enum ClientError {
    /// A `$name` segment had no value in `CallOptions::path`.
    #[error("Missing path parameter: {0}")]
    MissingPathParam(String),

    /// A `$name` value of `.` or `..`, which URL normalization would
    /// collapse into a different path.
    #[error("Invalid path parameter: {0}")]
    InvalidPathParam(String),

    /// Non-2xx answer. `message` is the body text, or the canonical reason
    /// when the body is empty.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Status and body text of an answered call, as both transports see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: StatusCode,
    pub text: String,
}

/// The only step that differs between the wire and local clients.
pub trait Transport: Send + Sync + 'static {
    fn send<'a>(&'a self, call: PreparedCall) -> BoxFuture<'a, Result<RawReply, ClientError>>;

    /// `"wire"` or `"local"`, for logs.
    fn kind(&self) -> &'static str;
}

/// Entry point of the mirror: a root [`ClientPath`] bound to one transport
/// and one configuration snapshot.
#[derive(Clone)]
pub struct Client {
    root: ClientPath,
}

impl Client {
    /// Network client against `base_url` (`http://host:port[/prefix]`).
    pub fn wire(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self::with_transport(Arc::new(WireTransport::new(base_url)?)))
    }

    /// Wire client with base URL, timeout and static headers from config.
    pub fn from_config(settings: &crate::config::ClientConfig) -> Result<Self, ClientError> {
        let client = Self::wire(&settings.base_url)?;
        let config = ClientConfig::from_settings(settings);
        Ok(client.reconfigure(|_| config))
    }

    /// In-process client. Runs validation and the handler, not middleware.
    pub fn local(dispatcher: Dispatcher) -> Self {
        Self::with_transport(Arc::new(LocalTransport::new(dispatcher)))
    }

    /// In-process client that also runs the matched middleware chain.
    pub fn local_with_middleware(dispatcher: Dispatcher) -> Self {
        Self::with_transport(Arc::new(LocalTransport::new(dispatcher).through_middleware()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            root: ClientPath::root(transport, Arc::new(ClientConfig::default())),
        }
    }

    pub fn at(&self, segment: &str) -> ClientPath {
        self.root.at(segment)
    }

    pub fn root(&self) -> &ClientPath {
        &self.root
    }

    pub fn config(&self) -> &ClientConfig {
        self.root.config()
    }

    /// New client with a new configuration snapshot. Paths already derived
    /// from `self` keep the old snapshot.
    pub fn reconfigure<F>(&self, update: F) -> Self
    where
        F: FnOnce(ClientConfig) -> ClientConfig,
    {
        let next = update(self.config().clone());
        Self {
            root: self.root.with_config(Arc::new(next)),
        }
    }
}
