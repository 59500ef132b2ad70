//! Declarative route trees with schema validation, onion middleware and a
//! client mirror that runs over the network or in-process.

pub mod client;
pub mod config;
pub mod context;
pub mod docs;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod schema;
pub mod security;

pub use client::{CallOptions, Client, ClientError};
pub use config::schema::ServerConfig;
pub use context::Context;
pub use error::{HandlerError, HandlerResult};
pub use http::{Dispatcher, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::{Method, Reply, Route, Router};
pub use schema::{compile, CompiledSchema, SchemaDefinition};
