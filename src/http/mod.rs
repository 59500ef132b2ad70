//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum fallback, body limit, JSON parsing)
//!     → request.rs (method, raw path, query pairs, headers, body)
//!     → dispatcher.rs (route resolution, middleware, validation, handler)
//!     → response.rs (status, headers, JSON/text body)
//!     → Send to client
//! ```
//!
//! The local client enters at `dispatcher.rs` with a synthesized request.

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use request::{Request, X_REQUEST_ID};
pub use response::{Body, Response};
pub use server::HttpServer;
