//! Declarative route tree.
//!
//! # Data Flow
//! ```text
//! Router tree (built once at startup)
//!     → Router::into_dispatcher (freeze)
//!
//! Per request:
//!     method + raw path
//!     → matcher.rs (decode components, walk children, pick method leaf)
//!     → RouteMatch { leaf, params, middleware, pattern }
//! ```
//!
//! # Design Decisions
//! - Tree is immutable once handed to a dispatcher
//! - Static children take precedence over a dynamic sibling
//! - No backtracking: a path that matches a static child never retries the
//!   dynamic one

pub mod matcher;
pub mod method;
pub mod route;
pub mod router;

pub use matcher::{resolve, RouteMatch};
pub use method::Method;
pub use route::{Handler, Reply, Route};
pub use router::{dynamic_name, Entry, Leaf, Router, DYNAMIC_MARKER};
