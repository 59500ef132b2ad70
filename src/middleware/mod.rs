//! Middleware chain and stock middleware.
//!
//! # Data Flow
//! ```text
//! Dispatcher (matched route)
//!     → chain.rs: root middleware → ... → leaf-node middleware
//!     → terminal step (validation + handler)
//! ```
//!
//! Stock middleware lives here (`logger`, `error_handler`, `request_id`),
//! in `security` (`rate_limit`, `auth`) and in `resilience` (`timeouts`).

pub mod chain;
pub mod error_handler;
pub mod logger;
pub mod request_id;

pub use chain::{from_fn, run_chain, terminal_fn, FromFn, Middleware, Next, Terminal};
pub use error_handler::ErrorHandler;
pub use logger::{LogRecord, Logger};
pub use request_id::RequestId;
