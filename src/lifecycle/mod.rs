//! Lifecycle management.
//!
//! ```text
//! signals.rs: ctrl-c / SIGTERM → Shutdown::trigger
//! shutdown.rs: broadcast → HttpServer graceful drain
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::{shutdown_on_signal, wait_for_signal};
