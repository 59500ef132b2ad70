//! Resilience subsystem.
//!
//! # Design Decisions
//! - Every request may carry a deadline; the timeout middleware enforces it
//! - Timed-out requests answer `504`, distinct from handler failures

pub mod timeouts;

pub use timeouts::Timeout;
