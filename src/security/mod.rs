//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request:
//!     → rate_limit.rs (fixed window per client key)
//!     → auth.rs (bearer token → Principal in context extensions)
//!     → handler
//!
//! Outbound (client / CLI):
//!     credentials.rs (HTTP Basic encode/decode)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any check failure
//! - Tokens and credentials are opaque strings; verification is pluggable

pub mod auth;
pub mod credentials;
pub mod rate_limit;

pub use auth::{BearerAuth, Principal, StaticTokens, TokenVerifier};
pub use credentials::{decode_basic, encode_basic, Credentials, CredentialsError};
pub use rate_limit::{client_key, RateLimit};
