//! Schema engine.
//!
//! # Data Flow
//! ```text
//! SchemaDefinition (built in code or from JSON)
//!     → parser.rs (type tag → FieldType, eager, fails fast)
//!     → CompiledSchema (immutable, cheap to clone)
//!
//! Per request:
//!     raw query pairs → query.rs (shape into a JSON object)
//!     raw object → validator.rs (coerce + collect field errors)
//!     → Ok(coerced object) | Err(FieldErrors)
//! ```
//!
//! # Design Decisions
//! - Unknown type tags are rejected at compile time, never at first request
//! - The schema is an allow-list: undeclared input fields are dropped
//! - Field failures accumulate; only array elements short-circuit

pub mod parser;
pub mod query;
pub mod types;
pub mod validator;

pub use parser::compile;
pub use query::shape_query;
pub use types::{FieldDef, FieldType, PrimitiveKind, SchemaDefinition, SchemaError};
pub use validator::{CompiledSchema, FieldErrors, ValidationResult};
