//! Validation and coercion of loosely-typed input.
//!
//! # Responsibilities
//! - Enforce requiredness, object and array shapes
//! - Coerce wire strings into the declared primitive kind
//! - Report every failing field under a dotted/bracketed path
//!
//! # Design Decisions
//! - Missing, `null` and `""` are all "empty"; for scalar number fields a
//!   whitespace-only string is empty too
//! - Numbers are normalized through `f64`; integral values come back as integers
//! - Array elements short-circuit on the first failure (`tags[2]`)

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::schema::types::{join_path, FieldType, PrimitiveKind, SchemaDefinition, SchemaError};

pub const REQUIRED: &str = "Required";
pub const EXPECTED_OBJECT: &str = "Expected object";
pub const EXPECTED_ARRAY: &str = "Expected array";
pub const EXPECTED_NUMBER: &str = "Expected number";
pub const EXPECTED_BOOLEAN: &str = "Expected boolean";

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Outcome of [`CompiledSchema::validate`].
pub type ValidationResult = Result<Map<String, Value>, FieldErrors>;

/// Field path → messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (path, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", path, messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// A compiled, immutable schema. Cloning shares the field table.
#[derive(Debug, Clone)]
pub struct CompiledSchema {
    fields: Arc<[(String, FieldType)]>,
}

impl CompiledSchema {
    pub(crate) fn from_fields(fields: Arc<[(String, FieldType)]>) -> Self {
        Self { fields }
    }

    /// Compile a definition. Shorthand for [`crate::schema::compile`].
    pub fn compile(definition: &SchemaDefinition) -> Result<Self, SchemaError> {
        crate::schema::parser::compile(definition)
    }

    /// Compile straight from a JSON definition object.
    pub fn from_json(definition: &Value) -> Result<Self, SchemaError> {
        Self::compile(&SchemaDefinition::from_value(definition)?)
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, ty)| ty)
    }

    /// Validate a raw object. `null` is treated as an empty object.
    pub fn validate(&self, input: &Value) -> ValidationResult {
        let empty = Map::new();
        let object = match input {
            Value::Null => &empty,
            Value::Object(map) => map,
            _ => {
                let mut errors = FieldErrors::new();
                errors.add("", EXPECTED_OBJECT);
                return Err(errors);
            }
        };

        let mut errors = FieldErrors::new();
        let coerced = validate_object(&self.fields, object, "", &mut errors);
        if errors.is_empty() {
            Ok(coerced)
        } else {
            Err(errors)
        }
    }
}

fn validate_object(
    fields: &[(String, FieldType)],
    input: &Map<String, Value>,
    prefix: &str,
    errors: &mut FieldErrors,
) -> Map<String, Value> {
    let mut out = Map::new();

    'fields: for (name, field_type) in fields {
        let path = join_path(prefix, name);
        let value = match input.get(name).filter(|v| !is_missing(field_type, v)) {
            Some(value) => value,
            None => {
                if !field_type.is_optional() {
                    errors.add(path, REQUIRED);
                }
                continue;
            }
        };

        match field_type {
            FieldType::Nested(inner) => match value {
                Value::Object(map) => {
                    let nested = validate_object(inner, map, &path, errors);
                    out.insert(name.clone(), Value::Object(nested));
                }
                _ => errors.add(path, EXPECTED_OBJECT),
            },
            FieldType::Primitive {
                kind, array: true, ..
            } => {
                let items = match value {
                    Value::Array(items) => items,
                    _ => {
                        errors.add(path, EXPECTED_ARRAY);
                        continue;
                    }
                };
                let mut coerced = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match coerce(*kind, item) {
                        Ok(v) => coerced.push(v),
                        Err(message) => {
                            errors.add(format!("{path}[{i}]"), message);
                            continue 'fields;
                        }
                    }
                }
                out.insert(name.clone(), Value::Array(coerced));
            }
            FieldType::Primitive { kind, .. } => match coerce(*kind, value) {
                Ok(v) => {
                    out.insert(name.clone(), v);
                }
                Err(message) => errors.add(path, message),
            },
        }
    }

    out
}

fn is_missing(field_type: &FieldType, value: &Value) -> bool {
    match (field_type, value) {
        (
            FieldType::Primitive {
                kind: PrimitiveKind::Number,
                array: false,
                ..
            },
            Value::String(s),
        ) => s.trim().is_empty(),
        _ => is_empty(value),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn coerce(kind: PrimitiveKind, value: &Value) -> Result<Value, &'static str> {
    if value.is_null() {
        return Err(REQUIRED);
    }
    match kind {
        PrimitiveKind::String => Ok(Value::String(stringify(value))),
        PrimitiveKind::Number => coerce_number(value),
        PrimitiveKind::Boolean => coerce_boolean(value),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn coerce_number(value: &Value) -> Result<Value, &'static str> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|f| f.is_finite())
        .and_then(number_value)
        .ok_or(EXPECTED_NUMBER)
}

/// Integral values within the safe range come back as integers so `"42"`
/// and `42` coerce to the same JSON value.
fn number_value(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        Some(Value::from(f as i64))
    } else {
        Number::from_f64(f).map(Value::Number)
    }
}

fn coerce_boolean(value: &Value) -> Result<Value, &'static str> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) if s == "true" || s == "1" => Ok(Value::Bool(true)),
        Value::String(s) if s == "false" || s == "0" => Ok(Value::Bool(false)),
        _ => Err(EXPECTED_BOOLEAN),
    }
}
