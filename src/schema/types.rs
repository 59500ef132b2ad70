//! Schema definition and compiled field types.

use serde_json::Value;
use thiserror::Error;

/// Build-time schema errors. These are programmer mistakes and are
/// reported when the schema is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown type `{tag}` for field `{field}`")]
    UnknownType { field: String, tag: String },

    #[error("invalid schema definition at `{field}`: expected a type string or an object")]
    InvalidDefinition { field: String },
}

/// Base type of a primitive field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// A compiled field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Primitive {
        kind: PrimitiveKind,
        optional: bool,
        array: bool,
    },
    /// Nested object. Nested fields are always required at their own level.
    Nested(Vec<(String, FieldType)>),
}

impl FieldType {
    pub fn is_optional(&self) -> bool {
        matches!(self, FieldType::Primitive { optional: true, .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FieldType::Primitive { array: true, .. })
    }
}

/// One entry of a [`SchemaDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDef {
    /// A type tag such as `string`, `number?` or `boolean[]`.
    Tag(String),
    Nested(SchemaDefinition),
}

/// Uncompiled schema: an ordered mapping from field name to type tag or
/// nested definition.
///
/// ```ignore
/// let def = SchemaDefinition::new()
///     .field("name", "string")
///     .field("age", "number?")
///     .nested("address", SchemaDefinition::new().field("city", "string"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDefinition {
    fields: Vec<(String, FieldDef)>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a primitive field. Redeclaring a name replaces it.
    pub fn field(self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.insert(name.into(), FieldDef::Tag(tag.into()))
    }

    /// Declare a nested object field.
    pub fn nested(self, name: impl Into<String>, definition: SchemaDefinition) -> Self {
        self.insert(name.into(), FieldDef::Nested(definition))
    }

    /// Build a definition from a JSON object whose values are type strings
    /// or nested objects, e.g. `{"name": "string", "tags": "string[]"}`.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Self::from_value_at(value, "")
    }

    fn from_value_at(value: &Value, prefix: &str) -> Result<Self, SchemaError> {
        let object = value.as_object().ok_or_else(|| SchemaError::InvalidDefinition {
            field: prefix.to_string(),
        })?;

        let mut definition = Self::new();
        for (name, entry) in object {
            let path = join_path(prefix, name);
            definition = match entry {
                Value::String(tag) => definition.field(name.clone(), tag.clone()),
                Value::Object(_) => {
                    definition.nested(name.clone(), Self::from_value_at(entry, &path)?)
                }
                _ => return Err(SchemaError::InvalidDefinition { field: path }),
            };
        }
        Ok(definition)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDef)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), def))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn insert(mut self, name: String, def: FieldDef) -> Self {
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = def,
            None => self.fields.push((name, def)),
        }
        self
    }
}

/// Join a dotted field path.
pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redeclaring_a_field_replaces_it() {
        let def = SchemaDefinition::new()
            .field("name", "string")
            .field("age", "number")
            .field("name", "string?");

        let fields: Vec<_> = def.fields().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("name", &FieldDef::Tag("string?".into())));
    }

    #[test]
    fn from_value_builds_nested_definitions() {
        let def = SchemaDefinition::from_value(&json!({
            "name": "string",
            "address": { "city": "string", "zip": "string?" }
        }))
        .unwrap();

        let address = def
            .fields()
            .find(|(name, _)| *name == "address")
            .map(|(_, def)| def.clone())
            .unwrap();
        match address {
            FieldDef::Nested(inner) => assert_eq!(inner.len(), 2),
            other => panic!("expected nested definition, got {other:?}"),
        }
    }

    #[test]
    fn from_value_rejects_non_string_leaves() {
        let err = SchemaDefinition::from_value(&json!({ "meta": { "count": 3 } })).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidDefinition {
                field: "meta.count".into()
            }
        );
    }
}
