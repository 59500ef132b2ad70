//! Type tag parsing and schema compilation.
//!
//! # Grammar
//! ```text
//! tag    := base suffix*
//! base   := "string" | "number" | "boolean"
//! suffix := "?"   (optional, at most once)
//!         | "[]"  (array, at most once)
//! ```
//! `number[]?` and `number?[]` both denote an optional array of numbers.

use std::sync::Arc;

use crate::schema::types::{join_path, FieldDef, FieldType, PrimitiveKind, SchemaDefinition, SchemaError};
use crate::schema::validator::CompiledSchema;

/// Parse a single type tag. Returns `None` for anything outside the grammar.
pub fn parse_tag(tag: &str) -> Option<FieldType> {
    let mut rest = tag;
    let mut optional = false;
    let mut array = false;

    loop {
        if let Some(stripped) = rest.strip_suffix('?') {
            if optional {
                return None;
            }
            optional = true;
            rest = stripped;
        } else if let Some(stripped) = rest.strip_suffix("[]") {
            if array {
                return None;
            }
            array = true;
            rest = stripped;
        } else {
            break;
        }
    }

    let kind = PrimitiveKind::from_tag(rest)?;
    Some(FieldType::Primitive {
        kind,
        optional,
        array,
    })
}

/// Compile a definition, walking nested definitions eagerly.
pub fn compile(definition: &SchemaDefinition) -> Result<CompiledSchema, SchemaError> {
    let fields = compile_fields(definition, "")?;
    Ok(CompiledSchema::from_fields(Arc::from(fields)))
}

fn compile_fields(
    definition: &SchemaDefinition,
    prefix: &str,
) -> Result<Vec<(String, FieldType)>, SchemaError> {
    definition
        .fields()
        .map(|(name, def)| {
            let path = join_path(prefix, name);
            let field_type = match def {
                FieldDef::Tag(tag) => parse_tag(tag).ok_or_else(|| SchemaError::UnknownType {
                    field: path.clone(),
                    tag: tag.clone(),
                })?,
                FieldDef::Nested(inner) => FieldType::Nested(compile_fields(inner, &path)?),
            };
            Ok((name.to_string(), field_type))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primitive(kind: PrimitiveKind, optional: bool, array: bool) -> FieldType {
        FieldType::Primitive {
            kind,
            optional,
            array,
        }
    }

    #[test]
    fn test_parse_tag_suffixes() {
        assert_eq!(parse_tag("string"), Some(primitive(PrimitiveKind::String, false, false)));
        assert_eq!(parse_tag("number?"), Some(primitive(PrimitiveKind::Number, true, false)));
        assert_eq!(parse_tag("boolean[]"), Some(primitive(PrimitiveKind::Boolean, false, true)));
        assert_eq!(parse_tag("number[]?"), Some(primitive(PrimitiveKind::Number, true, true)));
        assert_eq!(parse_tag("number?[]"), Some(primitive(PrimitiveKind::Number, true, true)));
    }

    #[test]
    fn test_parse_tag_rejects_unknown_forms() {
        assert_eq!(parse_tag("integer"), None);
        assert_eq!(parse_tag("string??"), None);
        assert_eq!(parse_tag("string[][]"), None);
        assert_eq!(parse_tag(" string"), None);
        assert_eq!(parse_tag(""), None);
    }

    #[test]
    fn test_compile_fails_fast_on_nested_unknown_tag() {
        let def = SchemaDefinition::new()
            .field("name", "string")
            .nested("profile", SchemaDefinition::new().field("age", "int"));

        let err = compile(&def).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownType {
                field: "profile.age".into(),
                tag: "int".into(),
            }
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let def = SchemaDefinition::new()
            .field("name", "string")
            .field("tags", "string[]?")
            .nested("meta", SchemaDefinition::new().field("active", "boolean"));

        let a = compile(&def).unwrap();
        let b = compile(&def).unwrap();
        assert_eq!(a.fields(), b.fields());
    }
}
