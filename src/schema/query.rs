//! Shaping of wire query pairs into a JSON object.

use serde_json::{Map, Value};

use crate::schema::validator::CompiledSchema;

/// Group query pairs by key.
///
/// Fields the schema declares as arrays always become arrays, even with a
/// single occurrence. Other fields take their last occurrence. Without a
/// schema (or for undeclared keys) a repeated key becomes an array and a
/// single one stays a string.
pub fn shape_query(pairs: &[(String, String)], schema: Option<&CompiledSchema>) -> Map<String, Value> {
    let mut grouped: Vec<(&str, Vec<&str>)> = Vec::new();
    for (key, value) in pairs {
        match grouped.iter_mut().find(|(k, _)| *k == key.as_str()) {
            Some((_, values)) => values.push(value.as_str()),
            None => grouped.push((key.as_str(), vec![value.as_str()])),
        }
    }

    let mut out = Map::new();
    for (key, values) in grouped {
        let declared = schema.and_then(|s| s.field(key));
        let shaped = match declared {
            Some(field) if field.is_array() => strings(&values),
            Some(_) => last(&values),
            None if values.len() > 1 => strings(&values),
            None => last(&values),
        };
        out.insert(key.to_string(), shaped);
    }
    out
}

impl CompiledSchema {
    /// [`shape_query`] against this schema.
    pub fn shape_query(&self, pairs: &[(String, String)]) -> Map<String, Value> {
        shape_query(pairs, Some(self))
    }
}

fn strings(values: &[&str]) -> Value {
    Value::Array(values.iter().map(|v| Value::String(v.to_string())).collect())
}

fn last(values: &[&str]) -> Value {
    values
        .last()
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn array_fields_always_shape_as_arrays() {
        let schema = CompiledSchema::from_json(&json!({ "tag": "string[]", "page": "number" })).unwrap();
        let shaped = shape_query(&pairs(&[("tag", "a"), ("page", "1"), ("page", "2")]), Some(&schema));
        assert_eq!(Value::Object(shaped), json!({ "tag": ["a"], "page": "2" }));
    }

    #[test]
    fn without_schema_repeats_become_arrays() {
        let shaped = shape_query(&pairs(&[("a", "1"), ("b", "x"), ("a", "2")]), None);
        assert_eq!(Value::Object(shaped), json!({ "a": ["1", "2"], "b": "x" }));
    }
}
