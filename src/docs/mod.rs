//! OpenAPI-shaped documentation of a route tree.
//!
//! Read-only walk: one operation per reachable method leaf. Dynamic
//! segments render as `{name}` and become required path parameters.

use serde_json::{json, Map, Value};

use crate::routing::{dynamic_name, Entry, Method, Route, Router};
use crate::schema::{CompiledSchema, FieldType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsInfo {
    pub title: String,
    pub version: String,
}

impl DocsInfo {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
        }
    }
}

impl Default for DocsInfo {
    fn default() -> Self {
        Self::new("API", "1.0.0")
    }
}

pub fn generate(router: &Router, info: &DocsInfo) -> Value {
    let mut paths = Map::new();
    walk(router, &mut Vec::new(), &mut paths);
    json!({
        "openapi": "3.0.0",
        "info": { "title": info.title, "version": info.version },
        "paths": paths,
    })
}

fn walk(router: &Router, segments: &mut Vec<String>, paths: &mut Map<String, Value>) {
    for (name, entry) in router.entries() {
        match entry {
            Entry::Router(child) => {
                segments.push(name.to_string());
                walk(child, segments, paths);
                segments.pop();
            }
            Entry::Route(route) => add_operation(paths, segments, name, Some(route)),
            Entry::Handler(_) => add_operation(paths, segments, name, None),
        }
    }
}

fn add_operation(
    paths: &mut Map<String, Value>,
    segments: &[String],
    token: &str,
    route: Option<&Route>,
) {
    let Some(method) = Method::from_token(token) else {
        return;
    };
    let key = path_key(segments);
    let item = paths
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(item) = item else {
        return;
    };
    // First registration wins, as in dispatch.
    if item.contains_key(method.as_str()) {
        return;
    }
    item.insert(method.as_str().to_string(), operation(segments, method, route));
}

fn path_key(segments: &[String]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    segments
        .iter()
        .map(|segment| match dynamic_name(segment) {
            Some(name) => format!("/{{{name}}}"),
            None => format!("/{segment}"),
        })
        .collect()
}

fn operation(segments: &[String], method: Method, route: Option<&Route>) -> Value {
    let mut op = Map::new();
    if let Some(description) = route.and_then(Route::description) {
        op.insert("description".into(), json!(description));
    }

    let mut parameters: Vec<Value> = segments
        .iter()
        .filter_map(|segment| dynamic_name(segment))
        .map(|name| {
            json!({
                "name": name,
                "in": "path",
                "required": true,
                "schema": { "type": "string" },
            })
        })
        .collect();
    if let Some(query) = route.and_then(Route::query_schema) {
        parameters.extend(query.fields().iter().map(|(name, field)| {
            json!({
                "name": name,
                "in": "query",
                "required": !field.is_optional(),
                "schema": field_schema(field),
            })
        }));
    }
    if !parameters.is_empty() {
        op.insert("parameters".into(), Value::Array(parameters));
    }

    if method.has_body() {
        if let Some(body) = route.and_then(Route::body_schema) {
            op.insert(
                "requestBody".into(),
                json!({
                    "required": true,
                    "content": { "application/json": { "schema": object_schema(body.fields()) } },
                }),
            );
        }
    }

    let mut responses = Map::new();
    responses.insert("200".into(), json!({ "description": "Success" }));
    if route.is_some_and(|r| r.query_schema().is_some() || (method.has_body() && r.body_schema().is_some())) {
        responses.insert("400".into(), json!({ "description": "Validation failed" }));
    }
    op.insert("responses".into(), Value::Object(responses));

    Value::Object(op)
}

/// Object schema with per-field types and the non-optional field list.
pub fn object_schema(fields: &[(String, FieldType)]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for (name, field) in fields {
        properties.insert(name.clone(), field_schema(field));
        if !field.is_optional() {
            required.push(json!(name));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    Value::Object(schema)
}

fn field_schema(field: &FieldType) -> Value {
    match field {
        FieldType::Nested(fields) => object_schema(fields),
        FieldType::Primitive { kind, array, .. } => {
            let base = json!({ "type": kind.as_str() });
            if *array {
                json!({ "type": "array", "items": base })
            } else {
                base
            }
        }
    }
}

/// Convenience for schemas held outside a route.
pub fn schema_of(schema: &CompiledSchema) -> Value {
    object_schema(schema.fields())
}
