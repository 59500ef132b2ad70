//! Per-request context.
//!
//! A `Context` is created by the dispatcher for exactly one request and is
//! moved through the middleware chain into the handler. It is never shared
//! between requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::Extensions;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HandlerError;
use crate::http::Request;
use crate::routing::Method;

/// Environment bindings shared read-only by every request.
pub type Env = BTreeMap<String, String>;

/// Validated parameters, filled in as validation proceeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    /// Dynamic segment bindings, marker stripped.
    pub path: BTreeMap<String, String>,
    pub query: Option<Map<String, Value>>,
    pub body: Option<Map<String, Value>>,
}

#[derive(Debug)]
pub struct Context {
    request: Request,
    params: Params,
    env: Arc<Env>,
    request_id: Option<String>,
    extensions: Extensions,
}

impl Context {
    pub fn new(request: Request, env: Arc<Env>) -> Self {
        Self {
            request,
            params: Params::default(),
            env,
            request_id: None,
            extensions: Extensions::new(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn method(&self) -> Method {
        self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.params.path.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&Value> {
        self.params.query.as_ref().and_then(|q| q.get(name))
    }

    pub fn body_value(&self, name: &str) -> Option<&Value> {
        self.params.body.as_ref().and_then(|b| b.get(name))
    }

    /// Deserialize the validated query into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let query = self.params.query.clone().unwrap_or_default();
        Ok(serde_json::from_value(Value::Object(query))?)
    }

    /// Deserialize the validated body into `T`. Falls back to the raw body
    /// when the route declares no body schema.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        let body = match &self.params.body {
            Some(body) => Value::Object(body.clone()),
            None => self.request.body.clone().unwrap_or(Value::Null),
        };
        Ok(serde_json::from_value(body)?)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn set_request_id(&mut self, id: impl Into<String>) {
        self.request_id = Some(id.into());
    }

    /// Typed slots for data passed from middleware to handlers.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}
