//! Method leaves: handlers, replies and routes.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::context::Context;
use crate::error::HandlerError;
use crate::http::Response;
use crate::schema::CompiledSchema;

/// What a handler returns: either a complete response, which passes through
/// untouched, or a JSON value that becomes a `200` response.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(Value),
    Response(Response),
}

impl Reply {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, HandlerError> {
        Ok(Reply::Json(serde_json::to_value(value)?))
    }

    pub fn into_response(self) -> Response {
        match self {
            Reply::Json(value) => Response::json(value),
            Reply::Response(response) => response,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Reply::Response(response)
    }
}

/// A request handler. Implemented for every
/// `Fn(Context) -> impl Future<Output = Result<impl Into<Reply>, HandlerError>>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Reply, HandlerError>>;
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    R: Into<Reply>,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, Result<Reply, HandlerError>> {
        let fut = self(ctx);
        Box::pin(async move { fut.await.map(Into::into) })
    }
}

/// A method leaf with optional schemas and a description.
#[derive(Clone)]
pub struct Route {
    query: Option<CompiledSchema>,
    body: Option<CompiledSchema>,
    description: Option<String>,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new<H: Handler>(handler: H) -> Self {
        Self::from_handler(Arc::new(handler))
    }

    pub fn from_handler(handler: Arc<dyn Handler>) -> Self {
        Self {
            query: None,
            body: None,
            description: None,
            handler,
        }
    }

    pub fn query(mut self, schema: CompiledSchema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn body(mut self, schema: CompiledSchema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn query_schema(&self) -> Option<&CompiledSchema> {
        self.query.as_ref()
    }

    pub fn body_schema(&self) -> Option<&CompiledSchema> {
        self.body.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("query", &self.query)
            .field("body", &self.body)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
