//! Request dispatch over a frozen route tree.
//!
//! # Data Flow
//! ```text
//! Request
//!     → matcher::resolve (404 if no leaf)
//!     → Context { request, params.path, env }
//!     → middleware chain, parent → child      (dispatch only)
//!     → terminal: validate query, validate body, call handler
//!     → Response
//! ```

use std::sync::Arc;
use std::time::Instant;

use crate::context::{Context, Env};
use crate::error::HandlerResult;
use crate::http::{Request, Response};
use crate::middleware::{run_chain, terminal_fn};
use crate::observability::metrics;
use crate::routing::{resolve, Leaf, Router};
use crate::schema::shape_query;

#[derive(Clone, Debug)]
pub struct Dispatcher {
    root: Arc<Router>,
    env: Arc<Env>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self {
            root: Arc::new(router),
            env: Arc::default(),
        }
    }

    /// Environment bindings visible to every handler through its context.
    pub fn with_env(mut self, env: Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn router(&self) -> &Router {
        &self.root
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Resolve and run through the matched middleware chain.
    pub async fn dispatch(&self, request: Request) -> HandlerResult {
        self.run(request, true).await
    }

    /// Resolve and run without middleware. Validation still applies.
    pub async fn dispatch_direct(&self, request: Request) -> HandlerResult {
        self.run(request, false).await
    }

    async fn run(&self, request: Request, with_middleware: bool) -> HandlerResult {
        let method = request.method;
        let Some(found) = resolve(&self.root, method, &request.path) else {
            tracing::debug!(method = %method, path = %request.path, "No route matched");
            metrics::record_not_found(method.as_str());
            return Ok(Response::not_found());
        };

        tracing::debug!(
            method = %method,
            path = %request.path,
            route = %found.pattern,
            "Route matched"
        );

        let mut ctx = Context::new(request, Arc::clone(&self.env));
        ctx.params_mut().path = found.params;

        let leaf = found.leaf;
        if !with_middleware || found.middleware.is_empty() {
            return invoke(leaf, ctx).await;
        }

        let terminal = terminal_fn(move |ctx| invoke(leaf.clone(), ctx));
        run_chain(&found.middleware, ctx, terminal).await
    }
}

/// Terminal step: validate, then call the handler.
async fn invoke(leaf: Leaf, mut ctx: Context) -> HandlerResult {
    let started = Instant::now();
    let method = ctx.method();
    let route = leaf.route.as_deref();

    let query_schema = route.and_then(|r| r.query_schema());
    let shaped = shape_query(&ctx.request().query, query_schema);
    match query_schema {
        Some(schema) => match schema.validate(&serde_json::Value::Object(shaped)) {
            Ok(query) => ctx.params_mut().query = Some(query),
            Err(errors) => {
                tracing::debug!(%errors, "Query validation failed");
                metrics::record_validation_failure("query");
                return Ok(Response::validation_failed(&errors));
            }
        },
        None => ctx.params_mut().query = Some(shaped),
    }

    if method.has_body() {
        if let Some(schema) = route.and_then(|r| r.body_schema()) {
            let body = ctx.request().body.clone().unwrap_or(serde_json::Value::Null);
            match schema.validate(&body) {
                Ok(body) => ctx.params_mut().body = Some(body),
                Err(errors) => {
                    tracing::debug!(%errors, "Body validation failed");
                    metrics::record_validation_failure("body");
                    return Ok(Response::validation_failed(&errors));
                }
            }
        }
    }

    let reply = leaf.handler.call(ctx).await?;
    tracing::trace!(method = %method, elapsed = ?started.elapsed(), "Handler finished");
    Ok(reply.into_response())
}
