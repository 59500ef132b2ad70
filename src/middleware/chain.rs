//! Onion-style middleware composition.
//!
//! ```text
//! run_chain([a, b, c], ctx, terminal)
//!     a.handle(ctx, next₁)
//!         → next₁.run(ctx) → b.handle(ctx, next₂)
//!             → next₂.run(ctx) → c.handle(ctx, next₃)
//!                 → next₃.run(ctx) → terminal(ctx)
//! ```
//!
//! A middleware may pass the result of `next.run` through, transform it,
//! recover from its `Err`, or return without calling `next` at all.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;

/// The innermost step of a chain.
pub type Terminal = Arc<dyn Fn(Context) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

pub trait Middleware: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult>;

    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Continuation handed to each middleware. Consumed by [`Next::run`].
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    terminal: Terminal,
}

impl Next {
    /// Invoke the remainder of the chain, or the terminal step if this is
    /// the last middleware.
    pub fn run(self, ctx: Context) -> BoxFuture<'static, HandlerResult> {
        Box::pin(async move {
            match self.chain.get(self.index).cloned() {
                Some(middleware) => {
                    tracing::trace!(middleware = middleware.name(), "Entering middleware");
                    let next = Next {
                        chain: Arc::clone(&self.chain),
                        index: self.index + 1,
                        terminal: Arc::clone(&self.terminal),
                    };
                    middleware.handle(ctx, next).await
                }
                None => (self.terminal)(ctx).await,
            }
        })
    }
}

/// Wrap an async closure as a [`Terminal`].
pub fn terminal_fn<F, Fut>(f: F) -> Terminal
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx: Context| -> BoxFuture<'static, HandlerResult> { Box::pin(f(ctx)) })
}

/// Run `middleware` outer to inner around `terminal`.
pub fn run_chain(
    middleware: &[Arc<dyn Middleware>],
    ctx: Context,
    terminal: Terminal,
) -> BoxFuture<'static, HandlerResult> {
    let next = Next {
        chain: Arc::from(middleware.to_vec()),
        index: 0,
        terminal,
    };
    next.run(ctx)
}

/// Middleware built from an async closure, see [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Adapt `async fn(Context, Next) -> HandlerResult` into a [`Middleware`].
///
/// ```ignore
/// let stamp = from_fn(|ctx, next: Next| async move {
///     let response = next.run(ctx).await?;
///     Ok(response.with_header(HeaderName::from_static("x-stamp"), HeaderValue::from_static("1")))
/// });
/// ```
pub fn from_fn<F, Fut>(f: F) -> FromFn<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FromFn { f }
}

impl<F, Fut> Middleware for FromFn<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin((self.f)(ctx, next))
    }

    fn name(&self) -> &'static str {
        "from_fn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::error::HandlerError;
    use crate::http::{Request, Response};
    use crate::routing::Method;

    fn ctx() -> Context {
        Context::new(Request::new(Method::Get, "/"), Arc::default())
    }

    fn terminal_ok(log: Arc<Mutex<Vec<String>>>) -> Terminal {
        terminal_fn(move |_ctx| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push("terminal".to_string());
                Ok(Response::json(json!("done")))
            }
        })
    }

    fn recorder(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
        Arc::new(from_fn(move |ctx, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{name}:before"));
                let result = next.run(ctx).await;
                log.lock().unwrap().push(format!("{name}:after"));
                result
            }
        }))
    }

    #[tokio::test]
    async fn runs_outer_to_inner_and_unwinds() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = vec![recorder("a", log.clone()), recorder("b", log.clone())];

        let response = run_chain(&chain, ctx(), terminal_ok(log.clone())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:before", "b:before", "terminal", "b:after", "a:after"]
        );
    }

    #[tokio::test]
    async fn short_circuit_skips_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let deny: Arc<dyn Middleware> = Arc::new(from_fn(|_ctx, _next: Next| async move {
            Ok(Response::error(StatusCode::UNAUTHORIZED, "Unauthorized"))
        }));
        let chain = vec![deny, recorder("inner", log.clone())];

        let response = run_chain(&chain, ctx(), terminal_ok(log.clone())).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_propagate_until_caught() {
        let failing = terminal_fn(|_ctx| async { Err(HandlerError::msg("boom")) });
        let recover: Arc<dyn Middleware> = Arc::new(from_fn(|ctx, next: Next| async move {
            match next.run(ctx).await {
                Ok(response) => Ok(response),
                Err(err) => Ok(Response::error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
            }
        }));

        let uncaught = run_chain(&[], ctx(), failing.clone()).await;
        assert!(matches!(uncaught, Err(HandlerError::Message(ref m)) if m == "boom"));

        let caught = run_chain(&[recover], ctx(), failing).await.unwrap();
        assert_eq!(caught.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn middleware_can_transform_the_response() {
        let retag: Arc<dyn Middleware> = Arc::new(from_fn(|ctx, next: Next| async move {
            Ok(next.run(ctx).await?.with_status(StatusCode::CREATED))
        }));
        let log = Arc::new(Mutex::new(Vec::new()));

        let response = run_chain(&[retag], ctx(), terminal_ok(log)).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
