//! Turns unrecovered handler errors into responses.

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::Response;
use crate::middleware::{Middleware, Next};

/// Recovers every `Err` from the inner chain with [`Response::from_error`].
/// Status errors keep their status and message; anything else becomes a
/// generic `500`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorHandler;

impl Middleware for ErrorHandler {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            match next.run(ctx).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    tracing::warn!(error = %err, "Recovered handler error");
                    Ok(Response::from_error(&err))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "error_handler"
    }
}
