//! Request correlation IDs.
//!
//! Honours an inbound `x-request-id` or generates a UUID v4, stores it on the
//! context and echoes it on the response.

use axum::http::{HeaderName, HeaderValue};
use futures_util::future::BoxFuture;
use uuid::Uuid;

use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::X_REQUEST_ID;
use crate::middleware::{Middleware, Next};

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestId;

impl RequestId {
    fn resolve(ctx: &Context) -> String {
        ctx.request()
            .header_str(X_REQUEST_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

impl Middleware for RequestId {
    fn handle<'a>(&'a self, mut ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let id = Self::resolve(&ctx);
            ctx.set_request_id(id.clone());

            let mut response = next.run(ctx).await?;
            if let Ok(value) = HeaderValue::from_str(&id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(X_REQUEST_ID), value);
            }
            Ok(response)
        })
    }

    fn name(&self) -> &'static str {
        "request_id"
    }
}
