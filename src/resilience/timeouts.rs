//! Timeout enforcement.
//!
//! The inner chain is dropped when the deadline passes, which cancels the
//! handler at its next suspension point.

use std::time::Duration;

use axum::http::StatusCode;
use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::Response;
use crate::middleware::{Middleware, Next};

pub const TIMEOUT_MESSAGE: &str = "Request timeout";

#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Middleware for Timeout {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let path = ctx.path().to_string();
            match tokio::time::timeout(self.duration, next.run(ctx)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(path = %path, timeout = ?self.duration, "Request timed out");
                    Ok(Response::error(StatusCode::GATEWAY_TIMEOUT, TIMEOUT_MESSAGE))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "timeout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::http::Request;
    use crate::middleware::{run_chain, terminal_fn, Terminal};
    use crate::routing::Method;

    fn sleeper(delay: Duration) -> Terminal {
        terminal_fn(move |_ctx: Context| async move {
            tokio::time::sleep(delay).await;
            Ok(Response::json(json!("done")))
        })
    }

    fn ctx() -> Context {
        Context::new(Request::new(Method::Get, "/slow"), Arc::default())
    }

    #[tokio::test]
    async fn slow_handler_times_out() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(Timeout::new(Duration::from_millis(50)))];
        let response = run_chain(&chain, ctx(), sleeper(Duration::from_secs(5))).await.unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(response.body_text(), r#"{"error":"Request timeout"}"#);
    }

    #[tokio::test]
    async fn fast_handler_passes() {
        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(Timeout::new(Duration::from_secs(1)))];
        let response = run_chain(&chain, ctx(), sleeper(Duration::from_millis(10))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
