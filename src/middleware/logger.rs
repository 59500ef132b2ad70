//! Request logging.
//!
//! Emits one `tracing` event and one metrics sample per request. Errors are
//! logged and then re-raised, so an outer middleware or the transport still
//! decides the response.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::Response;
use crate::middleware::{Middleware, Next};
use crate::observability::metrics;
use crate::routing::Method;

/// What the logger saw for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub method: Method,
    pub path: String,
    /// Status that will be answered; for errors, the status they map to.
    pub status: u16,
    pub duration: Duration,
    pub request_id: Option<String>,
    /// Message of an unrecovered error.
    pub error: Option<String>,
}

type Observer = Arc<dyn Fn(&LogRecord) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Logger {
    observer: Option<Observer>,
}

impl Logger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also hand every record to `observer`.
    pub fn with_observer<F>(observer: F) -> Self
    where
        F: Fn(&LogRecord) + Send + Sync + 'static,
    {
        Self {
            observer: Some(Arc::new(observer)),
        }
    }
}

impl Middleware for Logger {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let started = Instant::now();
            let method = ctx.method();
            let path = ctx.path().to_string();
            let request_id = ctx.request_id().map(str::to_string);

            let result = next.run(ctx).await;

            let (status, error) = match &result {
                Ok(response) => (response.status().as_u16(), None),
                Err(err) => (Response::from_error(err).status().as_u16(), Some(err.to_string())),
            };
            let record = LogRecord {
                method,
                path,
                status,
                duration: started.elapsed(),
                request_id,
                error,
            };

            match &record.error {
                None => tracing::info!(
                    method = %record.method,
                    path = %record.path,
                    status = record.status,
                    duration_ms = record.duration.as_millis() as u64,
                    request_id = record.request_id.as_deref().unwrap_or("-"),
                    "Request completed"
                ),
                Some(error) => tracing::error!(
                    method = %record.method,
                    path = %record.path,
                    status = record.status,
                    duration_ms = record.duration.as_millis() as u64,
                    request_id = record.request_id.as_deref().unwrap_or("-"),
                    error = %error,
                    "Request failed"
                ),
            }
            metrics::record_request(method.as_str(), status, started);

            if let Some(observer) = &self.observer {
                observer(&record);
            }
            result
        })
    }

    fn name(&self) -> &'static str {
        "logger"
    }
}
