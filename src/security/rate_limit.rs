//! Fixed-window rate limiting middleware.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderValue, StatusCode};
use dashmap::DashMap;
use futures_util::future::BoxFuture;

use crate::config::RateLimitConfig;
use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::Response;
use crate::middleware::{Middleware, Next};
use crate::observability::metrics;

pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too many requests";

/// Key used when the request carries no client identity.
pub const GLOBAL_KEY: &str = "global";

/// Counter for one client within the current window.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rejects a client's requests beyond `max_requests` per `window` with
/// `429 {"error":"Too many requests"}` and a `Retry-After` header.
///
/// Clients are keyed by peer address. `x-forwarded-for` is only honoured
/// after [`RateLimit::trust_forwarded_for`]. Counters are shared by every
/// clone of the limiter; expired windows are dropped whenever a new one opens.
#[derive(Debug, Clone)]
pub struct RateLimit {
    windows: Arc<DashMap<String, Window>>,
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
}

impl RateLimit {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window,
            trust_forwarded_for: false,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
            .trust_forwarded_for(config.trust_forwarded_for)
    }

    /// Key clients by the first `x-forwarded-for` entry when present. Only
    /// safe behind a proxy that overwrites the header.
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Count one request for `key`. `Err` carries the time left in the window.
    fn check(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let (result, opened) = {
            let mut opened = false;
            let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| {
                opened = true;
                Window {
                    started: now,
                    count: 0,
                }
            });

            let elapsed = now.saturating_duration_since(entry.started);
            if elapsed >= self.window {
                *entry = Window {
                    started: now,
                    count: 0,
                };
                opened = true;
            }

            let result = if entry.count >= self.max_requests {
                Err(self.window.saturating_sub(elapsed.min(self.window)))
            } else {
                entry.count += 1;
                Ok(())
            };
            (result, opened)
        };

        // The entry guard is released above; retain locks every shard.
        if opened {
            self.evict_expired(now);
        }
        result
    }

    fn evict_expired(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }

    fn key_for(&self, ctx: &Context) -> String {
        client_key(ctx, self.trust_forwarded_for)
    }
}

/// Client identity: the first `x-forwarded-for` entry when `trust_forwarded`
/// is set, else the peer IP, else [`GLOBAL_KEY`] for in-process requests.
pub fn client_key(ctx: &Context, trust_forwarded: bool) -> String {
    let request = ctx.request();
    let forwarded = trust_forwarded
        .then(|| request.header_str("x-forwarded-for"))
        .flatten()
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| request.peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| GLOBAL_KEY.to_string())
}

impl Middleware for RateLimit {
    fn handle<'a>(&'a self, ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let key = self.key_for(&ctx);
            match self.check(&key, Instant::now()) {
                Ok(()) => next.run(ctx).await,
                Err(retry_after) => {
                    tracing::warn!(client = %key, path = %ctx.path(), "Rate limit exceeded");
                    metrics::record_rate_limited(&key);
                    let secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
                    Ok(Response::error(StatusCode::TOO_MANY_REQUESTS, TOO_MANY_REQUESTS_MESSAGE)
                        .with_header(header::RETRY_AFTER, HeaderValue::from(secs)))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "rate_limit"
    }
}
