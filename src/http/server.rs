//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the axum router: one fallback handler feeding the dispatcher
//! - Wire up tower layers (body limit, tracing)
//! - Translate axum requests into [`Request`] and [`Response`] back
//! - Serve on a listener until shutdown is triggered

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, State},
    http::{Request as HttpRequest, StatusCode},
    response::IntoResponse,
    Router as AxumRouter,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::ListenerConfig;
use crate::http::{Dispatcher, Request, Response};
use crate::lifecycle::Shutdown;
use crate::routing::Method;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON body";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Payload too large";

#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

/// HTTP front end for a [`Dispatcher`].
pub struct HttpServer {
    router: AxumRouter,
}

impl HttpServer {
    pub fn new(dispatcher: Dispatcher, config: &ListenerConfig) -> Self {
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
            max_body_bytes: config.max_body_bytes,
        };
        Self {
            router: Self::build_router(state),
        }
    }

    fn build_router(state: AppState) -> AxumRouter {
        let max_body_bytes = state.max_body_bytes;
        AxumRouter::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(max_body_bytes))
            .layer(TraceLayer::new_for_http())
    }

    /// The axum router, for driving the server without a socket.
    pub fn router(&self) -> AxumRouter {
        self.router.clone()
    }

    /// Serve until `shutdown` is triggered, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(
    State(state): State<AppState>,
    request: HttpRequest<AxumBody>,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let Some(method) = Method::from_http(&parts.method) else {
        tracing::debug!(method = %parts.method, "Unsupported method");
        return Response::not_found().into_response();
    };

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, "Rejected request body");
            return Response::error(StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE_MESSAGE)
                .into_response();
        }
    };

    let body = if method.has_body() && !bytes.is_empty() {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "Malformed JSON body");
                return Response::error(StatusCode::BAD_REQUEST, INVALID_JSON_MESSAGE).into_response();
            }
        }
    } else {
        None
    };

    let query = parts
        .uri
        .query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();

    let peer = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let request = Request {
        method,
        path: parts.uri.path().to_string(),
        query,
        headers: parts.headers,
        body,
        peer,
    };

    match state.dispatcher.dispatch(request).await {
        Ok(response) => response.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Unhandled handler error");
            Response::from_error(&err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use serde_json::json;
    use tower::ServiceExt;

    use crate::context::Context;
    use crate::error::HandlerError;
    use crate::routing::{Route, Router};
    use crate::schema::CompiledSchema;

    async fn echo(ctx: Context) -> Result<Value, HandlerError> {
        Ok(json!({ "query": ctx.params().query, "body": ctx.params().body }))
    }

    async fn fail(_ctx: Context) -> Result<Value, HandlerError> {
        Err(HandlerError::msg("secret detail"))
    }

    fn server(max_body_bytes: usize) -> AxumRouter {
        let body = CompiledSchema::from_json(&json!({ "name": "string" })).unwrap();
        let router = Router::new()
            .nest(
                "items",
                Router::new()
                    .get(Route::new(echo))
                    .post(Route::new(echo).body(body)),
            )
            .nest("fail", Router::new().handler(Method::Get, fail));
        let config = ListenerConfig {
            max_body_bytes,
            ..ListenerConfig::default()
        };
        HttpServer::new(router.into_dispatcher(), &config).router()
    }

    async fn send(app: AxumRouter, request: HttpRequest<AxumBody>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, value)
    }

    fn post(uri: &str, body: &str) -> HttpRequest<AxumBody> {
        HttpRequest::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(AxumBody::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn query_pairs_reach_the_handler() {
        let request = HttpRequest::get("/items?a=1&a=2&b=x%20y")
            .body(AxumBody::empty())
            .unwrap();
        let (status, body) = send(server(1024), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["query"], json!({ "a": ["1", "2"], "b": "x y" }));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) = send(server(1024), post("/items", "{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid JSON body" }));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let big = format!(r#"{{"name":"{}"}}"#, "x".repeat(64));
        let (status, _) = send(server(16), post("/items", &big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn validation_failure_is_bad_request_with_details() {
        let (status, body) = send(server(1024), post("/items", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Validation failed", "details": { "name": ["Required"] } })
        );
    }

    #[tokio::test]
    async fn unhandled_errors_are_opaque_500s() {
        let request = HttpRequest::get("/fail").body(AxumBody::empty()).unwrap();
        let (status, body) = send(server(1024), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let request = HttpRequest::delete("/items").body(AxumBody::empty()).unwrap();
        let (status, body) = send(server(1024), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn json_responses_carry_content_type() {
        let request = HttpRequest::get("/items").body(AxumBody::empty()).unwrap();
        let response = server(1024).oneshot(request).await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }
}
