//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use routemirror::config::ListenerConfig;
use routemirror::lifecycle::Shutdown;
use routemirror::schema::CompiledSchema;
use routemirror::{Context, Dispatcher, HandlerError, HttpServer, Method, Response, Route, Router};

/// A server running on an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Serve `dispatcher` on 127.0.0.1:0.
pub async fn spawn_server(dispatcher: Dispatcher) -> TestServer {
    spawn_server_with(dispatcher, ListenerConfig::default()).await
}

pub async fn spawn_server_with(dispatcher: Dispatcher, config: ListenerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(dispatcher, &config);
    let signal = shutdown.clone();
    let handle = tokio::spawn(async move {
        server.run(listener, signal).await.unwrap();
    });

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

fn schema(value: Value) -> CompiledSchema {
    CompiledSchema::from_json(&value).unwrap()
}

async fn list_users(ctx: Context) -> Result<Value, HandlerError> {
    Ok(json!({ "query": ctx.params().query }))
}

async fn create_user(ctx: Context) -> Result<Response, HandlerError> {
    let body = ctx.params().body.clone().unwrap_or_default();
    Ok(Response::json(json!({ "created": body })).with_status(StatusCode::CREATED))
}

async fn get_user(ctx: Context) -> Result<Value, HandlerError> {
    Ok(json!({ "id": ctx.path_param("id"), "query": ctx.params().query }))
}

async fn user_posts(ctx: Context) -> Result<Value, HandlerError> {
    Ok(json!([{ "author": ctx.path_param("id"), "title": "hello" }]))
}

async fn echo(ctx: Context) -> Result<Value, HandlerError> {
    Ok(ctx.request().body.clone().unwrap_or(Value::Null))
}

async fn fail(_ctx: Context) -> Result<Value, HandlerError> {
    Err(HandlerError::msg("database unavailable"))
}

async fn teapot(_ctx: Context) -> Result<Value, HandlerError> {
    Err(HandlerError::status(StatusCode::IM_A_TEAPOT, "short and stout"))
}

async fn no_content(_ctx: Context) -> Result<Response, HandlerError> {
    Ok(Response::empty(StatusCode::NO_CONTENT))
}

async fn plain(_ctx: Context) -> Result<Response, HandlerError> {
    Ok(Response::text(StatusCode::OK, "just text"))
}

async fn whoami(ctx: Context) -> Result<Value, HandlerError> {
    Ok(json!({ "team": ctx.request().header_str("x-team"), "region": ctx.env_var("REGION") }))
}

/// Users API plus a handful of edge-case leaves.
pub fn sample_tree() -> Router {
    Router::new()
        .nest(
            "users",
            Router::new()
                .get(Route::new(list_users).query(schema(json!({
                    "limit": "number?",
                    "tags": "string[]?",
                    "active": "boolean?"
                }))))
                .post(Route::new(create_user).body(schema(json!({
                    "name": "string",
                    "age": "number?",
                    "address": { "city": "string" }
                }))))
                .nest(
                    "$id",
                    Router::new()
                        .get(Route::new(get_user))
                        .handler(Method::Delete, no_content)
                        .nest("posts", Router::new().handler(Method::Get, user_posts)),
                ),
        )
        .nest("echo", Router::new().handler(Method::Post, echo).handler(Method::Put, echo))
        .nest("fail", Router::new().handler(Method::Get, fail))
        .nest("teapot", Router::new().handler(Method::Get, teapot))
        .nest("plain", Router::new().handler(Method::Get, plain))
        .nest("whoami", Router::new().handler(Method::Get, whoami))
}
