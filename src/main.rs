//! Demo server: a small users API built from a route tree.
//!
//! ```text
//! GET    /users            list users (?role=, ?limit=)
//! POST   /users            create a user
//! GET    /users/{id}       fetch one user
//! DELETE /users/{id}       remove a user
//! GET    /openapi.json     generated API description
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::http::StatusCode;
use clap::Parser;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use routemirror::config::{load_config, ServerConfig};
use routemirror::docs::{self, DocsInfo};
use routemirror::lifecycle::{shutdown_on_signal, Shutdown};
use routemirror::middleware::{ErrorHandler, Logger, RequestId};
use routemirror::observability::{init_metrics, init_tracing};
use routemirror::resilience::Timeout;
use routemirror::schema::{CompiledSchema, SchemaError};
use routemirror::security::RateLimit;
use routemirror::{Context, HandlerError, HttpServer, Method, Response, Route, Router};

#[derive(Parser)]
#[command(name = "routemirror")]
#[command(about = "Serve the demo users API", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Default)]
struct UserStore {
    users: DashMap<String, Value>,
    next_id: AtomicU64,
}

impl UserStore {
    fn list(&self, role: Option<&str>, limit: Option<usize>) -> Vec<Value> {
        let mut users: Vec<Value> = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|user| role.map_or(true, |role| user["role"] == role))
            .collect();
        users.sort_by(|a, b| a["id"].as_str().cmp(&b["id"].as_str()));
        users.truncate(limit.unwrap_or(usize::MAX));
        users
    }

    fn create(&self, mut user: Value) -> Value {
        let id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        user["id"] = json!(id);
        self.users.insert(id, user.clone());
        user
    }
}

fn not_found_user() -> HandlerError {
    HandlerError::status(StatusCode::NOT_FOUND, "User not found")
}

fn api_router(store: Arc<UserStore>) -> Result<Router, SchemaError> {
    let list_query = CompiledSchema::from_json(&json!({ "role": "string?", "limit": "number?" }))?;
    let create_body = CompiledSchema::from_json(&json!({
        "name": "string",
        "role": "string?",
        "tags": "string[]?",
        "address": { "city": "string", "zip": "string?" }
    }))?;

    let list = {
        let store = Arc::clone(&store);
        move |ctx: Context| {
            let store = Arc::clone(&store);
            async move {
                let role = ctx.query_value("role").and_then(Value::as_str);
                let limit = ctx.query_value("limit").and_then(Value::as_u64).map(|n| n as usize);
                Ok::<_, HandlerError>(json!(store.list(role, limit)))
            }
        }
    };
    let create = {
        let store = Arc::clone(&store);
        move |ctx: Context| {
            let store = Arc::clone(&store);
            async move {
                let body = ctx.params().body.clone().unwrap_or_default();
                let user = store.create(Value::Object(body));
                Ok::<_, HandlerError>(Response::json(user).with_status(StatusCode::CREATED))
            }
        }
    };
    let fetch = {
        let store = Arc::clone(&store);
        move |ctx: Context| {
            let store = Arc::clone(&store);
            async move {
                let id = ctx.path_param("id").unwrap_or_default();
                store
                    .users
                    .get(id)
                    .map(|user| user.value().clone())
                    .ok_or_else(not_found_user)
            }
        }
    };
    let remove = move |ctx: Context| {
        let store = Arc::clone(&store);
        async move {
            let id = ctx.path_param("id").unwrap_or_default();
            store
                .users
                .remove(id)
                .map(|_| Response::empty(StatusCode::NO_CONTENT))
                .ok_or_else(not_found_user)
        }
    };

    Ok(Router::new().nest(
        "users",
        Router::new()
            .get(Route::new(list).query(list_query).describe("List users"))
            .post(Route::new(create).body(create_body).describe("Create a user"))
            .nest(
                "$id",
                Router::new()
                    .get(Route::new(fetch).describe("Fetch one user"))
                    .handler(Method::Delete, remove),
            ),
    ))
}

fn app_router(config: &ServerConfig) -> Result<Router, SchemaError> {
    let api = api_router(Arc::new(UserStore::default()))?;
    let openapi = Arc::new(docs::generate(&api, &DocsInfo::new("routemirror demo", env!("CARGO_PKG_VERSION"))));

    let mut router = api
        .nest(
            "openapi.json",
            Router::new().handler(Method::Get, move |_ctx: Context| {
                let openapi = Arc::clone(&openapi);
                async move { Ok::<_, HandlerError>(Value::clone(&openapi)) }
            }),
        )
        .layer(RequestId)
        .layer(Logger::new());

    if config.rate_limit.enabled {
        router = router.layer(RateLimit::from_config(&config.rate_limit));
    }
    if let Some(limit) = config.timeouts.request() {
        router = router.layer(Timeout::new(limit));
    }
    Ok(router.layer(ErrorHandler))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_tracing(&config.observability);
    tracing::info!("routemirror v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit = config.rate_limit.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let dispatcher = app_router(&config)?
        .into_dispatcher()
        .with_env(config.env.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown_on_signal(shutdown.clone());

    HttpServer::new(dispatcher, &config.listener)
        .run(listener, shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
