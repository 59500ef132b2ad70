//! Bearer token authentication middleware.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use futures_util::future::BoxFuture;

use crate::context::Context;
use crate::error::HandlerResult;
use crate::http::Response;
use crate::middleware::{Middleware, Next};

pub const MISSING_TOKEN_MESSAGE: &str = "Missing bearer token";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token";

/// Authenticated caller, stored in the context extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub scopes: Vec<String>,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            scopes: Vec::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

pub trait TokenVerifier: Send + Sync + 'static {
    /// `None` if the token is not valid.
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<Principal>>;
}

/// Fixed token → principal table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, Principal>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }
}

impl TokenVerifier for StaticTokens {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Option<Principal>> {
        Box::pin(async move { self.tokens.get(token).cloned() })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(ctx: &Context) -> Option<&str> {
    let value = ctx.request().header_str(header::AUTHORIZATION.as_str())?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// Answers `401` unless the request carries a token the verifier accepts;
/// on success the [`Principal`] is available to handlers via
/// `ctx.extensions().get::<Principal>()`.
#[derive(Clone)]
pub struct BearerAuth {
    verifier: Arc<dyn TokenVerifier>,
}

impl BearerAuth {
    pub fn new<V: TokenVerifier>(verifier: V) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

impl Middleware for BearerAuth {
    fn handle<'a>(&'a self, mut ctx: Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let Some(token) = bearer_token(&ctx).map(str::to_string) else {
                return Ok(Response::error(StatusCode::UNAUTHORIZED, MISSING_TOKEN_MESSAGE));
            };
            match self.verifier.verify(&token).await {
                Some(principal) => {
                    tracing::debug!(subject = %principal.subject, "Authenticated request");
                    ctx.extensions_mut().insert(principal);
                    next.run(ctx).await
                }
                None => {
                    tracing::warn!(path = %ctx.path(), "Rejected bearer token");
                    Ok(Response::error(StatusCode::UNAUTHORIZED, INVALID_TOKEN_MESSAGE))
                }
            }
        })
    }

    fn name(&self) -> &'static str {
        "bearer_auth"
    }
}
