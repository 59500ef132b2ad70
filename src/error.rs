//! Handler and middleware failures.
//!
//! Expected failures (validation, not-found) are described by data and never
//! surface here. A `HandlerError` is what a handler or middleware raises
//! instead of returning a response; it unwinds the middleware chain until an
//! error-recovering middleware turns it into a response, or the transport
//! maps it with [`crate::http::Response::from_error`].

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::Response;

/// Result of running a middleware chain or the terminal step.
pub type HandlerResult = Result<Response, HandlerError>;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// A failure that carries its own status and public message.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        HandlerError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }

    pub fn other<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        HandlerError::Other(Box::new(error))
    }

    /// Status the transport should answer with if nothing recovers this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Status { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
