//! Outbound response representation.
//!
//! # Responsibilities
//! - Carry status, headers and a JSON/text body out of the dispatcher
//! - Build the canonical failure bodies (400, 404, 429, 500, ...)
//! - Render the body exactly as it goes over the wire (`body_text`)
//!
//! # Design Decisions
//! - Every failure body is `{"error": <message>}`; validation failures add
//!   `details` with the field → messages map
//! - Handler errors never leak their message unless they carry a status

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};

use crate::error::HandlerError;
use crate::schema::FieldErrors;

pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const VALIDATION_MESSAGE: &str = "Validation failed";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: Body) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body,
        }
    }

    /// `200` with a JSON body.
    pub fn json(value: Value) -> Self {
        Self::new(StatusCode::OK, Body::Json(value))
    }

    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status, Body::Text(text.into()))
    }

    pub fn empty(status: StatusCode) -> Self {
        Self::new(status, Body::Empty)
    }

    /// Failure body `{"error": message}`.
    pub fn error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, Body::Json(json!({ "error": message.into() })))
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    pub fn validation_failed(errors: &FieldErrors) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            Body::Json(json!({ "error": VALIDATION_MESSAGE, "details": errors })),
        )
    }

    pub fn internal_error() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
    }

    /// Map an unrecovered handler error to its response.
    pub fn from_error(error: &HandlerError) -> Self {
        match error {
            HandlerError::Status { status, message } => Self::error(*status, message.clone()),
            _ => Self::internal_error(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Content type implied by the body, if any.
    pub fn content_type(&self) -> Option<&'static str> {
        match self.body {
            Body::Empty => None,
            Body::Json(_) => Some("application/json"),
            Body::Text(_) => Some("text/plain; charset=utf-8"),
        }
    }

    /// The body as it is written to the wire.
    pub fn body_text(&self) -> String {
        match &self.body {
            Body::Empty => String::new(),
            Body::Json(value) => value.to_string(),
            Body::Text(text) => text.clone(),
        }
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let content_type = self.content_type();
        let (status, mut headers, body) = self.into_parts();
        if let Some(content_type) = content_type {
            headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(content_type));
        }
        let body = match body {
            Body::Empty => axum::body::Body::empty(),
            Body::Json(value) => axum::body::Body::from(value.to_string()),
            Body::Text(text) => axum::body::Body::from(text),
        };
        (status, headers, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_carries_details() {
        let mut errors = FieldErrors::new();
        errors.add("count", "Expected number");
        let response = Response::validation_failed(&errors);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body(),
            &Body::Json(json!({
                "error": "Validation failed",
                "details": { "count": ["Expected number"] }
            }))
        );
    }

    #[test]
    fn status_errors_keep_their_status() {
        let forbidden = HandlerError::status(StatusCode::FORBIDDEN, "nope");
        assert_eq!(Response::from_error(&forbidden).status(), StatusCode::FORBIDDEN);

        let opaque = HandlerError::msg("database exploded");
        let response = Response::from_error(&opaque);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.body_text().contains("database"));
    }

    #[test]
    fn body_text_is_compact_json() {
        let response = Response::json(json!({ "a": [1, 2] }));
        assert_eq!(response.body_text(), r#"{"a":[1,2]}"#);
        assert_eq!(Response::empty(StatusCode::NO_CONTENT).body_text(), "");
    }
}
