//! HTTP Basic credentials.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Authorization scheme is not Basic")]
    WrongScheme,

    #[error("Invalid base64 in credentials")]
    InvalidBase64,

    #[error("Credentials are not UTF-8")]
    InvalidUtf8,

    #[error("Credentials missing ':' separator")]
    MissingSeparator,
}

/// `Authorization` header value for `username:password`.
pub fn encode_basic(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Parse an `Authorization: Basic ...` header value. The password may
/// contain `:`; the username may not.
pub fn decode_basic(header: &str) -> Result<Credentials, CredentialsError> {
    let encoded = header
        .strip_prefix("Basic ")
        .or_else(|| header.strip_prefix("basic "))
        .ok_or(CredentialsError::WrongScheme)?;
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CredentialsError::InvalidBase64)?;
    let decoded = String::from_utf8(bytes).map_err(|_| CredentialsError::InvalidUtf8)?;
    let (username, password) = decoded
        .split_once(':')
        .ok_or(CredentialsError::MissingSeparator)?;

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}
