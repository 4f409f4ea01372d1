use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response produced by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid authorization header")]
    InvalidHeader,

    #[error("unsupported token: {0}")]
    UnsupportedScheme(String),

    #[error("empty token")]
    EmptyToken,

    #[error("sign key not set")]
    SignKeyNotSet,

    #[error("validate key not set")]
    ValidateKeyNotSet,

    #[error("unsupported signing method: {0}")]
    UnsupportedSigningMethod(String),

    /// Malformed token, bad signature, or failed `exp`/`nbf` check.
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("invalid opensearch url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Non-2xx answer; carries the response body verbatim.
    #[error("[{status}] {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DatastoreError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DatastoreError::Status { status, .. } => Some(*status),
            DatastoreError::Http(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
