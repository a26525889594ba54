// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::models::view::AttemptStatus;

/// Global Application Error Enum.
/// Centralizes error handling of the host-facing routes and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    AuthError(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., attempt already mounted, selection after submit)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::InvalidDefinition(msg) => AppError::BadRequest(msg),
            other => AppError::Conflict(other.to_string()),
        }
    }
}

/// Failure of a call across the remote backend boundary.
/// Never escapes the attempt core; it is folded into the controller's ERROR state.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// Connection refused, reset, DNS failure and the like.
    Network(String),

    Timeout,

    /// Backend answered with a non-success status.
    Status(u16, String),

    /// Backend answered 2xx but the body did not match the expected shape.
    Malformed(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Network(msg) => write!(f, "network error: {}", msg),
            GatewayError::Timeout => write!(f, "request timed out"),
            GatewayError::Status(code, msg) => write!(f, "backend returned {}: {}", code, msg),
            GatewayError::Malformed(msg) => write!(f, "malformed response: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout
        } else if err.is_decode() {
            GatewayError::Malformed(err.to_string())
        } else {
            GatewayError::Network(err.to_string())
        }
    }
}

/// A transition the attempt state machine refused.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptError {
    InvalidTransition {
        from: AttemptStatus,
        action: &'static str,
    },

    /// The loaded definition failed validation; the session is now in ERROR.
    InvalidDefinition(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::InvalidTransition { from, action } => {
                write!(f, "cannot {} while attempt is {}", action, from)
            }
            AttemptError::InvalidDefinition(msg) => write!(f, "invalid definition: {}", msg),
        }
    }
}

impl std::error::Error for AttemptError {}
