//! Request-boundary error taxonomy.
//!
//! Every route handler returns `Result<_, ApiError>`. The `IntoResponse`
//! impl converts the error into a `{"error": …}` JSON body plus a server-side
//! log line. Database and upstream detail is logged, never leaked.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Actor/resource mismatch — the caller may not touch this resource.
    #[error("{0}")]
    Authorization(String),

    /// Resource does not exist (or is not visible to the caller).
    #[error("{0}")]
    NotFound(String),

    /// No authenticated identity on a route that requires one.
    #[error("authentication required")]
    Unauthenticated,

    /// A required secret or setting is absent.
    #[error("{0}")]
    Config(String),

    /// The external completion API failed or returned garbage.
    #[error("{0}")]
    Generation(String),

    /// Persistence failure with a caller-facing message.
    #[error("{0}")]
    Internal(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Config(_)
            | ApiError::Generation(_)
            | ApiError::Internal(_)
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to put in the response body.
    fn public_message(&self) -> String {
        match self {
            // Database errors carry driver detail — replace with a fixed message.
            ApiError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, "request failed: {:#}", self);
        } else {
            warn!(status = %status, "request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
