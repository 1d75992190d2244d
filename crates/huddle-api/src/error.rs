use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use huddle_chat::ChatError;
use huddle_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input, rejected before reaching the chat core.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or expired credentials.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                warn!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Unauthorized(msg) => {
                warn!("Authentication failed: {}", msg);
                (StatusCode::UNAUTHORIZED, msg)
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Chat(err) => match err {
                ChatError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
                ChatError::Conflict(msg) => (StatusCode::CONFLICT, msg),
                // Authenticated, but not allowed into this conversation.
                ChatError::Unauthorized(msg) => (StatusCode::FORBIDDEN, msg),
                ChatError::Storage(e) => {
                    error!(error = %e, "storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An unexpected error occurred".to_string(),
                    )
                }
            },
            ApiError::Internal(e) => {
                error!(error = %e, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(status.as_u16(), message))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
