//! API error types.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde::Serialize;

/// JSON body of every management API error.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("missing or invalid API token")]
    Unauthorized,
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::NotFound(..)) => "not_found",
            Self::Domain(DomainError::ValidationError(_)) => "validation_error",
            Self::Domain(DomainError::Unauthorized(_)) | Self::Unauthorized => "unauthorized",
            Self::Domain(DomainError::Conflict(_)) => "conflict",
            Self::Domain(DomainError::Internal(_)) => "internal_error",
            Self::BadRequest(_) => "bad_request",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Domain(DomainError::NotFound(..)) => StatusCode::NOT_FOUND,
            Self::Domain(DomainError::ValidationError(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Domain(DomainError::Unauthorized(_)) | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Domain(DomainError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Domain(DomainError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Internal details go to the log, not the client.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
