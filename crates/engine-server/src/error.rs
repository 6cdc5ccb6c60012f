//! Maps domain/view/runtime errors to the wire error envelope (§7
//! "User-visible error format: `{errorCode, errorMessage}` for
//! non-200").

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use engine_core::error::GameError;
use engine_core::views::ViewError;
use engine_runtime::RuntimeError;

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: String,
    #[serde(rename = "errorMessage")]
    error_message: String,
}

/// A transport-level failure with a concrete HTTP status, distinct
/// from a domain rejection (which is always HTTP 200, carried in the
/// transaction envelope by `engine-core`'s processor itself).
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn instance_not_found(instance_id: &str) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            "INSTANCE_NOT_FOUND",
            format!("instance '{instance_id}' not found"),
        )
    }

    pub fn ownership_violation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "OWNERSHIP_VIOLATION", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error_code: self.code,
                error_message: self.message,
            }),
        )
            .into_response()
    }
}

impl From<RuntimeError> for ApiError {
    fn from(err: RuntimeError) -> Self {
        match &err {
            RuntimeError::InstanceNotFound(id) => ApiError::instance_not_found(id),
            _ => {
                tracing::error!(error = %err, "internal runtime error");
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
            }
        }
    }
}

impl From<ViewError> for ApiError {
    fn from(err: ViewError) -> Self {
        let status = match err.error_code() {
            "CHARACTER_NOT_FOUND" | "PLAYER_NOT_FOUND" => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, err.error_code(), err.to_string())
    }
}
