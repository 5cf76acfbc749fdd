use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::StorefrontError;

/// Error response: a status plus `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StorefrontError> for ApiError {
    fn from(e: StorefrontError) -> Self {
        let status = match &e {
            StorefrontError::Validation { .. }
            | StorefrontError::ProductNotFound(_)
            | StorefrontError::ProfileNotFound => StatusCode::BAD_REQUEST,
            StorefrontError::Unauthorized => StatusCode::UNAUTHORIZED,
            StorefrontError::Forbidden => StatusCode::FORBIDDEN,
            StorefrontError::OrderNotFound => StatusCode::NOT_FOUND,
            StorefrontError::Conflict(_) => StatusCode::CONFLICT,
            StorefrontError::Storage(inner) => {
                tracing::error!(error = %inner, "storage failure");
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };
        Self::new(status, e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "request body rejected");
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
