use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Failure envelope shared by every endpoint: `{success: false, error}`.
/// Persistence failures and bad input both use this shape; only the status
/// code tells them apart.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

pub type ErrorResponse = (StatusCode, Json<ApiError>);

pub fn bad_request(error: impl Into<String>) -> ErrorResponse {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(error)))
}

pub fn internal_error(error: impl std::fmt::Display) -> ErrorResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError::new(error.to_string())),
    )
}

/// Bare `{success: true}` acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
