///! Standardized error handling for API responses
///!
///! Provides consistent JSON error responses across all API endpoints

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard API error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for programmatic handling
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional detailed error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// API error types with standardized responses
#[derive(Debug)]
pub enum ApiError {
    /// 500 Internal Server Error
    Internal(String),

    /// 500 with the upstream cluster message passed through
    Cluster(String),

    /// 404 Not Found
    NotFound(String),

    /// 401 Unauthorized
    AuthenticationFailed,

    /// 403 Forbidden
    Forbidden(String),

    /// 400 Bad Request
    BadRequest(String),

    /// 409 Conflict
    Conflict(String),

    /// 503 Service Unavailable
    ServiceUnavailable(String),

    /// 504 Gateway Timeout, with the objects left behind
    ReadinessTimeout { message: String, left_in_place: Vec<String> },
}

impl ApiError {
    /// Convert error to ErrorResponse
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Internal(msg) => {
                error!("Internal API error: {}", msg);
                ErrorResponse::new(500, "INTERNAL_ERROR", "An internal server error occurred")
                    .with_details(msg)
            }
            ApiError::Cluster(msg) => {
                error!("Cluster error: {}", msg);
                ErrorResponse::new(500, "INTERNAL_ERROR", msg)
            }
            ApiError::NotFound(msg) => ErrorResponse::new(404, "NOT_FOUND", msg),
            ApiError::AuthenticationFailed => ErrorResponse::new(
                401,
                "AUTHENTICATION_FAILED",
                "Authentication credentials are invalid or missing",
            ),
            ApiError::Forbidden(msg) => ErrorResponse::new(403, "FORBIDDEN", msg),
            ApiError::BadRequest(msg) => ErrorResponse::new(400, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => ErrorResponse::new(409, "CONFLICT", msg),
            ApiError::ServiceUnavailable(msg) => {
                ErrorResponse::new(503, "SERVICE_UNAVAILABLE", msg)
            }
            ApiError::ReadinessTimeout { message, left_in_place } => {
                let response = ErrorResponse::new(504, "GATEWAY_TIMEOUT", message);
                if left_in_place.is_empty() {
                    response
                } else {
                    response.with_details(format!(
                        "Cluster objects left in place: {}",
                        left_in_place.join(", ")
                    ))
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = self.to_error_response();
        let status_code = StatusCode::from_u16(error_response.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, Json(error_response)).into_response()
    }
}

impl From<kubelab_common::Error> for ApiError {
    fn from(err: kubelab_common::Error) -> Self {
        match err {
            kubelab_common::Error::Validation(msg) => ApiError::BadRequest(msg),
            kubelab_common::Error::InvalidConfig(msg) => ApiError::BadRequest(msg),
            kubelab_common::Error::AuthenticationFailed => ApiError::AuthenticationFailed,
            kubelab_common::Error::System(msg) => ApiError::Internal(msg),
            kubelab_common::Error::Io(e) => ApiError::Internal(format!("I/O error: {}", e)),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        error!("Database error: {}", err);
        ApiError::Internal(format!("Database error: {}", err))
    }
}

/// Helper functions for creating common errors
impl ApiError {
    pub fn pod_not_found(name: impl Into<String>) -> Self {
        ApiError::NotFound(format!("Pod '{}' not found or not owned by user", name.into()))
    }

    pub fn group_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Group {} not found", id))
    }

    pub fn user_not_found() -> Self {
        ApiError::NotFound("User not found".to_string())
    }

    pub fn missing_field(field: &str) -> Self {
        ApiError::BadRequest(format!("Missing required field: {}", field))
    }
}
