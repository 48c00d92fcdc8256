//! Error types for relaunch-daemon

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relaunch_deployment::DeploymentError;
use serde::Serialize;
use thiserror::Error;

/// Body returned for failed redeploys; the cause stays in the server log
pub const DEPLOYMENT_FAILED_MESSAGE: &str =
    "Internal server error during deployment. Check logs for details.";

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// One-shot redeploy failed
    #[error("Deployment failed: {0}")]
    Deployment(#[from] DeploymentError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong webhook token
    #[error("Invalid or missing token")]
    Unauthorized,

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Redeploy failure
    #[error("Deployment failed: {0}")]
    Deployment(#[from] DeploymentError),

    /// Internal error outside the redeploy cycle itself
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (StatusCode::FORBIDDEN, "FORBIDDEN", self.to_string()),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string()),
            ApiError::Deployment(DeploymentError::InProgress { .. }) => {
                (StatusCode::CONFLICT, "CONFLICT", self.to_string())
            }
            ApiError::Deployment(e) => {
                tracing::error!(error = %e, "Deployment failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DEPLOYMENT_FAILED",
                    DEPLOYMENT_FAILED_MESSAGE.to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    DEPLOYMENT_FAILED_MESSAGE.to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
