//! Health and status handlers

use crate::api::rest::state::{AppState, LastRedeploy};
use axum::{extract::State, Json};
use serde::Serialize;

/// Landing message
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

/// Landing endpoint
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Webhook server is running. Use POST /webhook/docker-push".to_string(),
    })
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub redeploy_in_flight: bool,
    pub last_redeploy: Option<LastRedeploy>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        redeploy_in_flight: state.controller.is_in_flight(),
        last_redeploy: state.last_redeploy.read().await.clone(),
    })
}
