//! Image push webhook

use crate::api::rest::state::AppState;
use crate::auth::TOKEN_HEADER;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

/// Push notification sent by the image build pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerPushPayload {
    pub repository: String,
    pub tag: String,
    pub pushed_by: String,
    pub github_repo: String,
    pub github_commit: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Webhook response
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub status: String,
    pub message: String,
}

/// Authenticate the push notification, then run a redeploy cycle
///
/// The token is checked before the body so unauthenticated callers learn
/// nothing about the payload schema. The cycle runs on its own task, so a
/// caller that hangs up mid-cycle does not stop it between delete and apply.
pub async fn handle_docker_push(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<DockerPushPayload>, JsonRejection>,
) -> ApiResult<Json<WebhookResponse>> {
    let token = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
    state.auth.verify(token)?;

    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    tracing::info!("Webhook received and authenticated");
    tracing::info!(
        repository = %payload.repository,
        tag = %payload.tag,
        pushed_by = %payload.pushed_by,
        github_repo = %payload.github_repo,
        github_commit = %payload.github_commit,
        "Deploying {}:{} to Kubernetes",
        payload.repository,
        payload.tag
    );

    let cycle_state = state.clone();
    let cycle = tokio::spawn(
        async move {
            let result = cycle_state
                .controller
                .redeploy(&cycle_state.manifest_path)
                .await;
            cycle_state.record(&result).await;
            result
        }
        .in_current_span(),
    );
    let report = cycle
        .await
        .map_err(|e| ApiError::Internal(format!("Redeploy task failed: {}", e)))??;

    tracing::info!(
        delete_attempts = report.delete_attempts,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Redeploy finished"
    );

    Ok(Json(WebhookResponse {
        status: "success".to_string(),
        message: "Docker image push event processed and deployment applied.".to_string(),
    }))
}
