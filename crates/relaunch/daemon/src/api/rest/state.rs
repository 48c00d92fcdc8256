//! Application state for API handlers

use crate::auth::WebhookAuth;
use chrono::{DateTime, Utc};
use relaunch_deployment::{RedeployController, RedeployReport};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Outcome of the most recent redeploy cycle
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LastRedeploy {
    Succeeded {
        finished_at: DateTime<Utc>,
        delete_attempts: u32,
        elapsed_ms: u64,
    },
    Failed {
        finished_at: DateTime<Utc>,
    },
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Redeploy controller for the configured target
    pub controller: Arc<RedeployController>,

    /// Webhook token validator
    pub auth: WebhookAuth,

    /// Manifest re-applied on every push
    pub manifest_path: PathBuf,

    /// Most recent cycle outcome
    pub last_redeploy: Arc<RwLock<Option<LastRedeploy>>>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        controller: Arc<RedeployController>,
        auth: WebhookAuth,
        manifest_path: PathBuf,
    ) -> Self {
        Self {
            controller,
            auth,
            manifest_path,
            last_redeploy: Arc::new(RwLock::new(None)),
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// Remember the outcome of a finished cycle; rejected triggers are not recorded
    pub async fn record(&self, result: &relaunch_deployment::Result<RedeployReport>) {
        let outcome = match result {
            Ok(report) => LastRedeploy::Succeeded {
                finished_at: Utc::now(),
                delete_attempts: report.delete_attempts,
                elapsed_ms: report.elapsed.as_millis() as u64,
            },
            Err(relaunch_deployment::DeploymentError::InProgress { .. }) => return,
            Err(_) => LastRedeploy::Failed {
                finished_at: Utc::now(),
            },
        };
        *self.last_redeploy.write().await = Some(outcome);
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
