//! Server setup and lifecycle management

use crate::api::{create_router, AppState};
use crate::auth::WebhookAuth;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use relaunch_deployment::{RedeployController, RedeployReport};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build the redeploy controller described by `config`
pub fn build_controller(config: &DaemonConfig) -> RedeployController {
    RedeployController::new(
        Arc::new(config.cluster.runner()),
        config.cluster.target(),
        config.redeploy.policy(),
    )
}

/// Run a single redeploy cycle without serving HTTP
pub async fn run_once(config: &DaemonConfig) -> DaemonResult<RedeployReport> {
    let controller = build_controller(config);
    let report = controller.redeploy(&config.redeploy.manifest_path).await?;
    Ok(report)
}

/// Relaunch Daemon Server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
}

impl Server {
    /// Create a new server with the given configuration
    pub fn new(config: DaemonConfig, auth: WebhookAuth) -> Self {
        let controller = Arc::new(build_controller(&config));
        let state = AppState::new(controller, auth, config.redeploy.manifest_path.clone());

        Self { config, state }
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let app = create_router(self.state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Relaunch daemon listening on {}", addr);
        tracing::info!(
            manifest = %self.config.redeploy.manifest_path.display(),
            target = %self.config.cluster.target(),
            "Redeploying on POST /webhook/docker-push"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("Relaunch daemon shutting down");

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
