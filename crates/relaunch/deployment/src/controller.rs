//! Redeploy controller
//!
//! Replaces the running deployment with the current manifest:
//!
//! ```text
//! PRECHECK -> DELETE_MANIFEST -> DELAY -> DELETE_DEPLOYMENT -> POLL_EXISTENCE -> APPLY_MANIFEST
//!                                               ^                    |
//!                                               |____ retry loop ____|
//! ```
//!
//! The poll loop is bounded by [`RedeployPolicy::max_delete_attempts`] and a
//! [`SingleFlight`] guard keeps overlapping triggers for the same target apart.

use crate::command::{ClusterCommand, CommandRunner, DeploymentTarget};
use crate::error::{DeploymentError, Result};
use crate::policy::RedeployPolicy;
use crate::single_flight::SingleFlight;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, warn};

/// Summary of a successful redeploy cycle
#[derive(Debug, Clone, Serialize)]
pub struct RedeployReport {
    pub manifest: PathBuf,
    pub target: DeploymentTarget,
    /// Targeted deletes issued before the deployment was confirmed absent
    pub delete_attempts: u32,
    /// Stdout lines of the apply command
    pub applied: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

/// Drives delete → wait-for-absence → apply for one deployment target
pub struct RedeployController {
    runner: Arc<dyn CommandRunner>,
    target: DeploymentTarget,
    policy: RedeployPolicy,
    flights: SingleFlight,
}

impl RedeployController {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        target: DeploymentTarget,
        policy: RedeployPolicy,
    ) -> Self {
        Self {
            runner,
            target,
            policy,
            flights: SingleFlight::new(),
        }
    }

    /// Share an in-flight registry with other controllers
    pub fn with_single_flight(mut self, flights: SingleFlight) -> Self {
        self.flights = flights;
        self
    }

    pub fn target(&self) -> &DeploymentTarget {
        &self.target
    }

    pub fn policy(&self) -> &RedeployPolicy {
        &self.policy
    }

    pub fn single_flight(&self) -> &SingleFlight {
        &self.flights
    }

    /// Whether a cycle for this controller's target is running
    pub fn is_in_flight(&self) -> bool {
        self.flights.is_in_flight(&self.target)
    }

    /// Run one full redeploy cycle for `manifest`
    #[instrument(skip(self, manifest), fields(target = %self.target, manifest = %manifest.display()))]
    pub async fn redeploy(&self, manifest: &Path) -> Result<RedeployReport> {
        if !manifest.is_file() {
            error!("Manifest file not found");
            return Err(DeploymentError::ManifestNotFound {
                path: manifest.to_path_buf(),
            });
        }

        let _flight = self.flights.try_acquire(&self.target).ok_or_else(|| {
            warn!("Redeploy already in progress, rejecting trigger");
            DeploymentError::InProgress {
                target: self.target.clone(),
            }
        })?;

        let started_at = Utc::now();
        let started = Instant::now();

        info!("Deleting resources defined in manifest");
        let output = self
            .runner
            .run(&ClusterCommand::DeleteManifest(manifest.to_path_buf()), true)
            .await;
        if !output.success() {
            error!(status = output.status, "Failed to delete resources from manifest");
            return Err(DeploymentError::DeleteManifestFailed {
                path: manifest.to_path_buf(),
                stderr: output.stderr,
            });
        }

        info!(
            delay_secs = self.policy.propagation_delay.as_secs_f64(),
            "Waiting for deletion to propagate"
        );
        tokio::time::sleep(self.policy.propagation_delay).await;

        self.delete_deployment().await;
        let delete_attempts = self.wait_for_absence().await?;

        info!(
            delete_attempts,
            "Deployment deleted successfully, proceeding with apply"
        );
        let output = self
            .runner
            .run(&ClusterCommand::ApplyManifest(manifest.to_path_buf()), true)
            .await;
        if !output.success() {
            error!(status = output.status, "Failed to apply the deployment");
            return Err(DeploymentError::ApplyFailed {
                path: manifest.to_path_buf(),
                stderr: output.stderr,
            });
        }

        let applied: Vec<String> = output.stdout_lines().map(str::to_owned).collect();
        let elapsed = started.elapsed();

        info!(
            resources = applied.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Deployment applied successfully"
        );

        Ok(RedeployReport {
            manifest: manifest.to_path_buf(),
            target: self.target.clone(),
            delete_attempts,
            applied,
            started_at,
            elapsed,
        })
    }

    /// Delete the target deployment; already gone counts as success
    async fn delete_deployment(&self) {
        let output = self
            .runner
            .run(&ClusterCommand::DeleteDeployment(self.target.clone()), true)
            .await;
        if !output.success() && !output.reports_not_found() {
            warn!(status = output.status, "Targeted deployment delete failed");
        }
    }

    async fn deployment_exists(&self) -> bool {
        self.runner
            .run(&ClusterCommand::GetDeployment(self.target.clone()), false)
            .await
            .success()
    }

    /// Poll until the deployment is gone, re-issuing the delete between checks.
    /// Returns the number of targeted deletes issued.
    async fn wait_for_absence(&self) -> Result<u32> {
        let max_checks = self.policy.max_delete_attempts.max(1);
        let mut attempts = 1;
        let mut present_checks = 0;

        while self.deployment_exists().await {
            present_checks += 1;
            if present_checks >= max_checks {
                error!(attempts, "Deployment still present, giving up");
                return Err(DeploymentError::DeletionTimeout {
                    target: self.target.clone(),
                    attempts,
                });
            }

            info!(
                interval_secs = self.policy.poll_interval.as_secs_f64(),
                "Deployment still exists, waiting before retrying deletion"
            );
            tokio::time::sleep(self.policy.poll_interval).await;
            self.delete_deployment().await;
            attempts += 1;
        }

        Ok(attempts)
    }
}
