//! Deployment error types

use crate::command::DeploymentTarget;
use std::path::PathBuf;
use thiserror::Error;

/// Redeploy cycle errors
///
/// Every variant is fatal for the cycle that produced it. Steps that ran an
/// external command carry the captured stderr.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Manifest not found at {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Failed to delete resources from {}:\n{stderr}", path.display())]
    DeleteManifestFailed { path: PathBuf, stderr: String },

    #[error("Deployment {target} still present after {attempts} deletion attempt(s)")]
    DeletionTimeout {
        target: DeploymentTarget,
        attempts: u32,
    },

    #[error("Failed to apply the deployment from {}:\n{stderr}", path.display())]
    ApplyFailed { path: PathBuf, stderr: String },

    #[error("Redeploy already in progress for {target}")]
    InProgress { target: DeploymentTarget },
}

impl DeploymentError {
    /// Captured stderr of the failing command, if the step ran one
    pub fn stderr(&self) -> Option<&str> {
        match self {
            DeploymentError::DeleteManifestFailed { stderr, .. }
            | DeploymentError::ApplyFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Whether the error was raised before any cluster command ran
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DeploymentError::ManifestNotFound { .. } | DeploymentError::InProgress { .. }
        )
    }
}

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeploymentError>;
