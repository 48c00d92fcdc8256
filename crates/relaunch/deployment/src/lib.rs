//! Relaunch Deployment Engine
//!
//! Forces a Kubernetes Deployment to be recreated from a static manifest so the
//! cluster pulls a freshly pushed image.
//!
//! ## Architectural Boundaries
//!
//! - `command` owns: cluster command shapes, output capture and stderr classification
//! - `kubectl` owns: the production runner that shells out to the cluster CLI
//! - `controller` owns: the delete → wait-for-absence → apply cycle
//! - `single_flight` owns: at most one cycle per deployment target
//!
//! ## Key Principle
//!
//! The controller talks to the cluster only through [`CommandRunner`]. Tests
//! substitute scripted runners; production uses [`KubectlRunner`].
//!
//! ## Usage
//!
//! ```no_run
//! use relaunch_deployment::{DeploymentTarget, KubectlRunner, RedeployController, RedeployPolicy};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = Arc::new(KubectlRunner::new("kubectl"));
//! let controller = RedeployController::new(
//!     runner,
//!     DeploymentTarget::new("cicd-demo-deployment", "self-hosted"),
//!     RedeployPolicy::default(),
//! );
//!
//! let report = controller.redeploy(Path::new("cicd-demo.yaml")).await?;
//! println!("applied after {} delete attempt(s)", report.delete_attempts);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod command;
pub mod controller;
pub mod error;
pub mod kubectl;
pub mod policy;
pub mod single_flight;

// Re-exports
pub use command::{
    classify_stderr_line, ClusterCommand, CommandOutput, CommandRunner, DeploymentTarget,
    OutputLine, OutputSeverity, OutputStream,
};
pub use controller::{RedeployController, RedeployReport};
pub use error::{DeploymentError, Result};
pub use kubectl::KubectlRunner;
pub use policy::RedeployPolicy;
pub use single_flight::{FlightGuard, SingleFlight};
