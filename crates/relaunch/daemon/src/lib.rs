//! Relaunch Daemon library
//!
//! This module provides the components for the relaunch daemon:
//! - Webhook endpoint that triggers a redeploy on image push
//! - Shared-secret authentication
//! - Layered configuration
//! - Server lifecycle management

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;

pub use auth::WebhookAuth;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::{run_once, Server};
