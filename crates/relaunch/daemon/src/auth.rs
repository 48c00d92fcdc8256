//! Shared-secret authentication for the webhook endpoint
//!
//! Callers send the secret verbatim in the `X-Token` header. The secret is held
//! in a `SecretString` and compared in constant time.

use crate::error::{ApiError, DaemonError};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;

/// Header carrying the shared secret
pub const TOKEN_HEADER: &str = "x-token";

/// Environment variable the secret is read from
pub const SECRET_ENV: &str = "WEBHOOK_SECRET";

/// Validates webhook tokens against the configured secret
#[derive(Clone)]
pub struct WebhookAuth {
    secret: SecretString,
}

impl WebhookAuth {
    /// Build from the raw secret; unset or blank secrets are rejected
    pub fn from_secret(secret: Option<String>) -> Result<Self, DaemonError> {
        match secret {
            Some(secret) if !secret.trim().is_empty() => Ok(Self {
                secret: SecretString::from(secret),
            }),
            _ => Err(DaemonError::Config(format!(
                "Environment variable {} is required but not set. Server will not start for security reasons.",
                SECRET_ENV
            ))),
        }
    }

    /// Check a presented token
    pub fn verify(&self, token: Option<&str>) -> Result<(), ApiError> {
        let Some(token) = token else {
            tracing::warn!("Unauthorized access attempt: missing token");
            return Err(ApiError::Unauthorized);
        };

        let expected = self.secret.expose_secret().as_bytes();
        if bool::from(expected.ct_eq(token.as_bytes())) {
            Ok(())
        } else {
            tracing::warn!("Unauthorized access attempt: invalid token");
            Err(ApiError::Unauthorized)
        }
    }
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth").finish_non_exhaustive()
    }
}
