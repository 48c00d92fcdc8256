//! Timing and retry bounds for the redeploy cycle

use std::time::Duration;

/// Redeploy cycle timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeployPolicy {
    /// Pause between the bulk delete and the first targeted delete
    pub propagation_delay: Duration,

    /// Pause between existence checks while the deployment lingers
    pub poll_interval: Duration,

    /// Existence checks that may report the deployment present before giving up
    pub max_delete_attempts: u32,
}

impl RedeployPolicy {
    /// Policy with no pauses, for tests and dry runs against fakes
    pub fn immediate(max_delete_attempts: u32) -> Self {
        Self {
            propagation_delay: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_delete_attempts,
        }
    }

    /// Upper bound on time spent waiting, excluding command runtime
    pub fn max_wait(&self) -> Duration {
        self.propagation_delay + self.poll_interval * self.max_delete_attempts
    }
}

impl Default for RedeployPolicy {
    fn default() -> Self {
        Self {
            propagation_delay: Duration::from_secs(3),
            poll_interval: Duration::from_secs(3),
            max_delete_attempts: 40,
        }
    }
}
