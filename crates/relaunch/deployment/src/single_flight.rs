//! At most one redeploy cycle per deployment target

use crate::command::DeploymentTarget;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Tracks in-flight redeploy cycles, keyed by target
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    inflight: Arc<DashMap<DeploymentTarget, DateTime<Utc>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the target, or `None` if a cycle already holds it
    pub fn try_acquire(&self, target: &DeploymentTarget) -> Option<FlightGuard> {
        match self.inflight.entry(target.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(Utc::now());
                Some(FlightGuard {
                    inflight: Arc::clone(&self.inflight),
                    target: target.clone(),
                })
            }
        }
    }

    pub fn is_in_flight(&self, target: &DeploymentTarget) -> bool {
        self.inflight.contains_key(target)
    }

    /// When the current cycle for `target` started
    pub fn started_at(&self, target: &DeploymentTarget) -> Option<DateTime<Utc>> {
        self.inflight.get(target).map(|entry| *entry.value())
    }

    /// Number of cycles currently running
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

/// Releases the target when dropped
#[derive(Debug)]
pub struct FlightGuard {
    inflight: Arc<DashMap<DeploymentTarget, DateTime<Utc>>>,
    target: DeploymentTarget,
}

impl FlightGuard {
    pub fn target(&self) -> &DeploymentTarget {
        &self.target
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.inflight.remove(&self.target);
    }
}
