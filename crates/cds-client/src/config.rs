//! Discovery configuration

use cds_core::constants::BATCH_SIZE;
use serde::{Deserialize, Serialize};

/// Tunables for one [`ContactDiscovery`](crate::ContactDiscovery) instance.
///
/// Lifetime and concurrency are explicit constructor inputs rather than
/// ambient process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum identifiers per batch (both protocols)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Concurrency bound for legacy batch tasks
    #[serde(default = "default_concurrency")]
    pub legacy_concurrency: usize,
    /// Attempt limit per batch task; only retryable errors consume extra
    /// attempts
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_batch_size() -> usize {
    BATCH_SIZE
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

impl DiscoveryConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_legacy_concurrency(mut self, concurrency: usize) -> Self {
        self.legacy_concurrency = concurrency;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            legacy_concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
        }
    }
}
