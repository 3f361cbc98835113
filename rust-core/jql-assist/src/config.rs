// SPDX-License-Identifier: PMPL-1.0-or-later
//! Engine configuration.
//!
//! Defaults:
//! - simulated fetch latency: uniformly 500 to 1500 ms
//! - blur grace before the candidate list closes: 150 ms
//! - at most 50 visible candidates

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AssistError;

/// Tunables for the fetcher, the session and the candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistConfig {
    /// Lower bound of the simulated fetch delay (milliseconds).
    pub fetch_latency_min_ms: u64,
    /// Upper bound of the simulated fetch delay (milliseconds).
    pub fetch_latency_max_ms: u64,
    /// How long a blur waits for a pointer selection on the list to land.
    pub blur_grace_ms: u64,
    /// Cap on candidates kept after filtering. 0 means unlimited.
    pub max_visible_candidates: usize,
}

impl AssistConfig {
    /// Configuration with no simulated latency, for tests and offline hosts.
    pub fn offline() -> Self {
        Self {
            fetch_latency_min_ms: 0,
            fetch_latency_max_ms: 0,
            ..Self::default()
        }
    }

    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AssistError> {
        let raw = std::fs::read_to_string(path)?;
        let config: AssistConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AssistError> {
        if self.fetch_latency_min_ms > self.fetch_latency_max_ms {
            warn!(
                min = self.fetch_latency_min_ms,
                max = self.fetch_latency_max_ms,
                "Rejecting configuration with inverted latency range"
            );
            return Err(AssistError::InvalidConfig(format!(
                "fetch_latency_min_ms ({}) exceeds fetch_latency_max_ms ({})",
                self.fetch_latency_min_ms, self.fetch_latency_max_ms
            )));
        }
        Ok(())
    }

    pub fn blur_grace(&self) -> Duration {
        Duration::from_millis(self.blur_grace_ms)
    }
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            fetch_latency_min_ms: 500,
            fetch_latency_max_ms: 1500,
            blur_grace_ms: 150,
            max_visible_candidates: 50,
        }
    }
}
