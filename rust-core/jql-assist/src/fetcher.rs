// SPDX-License-Identifier: PMPL-1.0-or-later
//! Asynchronous value lookup for API-backed fields.
//!
//! [`ValueFetcher`] is the suspension point of the engine: it is the only
//! call that awaits. [`SimulatedValueFetcher`] stands in for a remote
//! service by sleeping for a uniformly random delay before filtering its
//! own value tables.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::catalog::ValueEntry;
use crate::config::AssistConfig;
use crate::error::AssistError;
use crate::Candidate;

/// A source of value candidates that must be awaited.
///
/// Implementations must be safe to share across tokio tasks.
#[async_trait]
pub trait ValueFetcher: Send + Sync {
    /// Values of `field` whose display text or description contains
    /// `query`, case-insensitively. An empty query returns every value.
    ///
    /// Fails with [`AssistError::NotApiBacked`] for fields it does not serve.
    async fn fetch_values(&self, field: &str, query: &str) -> Result<Vec<Candidate>, AssistError>;

    /// A human-readable name for logging.
    fn name(&self) -> &str;
}

/// Remote tables served by the simulated service.
pub fn default_remote_values() -> HashMap<String, Vec<ValueEntry>> {
    let mut remote = HashMap::new();
    remote.insert(
        "status".to_string(),
        vec![
            ValueEntry::new("Open", "Issue is open"),
            ValueEntry::new("In Progress", "Issue is being worked on"),
            ValueEntry::new("Review", "Issue is under review"),
            ValueEntry::new("Testing", "Issue is being tested"),
            ValueEntry::new("Closed", "Issue is closed"),
            ValueEntry::new("Done", "Issue is completed"),
        ],
    );
    remote.insert(
        "priority".to_string(),
        vec![
            ValueEntry::new("Highest", "Highest priority"),
            ValueEntry::new("High", "High priority"),
            ValueEntry::new("Medium", "Medium priority"),
            ValueEntry::new("Low", "Low priority"),
            ValueEntry::new("Lowest", "Lowest priority"),
        ],
    );
    remote
}

/// In-process stand-in for a value-lookup service with network latency.
pub struct SimulatedValueFetcher {
    remote: HashMap<String, Vec<ValueEntry>>,
    min_delay_ms: u64,
    max_delay_ms: u64,
}

impl SimulatedValueFetcher {
    /// Serve `remote` with a delay drawn uniformly from `min..=max` ms.
    pub fn new(remote: HashMap<String, Vec<ValueEntry>>, min_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            remote,
            min_delay_ms: min_delay_ms.min(max_delay_ms),
            max_delay_ms,
        }
    }

    pub fn from_config(config: &AssistConfig) -> Self {
        Self::new(
            default_remote_values(),
            config.fetch_latency_min_ms,
            config.fetch_latency_max_ms,
        )
    }

    pub fn with_defaults() -> Self {
        Self::from_config(&AssistConfig::default())
    }

    fn sample_delay(&self) -> Duration {
        Duration::from_millis(fastrand::u64(self.min_delay_ms..=self.max_delay_ms))
    }
}

#[async_trait]
impl ValueFetcher for SimulatedValueFetcher {
    async fn fetch_values(&self, field: &str, query: &str) -> Result<Vec<Candidate>, AssistError> {
        let values = self
            .remote
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(field))
            .map(|(_, values)| values)
            .ok_or_else(|| AssistError::NotApiBacked(field.to_string()))?;

        let delay = self.sample_delay();
        debug!(field, query, delay_ms = delay.as_millis() as u64, "Simulating value fetch");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(values
            .iter()
            .filter(|v| query.is_empty() || v.matches(query))
            .map(ValueEntry::to_candidate)
            .collect())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
