//! Engine settings
//!
//! Plain-data configuration consumed by the use cases. The
//! infrastructure layer builds these from files and environment
//! variables; tests build them directly.

use consilium_domain::{
    BreakerThresholds, CircuitMode, ConfidenceAggregation, NormalizationStrength, OverrideGate,
    RetrievalLimits,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Panel execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSettings {
    /// Per-call deadline, milliseconds.
    pub timeout_ms: u64,
    /// Attempts per agent, including the first.
    pub max_attempts: u32,
    /// Exponential backoff base, milliseconds.
    pub backoff_base_ms: u64,
    /// Backoff ceiling, milliseconds.
    pub backoff_cap_ms: u64,
    /// Minimum successful opinions for the panel to count as available.
    pub min_success: usize,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_attempts: 3,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 10_000,
            min_success: 1,
        }
    }
}

impl PanelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff delay before retry `attempt` (1-based), doubling from the
    /// base and capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self
            .backoff_base_ms
            .saturating_mul(1_u64 << attempt.saturating_sub(1).min(10));
        Duration::from_millis(exp.min(self.backoff_cap_ms))
    }
}

/// Everything the task-handling pipeline needs to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    pub panel: PanelSettings,
    pub thresholds: BreakerThresholds,
    pub gate: OverrideGate,
    pub breaker_mode: CircuitMode,
    /// Deadline for one reviewer call, milliseconds.
    pub review_timeout_ms: u64,
    pub aggregation: ConfidenceAggregation,
    pub limits: RetrievalLimits,
    /// How strongly queries are normalized before cache-key hashing.
    pub normalization: NormalizationStrength,
    /// Retrieval cache capacity, in entries.
    pub cache_capacity: usize,
}

impl EngineSettings {
    pub fn review_timeout(&self) -> Duration {
        Duration::from_millis(self.review_timeout_ms)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            panel: PanelSettings::default(),
            thresholds: BreakerThresholds::default(),
            gate: OverrideGate::default(),
            // Shadow by default: the reviewer is observed before it is
            // trusted with overrides.
            breaker_mode: CircuitMode::Shadow,
            review_timeout_ms: 45_000,
            aggregation: ConfidenceAggregation::default(),
            limits: RetrievalLimits::default(),
            normalization: NormalizationStrength::default(),
            cache_capacity: 128,
        }
    }
}
