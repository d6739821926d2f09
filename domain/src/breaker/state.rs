//! Circuit state machine
//!
//! Three modes guard the authoritative reviewer:
//!
//! - `Off`: reviewer never called; set only by external configuration
//! - `Shadow`: reviewer called and recorded, never changes output
//! - `Active`: reviewer verdicts may replace the consensus
//!
//! `Active -> Shadow` happens when any rolling threshold is violated;
//! `Shadow -> Active` happens automatically once a fresh window of calls
//! recorded since the demotion is back within every threshold. The
//! breaker never self-transitions into or out of `Off`. Windows are
//! cleared on every transition so a new mode starts from a clean slate
//! instead of flapping on stale outcomes.

use super::window::{CostLedger, ReviewerOutcome, RollingWindow, WindowMetrics};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Reviewer guard mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircuitMode {
    Off,
    Shadow,
    Active,
}

impl std::fmt::Display for CircuitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitMode::Off => write!(f, "off"),
            CircuitMode::Shadow => write!(f, "shadow"),
            CircuitMode::Active => write!(f, "active"),
        }
    }
}

impl FromStr for CircuitMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(CircuitMode::Off),
            "shadow" => Ok(CircuitMode::Shadow),
            "active" => Ok(CircuitMode::Active),
            other => Err(DomainError::UnknownCircuitMode(other.to_string())),
        }
    }
}

/// Thresholds driving automatic transitions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakerThresholds {
    /// Rolling window capacity (last N calls).
    pub window: usize,
    /// Minimum recorded calls before demotion is considered.
    pub min_samples: usize,
    /// Fresh in-threshold calls required for `Shadow -> Active`.
    pub recovery_calls: usize,
    pub max_override_rate: f64,
    pub max_error_rate: f64,
    pub max_mean_latency_ms: f64,
    /// Trailing 24h reviewer spend budget, in account currency.
    pub daily_cost_budget: f64,
}

impl Default for BreakerThresholds {
    fn default() -> Self {
        Self {
            window: 20,
            min_samples: 5,
            recovery_calls: 10,
            max_override_rate: 0.75,
            max_error_rate: 0.10,
            max_mean_latency_ms: 6_000.0,
            daily_cost_budget: 0.01,
        }
    }
}

/// A mode change produced by recording an outcome, with the specific
/// violated (or recovered) thresholds named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeTransition {
    pub from: CircuitMode,
    pub to: CircuitMode,
    pub reason: String,
}

/// Process-wide circuit state. Survives across tasks; mutated only
/// through [`CircuitState::record`] and [`CircuitState::set_mode`].
#[derive(Debug, Clone)]
pub struct CircuitState {
    mode: CircuitMode,
    thresholds: BreakerThresholds,
    /// Outcomes recorded in the current mode; drives demotion.
    window: RollingWindow,
    /// Outcomes since the last demotion; drives recovery. Its capacity
    /// is `recovery_calls`, so "full and clean" means a fresh window of
    /// at least that many in-threshold calls.
    recovery: RollingWindow,
    costs: CostLedger,
    total_calls: u64,
}

impl CircuitState {
    pub fn new(mode: CircuitMode, thresholds: BreakerThresholds) -> Self {
        Self {
            mode,
            window: RollingWindow::new(thresholds.window),
            recovery: RollingWindow::new(thresholds.recovery_calls),
            costs: CostLedger::daily(),
            thresholds,
            total_calls: 0,
        }
    }

    pub fn mode(&self) -> CircuitMode {
        self.mode
    }

    pub fn thresholds(&self) -> &BreakerThresholds {
        &self.thresholds
    }

    pub fn window_metrics(&self) -> WindowMetrics {
        self.window.metrics()
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    /// Trailing 24h reviewer spend as of `now`.
    pub fn trailing_cost(&mut self, now: chrono::DateTime<chrono::Utc>) -> f64 {
        self.costs.trailing(now)
    }

    /// Externally force a mode. This is the only way in or out of `Off`.
    pub fn set_mode(&mut self, mode: CircuitMode) {
        self.mode = mode;
        self.window.clear();
        self.recovery.clear();
    }

    /// Record one reviewer call outcome and apply any automatic
    /// transition.
    pub fn record(&mut self, outcome: ReviewerOutcome) -> Option<ModeTransition> {
        self.total_calls += 1;
        self.window.record(outcome);
        self.recovery.record(outcome);
        self.costs.record(outcome.at, outcome.cost);
        let trailing_cost = self.costs.trailing(outcome.at);

        match self.mode {
            CircuitMode::Off => None,
            CircuitMode::Active => {
                if self.window.len() < self.thresholds.min_samples {
                    return None;
                }
                let violations = self.violations(&self.window.metrics(), trailing_cost);
                if violations.is_empty() {
                    return None;
                }
                self.transition(CircuitMode::Shadow, violations.join("; "))
            }
            CircuitMode::Shadow => {
                if self.recovery.len() < self.thresholds.recovery_calls {
                    return None;
                }
                let violations = self.violations(&self.recovery.metrics(), trailing_cost);
                if !violations.is_empty() {
                    return None;
                }
                let reason = format!(
                    "{} fresh calls within all thresholds",
                    self.recovery.len()
                );
                self.transition(CircuitMode::Active, reason)
            }
        }
    }

    fn transition(&mut self, to: CircuitMode, reason: String) -> Option<ModeTransition> {
        let from = self.mode;
        self.mode = to;
        self.window.clear();
        self.recovery.clear();
        Some(ModeTransition { from, to, reason })
    }

    /// Names of every threshold the given metrics violate.
    fn violations(&self, metrics: &WindowMetrics, trailing_cost: f64) -> Vec<String> {
        let t = &self.thresholds;
        let mut violations = Vec::new();

        if metrics.override_rate > t.max_override_rate {
            violations.push(format!(
                "override_rate {:.2} > {:.2}",
                metrics.override_rate, t.max_override_rate
            ));
        }
        if metrics.error_rate > t.max_error_rate {
            violations.push(format!(
                "error_rate {:.2} > {:.2}",
                metrics.error_rate, t.max_error_rate
            ));
        }
        if metrics.mean_latency_ms > t.max_mean_latency_ms {
            violations.push(format!(
                "mean_latency {:.0}ms > {:.0}ms",
                metrics.mean_latency_ms, t.max_mean_latency_ms
            ));
        }
        if trailing_cost > t.daily_cost_budget {
            violations.push(format!(
                "daily_cost {:.4} > {:.4}",
                trailing_cost, t.daily_cost_budget
            ));
        }

        violations
    }
}
