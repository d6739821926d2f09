//! Rolling outcome window and trailing cost ledger
//!
//! Both structures maintain running sums incrementally; recording an
//! outcome never rescans the window.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Outcome of a single reviewer call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewerOutcome {
    pub at: DateTime<Utc>,
    pub override_applied: bool,
    pub error: bool,
    pub latency_ms: u64,
    pub cost: f64,
}

impl ReviewerOutcome {
    pub fn new(override_applied: bool, error: bool, latency_ms: u64, cost: f64) -> Self {
        Self {
            at: Utc::now(),
            override_applied,
            error,
            latency_ms,
            cost,
        }
    }
}

/// Aggregate metrics over a window of outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub calls: usize,
    pub override_rate: f64,
    pub error_rate: f64,
    pub mean_latency_ms: f64,
}

/// Fixed-capacity ring of the last N reviewer outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    capacity: usize,
    outcomes: VecDeque<ReviewerOutcome>,
    override_count: usize,
    error_count: usize,
    latency_sum_ms: u64,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be non-zero");
        Self {
            capacity,
            outcomes: VecDeque::with_capacity(capacity),
            override_count: 0,
            error_count: 0,
            latency_sum_ms: 0,
        }
    }

    pub fn record(&mut self, outcome: ReviewerOutcome) {
        if self.outcomes.len() == self.capacity
            && let Some(evicted) = self.outcomes.pop_front()
        {
            if evicted.override_applied {
                self.override_count -= 1;
            }
            if evicted.error {
                self.error_count -= 1;
            }
            self.latency_sum_ms -= evicted.latency_ms;
        }

        if outcome.override_applied {
            self.override_count += 1;
        }
        if outcome.error {
            self.error_count += 1;
        }
        self.latency_sum_ms += outcome.latency_ms;
        self.outcomes.push_back(outcome);
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn clear(&mut self) {
        self.outcomes.clear();
        self.override_count = 0;
        self.error_count = 0;
        self.latency_sum_ms = 0;
    }

    pub fn metrics(&self) -> WindowMetrics {
        let calls = self.outcomes.len();
        if calls == 0 {
            return WindowMetrics::default();
        }
        WindowMetrics {
            calls,
            override_rate: self.override_count as f64 / calls as f64,
            error_rate: self.error_count as f64 / calls as f64,
            mean_latency_ms: self.latency_sum_ms as f64 / calls as f64,
        }
    }
}

/// Trailing-horizon cost ledger (default horizon: 24 hours).
///
/// Entries older than the horizon are evicted lazily on access; the sum
/// is maintained incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostLedger {
    horizon: TimeDelta,
    entries: VecDeque<(DateTime<Utc>, f64)>,
    sum: f64,
}

impl CostLedger {
    pub fn new(horizon: TimeDelta) -> Self {
        Self {
            horizon,
            entries: VecDeque::new(),
            sum: 0.0,
        }
    }

    pub fn daily() -> Self {
        Self::new(TimeDelta::hours(24))
    }

    pub fn record(&mut self, at: DateTime<Utc>, cost: f64) {
        self.evict_before(at - self.horizon);
        self.entries.push_back((at, cost));
        self.sum += cost;
    }

    /// Total cost inside the trailing horizon ending at `now`.
    pub fn trailing(&mut self, now: DateTime<Utc>) -> f64 {
        self.evict_before(now - self.horizon);
        self.sum
    }

    fn evict_before(&mut self, cutoff: DateTime<Utc>) {
        while let Some((at, cost)) = self.entries.front().copied() {
            if at >= cutoff {
                break;
            }
            self.sum -= cost;
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(override_applied: bool, error: bool, latency_ms: u64) -> ReviewerOutcome {
        ReviewerOutcome::new(override_applied, error, latency_ms, 0.001)
    }

    #[test]
    fn test_metrics_over_partial_window() {
        let mut window = RollingWindow::new(20);
        window.record(outcome(true, false, 1000));
        window.record(outcome(false, true, 3000));

        let m = window.metrics();
        assert_eq!(m.calls, 2);
        assert_eq!(m.override_rate, 0.5);
        assert_eq!(m.error_rate, 0.5);
        assert_eq!(m.mean_latency_ms, 2000.0);
    }

    #[test]
    fn test_eviction_keeps_running_sums_consistent() {
        let mut window = RollingWindow::new(2);
        window.record(outcome(true, true, 9000));
        window.record(outcome(false, false, 100));
        window.record(outcome(false, false, 100));

        let m = window.metrics();
        assert_eq!(m.calls, 2);
        assert_eq!(m.override_rate, 0.0);
        assert_eq!(m.error_rate, 0.0);
        assert_eq!(m.mean_latency_ms, 100.0);
    }

    #[test]
    fn test_empty_window_metrics() {
        assert_eq!(RollingWindow::new(5).metrics(), WindowMetrics::default());
    }

    #[test]
    fn test_cost_ledger_trailing_window() {
        let mut ledger = CostLedger::daily();
        let now = Utc::now();

        ledger.record(now - TimeDelta::hours(30), 5.0);
        ledger.record(now - TimeDelta::hours(2), 0.01);
        ledger.record(now, 0.02);

        let trailing = ledger.trailing(now);
        assert!((trailing - 0.03).abs() < 1e-9, "stale cost must be evicted");
    }
}
