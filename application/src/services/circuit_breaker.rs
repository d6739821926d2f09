//! Circuit breaker service
//!
//! Thread-safe wrapper around the domain circuit state. One instance
//! guards the reviewer for the whole process; transitions are logged and
//! surfaced to the audit trail by the caller.

use consilium_domain::{
    BreakerThresholds, CircuitMode, CircuitState, ModeTransition, ReviewerOutcome, WindowMetrics,
};
use std::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

pub struct CircuitBreaker {
    state: Mutex<CircuitState>,
}

impl CircuitBreaker {
    pub fn new(mode: CircuitMode, thresholds: BreakerThresholds) -> Self {
        Self {
            state: Mutex::new(CircuitState::new(mode, thresholds)),
        }
    }

    pub fn mode(&self) -> CircuitMode {
        self.lock().mode()
    }

    pub fn window_metrics(&self) -> WindowMetrics {
        self.lock().window_metrics()
    }

    pub fn total_calls(&self) -> u64 {
        self.lock().total_calls()
    }

    /// Force a mode externally (the only way in or out of `Off`).
    pub fn set_mode(&self, mode: CircuitMode) {
        info!(%mode, "circuit mode set externally");
        self.lock().set_mode(mode);
    }

    /// Record one reviewer outcome, logging any automatic transition.
    pub fn record(&self, outcome: ReviewerOutcome) -> Option<ModeTransition> {
        let transition = self.lock().record(outcome)?;
        match transition.to {
            CircuitMode::Shadow => warn!(
                from = %transition.from,
                reason = %transition.reason,
                "reviewer demoted to shadow",
            ),
            CircuitMode::Active => info!(
                reason = %transition.reason,
                "reviewer recovered to active",
            ),
            CircuitMode::Off => {}
        }
        Some(transition)
    }

    fn lock(&self) -> MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
