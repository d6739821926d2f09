//! Circuit breaker for the authoritative reviewer
//!
//! Rolling health metrics over the last N reviewer calls drive automatic
//! mode transitions; the override gate decides whether a reviewer verdict
//! replaces the consensus.

pub mod gate;
pub mod state;
pub mod window;

pub use gate::{OverrideDecision, OverrideGate};
pub use state::{BreakerThresholds, CircuitMode, CircuitState, ModeTransition};
pub use window::{CostLedger, ReviewerOutcome, RollingWindow, WindowMetrics};
