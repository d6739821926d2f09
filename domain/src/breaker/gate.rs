//! Override gate
//!
//! Decides whether an authoritative reviewer verdict replaces the panel
//! consensus. Hard conditions fire on their own; the soft condition only
//! fires when the task spans many domains and the reviewer meaningfully
//! disagrees upward.

use crate::routing::decision::Tier;
use serde::{Deserialize, Serialize};

/// Gate outcome attached to the final result and the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDecision {
    pub applied: bool,
    /// Which condition fired, or why the gate held.
    pub reason: String,
    /// Reviewer confidence minus consensus confidence.
    pub confidence_delta: f64,
}

/// Conditions under which the reviewer verdict replaces the consensus.
///
/// Override iff any of:
/// - tier is CRITICAL
/// - consensus confidence is below the floor
/// - at least `multi_domain` domains matched and the reviewer is more
///   confident than the consensus by at least `min_delta`
///
/// Otherwise the verdict is recorded for audit only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverrideGate {
    pub confidence_floor: f64,
    pub min_delta: f64,
    pub multi_domain: usize,
}

impl Default for OverrideGate {
    fn default() -> Self {
        Self {
            confidence_floor: 0.7,
            min_delta: 0.10,
            multi_domain: 3,
        }
    }
}

impl OverrideGate {
    pub fn decide(
        &self,
        tier: Tier,
        consensus_confidence: f64,
        matched_domains: usize,
        reviewer_confidence: f64,
    ) -> OverrideDecision {
        let delta = reviewer_confidence - consensus_confidence;

        if tier == Tier::Critical {
            return OverrideDecision {
                applied: true,
                reason: "critical_tier".to_string(),
                confidence_delta: delta,
            };
        }
        if consensus_confidence < self.confidence_floor {
            return OverrideDecision {
                applied: true,
                reason: format!("low_conf({consensus_confidence:.2})"),
                confidence_delta: delta,
            };
        }
        if matched_domains >= self.multi_domain && delta >= self.min_delta {
            return OverrideDecision {
                applied: true,
                reason: format!("multi_domain({matched_domains}) + diff={delta:+.2}"),
                confidence_delta: delta,
            };
        }

        OverrideDecision {
            applied: false,
            reason: format!(
                "gate_denied (conf={consensus_confidence:.2}, domains={matched_domains}, diff={delta:+.2})"
            ),
            confidence_delta: delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Low consensus confidence is a hard condition: it overrides no
    /// matter how few domains matched or how small the delta.
    #[test]
    fn test_low_confidence_always_overrides() {
        let gate = OverrideGate::default();
        for domains in 0..4 {
            let decision = gate.decide(Tier::Standard, 0.65, domains, 0.66);
            assert!(decision.applied, "domains={domains}");
            assert!(decision.reason.contains("low_conf"));
        }
    }

    #[test]
    fn test_critical_tier_always_overrides() {
        let gate = OverrideGate::default();
        let decision = gate.decide(Tier::Critical, 0.95, 0, 0.5);
        assert!(decision.applied);
        assert_eq!(decision.reason, "critical_tier");
    }

    /// Confident consensus, few domains, small delta: the gate holds.
    #[test]
    fn test_confident_consensus_never_overridden() {
        let gate = OverrideGate::default();
        let decision = gate.decide(Tier::Standard, 0.9, 2, 0.95);
        assert!(!decision.applied);
        assert!(decision.reason.contains("gate_denied"));
    }

    #[test]
    fn test_multi_domain_disagreement_overrides() {
        let gate = OverrideGate::default();
        let decision = gate.decide(Tier::Standard, 0.75, 3, 0.90);
        assert!(decision.applied);
        assert!(decision.reason.contains("multi_domain(3)"));
        assert!((decision.confidence_delta - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_multi_domain_small_delta_holds() {
        let gate = OverrideGate::default();
        let decision = gate.decide(Tier::Standard, 0.8, 3, 0.85);
        assert!(!decision.applied);
    }

    /// Reviewer being *less* confident never triggers the soft condition.
    #[test]
    fn test_downward_disagreement_holds() {
        let gate = OverrideGate::default();
        let decision = gate.decide(Tier::Standard, 0.9, 4, 0.7);
        assert!(!decision.applied);
        assert!(decision.confidence_delta < 0.0);
    }
}
