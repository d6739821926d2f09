//! Routing decision types

use crate::consensus::opinion::AgentRole;
use serde::{Deserialize, Serialize};

/// Escalation tier controlling which roles run and whether the
/// authoritative reviewer is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Fast,
    Standard,
    Critical,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Fast => write!(f, "FAST"),
            Tier::Standard => write!(f, "STANDARD"),
            Tier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Per-domain score breakdown, kept for explainability and testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: AgentRole,
    /// Capped aggregate of matched-trigger weights, in `[0.0, 1.0]`.
    pub score: f64,
    pub strong: Vec<String>,
    pub weak: Vec<String>,
}

/// Output of the smart router for one task. Fully deterministic for
/// identical input text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub tier: Tier,
    /// Per-domain breakdown, in deterministic domain order.
    pub domain_scores: Vec<DomainScore>,
    /// Domains scoring above the floor.
    pub matched_domains: Vec<AgentRole>,
    /// Mean of matched-domain scores (1.0 when nothing matched or a
    /// critical trigger fired).
    pub aggregate_confidence: f64,
    /// True when the task would have been CRITICAL on domain count but
    /// was held at STANDARD by low confidence.
    pub downgraded: bool,
    pub escalate_to_reviewer: bool,
    /// Critical triggers that fired, if any.
    pub critical_triggers: Vec<String>,
    /// Roles to consult: the generalist plus matched specialists, or the
    /// full panel on CRITICAL.
    pub roles: Vec<AgentRole>,
    /// Human-readable routing rationale for logs and error reports.
    pub reason: String,
}

impl RoutingDecision {
    pub fn domain_count(&self) -> usize {
        self.matched_domains.len()
    }
}
