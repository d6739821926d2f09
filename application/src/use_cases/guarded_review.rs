//! Guarded Review use case
//!
//! Consults the authoritative reviewer behind the circuit breaker. In
//! active mode the override gate decides whether the verdict replaces
//! the consensus; in shadow mode the verdict is recorded but never
//! applied. Reviewer failure degrades to the consensus instead of
//! failing the task.

use crate::ports::reviewer::{Reviewer, ReviewerError, ReviewerRequest, ReviewerVerdict, MAX_FACTS};
use crate::services::circuit_breaker::CircuitBreaker;
use consilium_domain::{
    AgentRole, CircuitMode, ConsensusResult, ModeTransition, OverrideDecision, OverrideGate,
    ReviewerOutcome, RoutingDecision, Task,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What came out of the review stage. `verdict` is `None` when the
/// breaker is off or the reviewer failed.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ReviewReport {
    pub mode: CircuitMode,
    pub verdict: Option<ReviewerVerdict>,
    pub decision: Option<OverrideDecision>,
    /// Breaker transition caused by this call, if any.
    pub transition: Option<ModeTransition>,
    /// True when the reviewer was wanted but unavailable.
    pub degraded: bool,
}

impl ReviewReport {
    fn skipped(mode: CircuitMode) -> Self {
        Self {
            mode,
            verdict: None,
            decision: None,
            transition: None,
            degraded: false,
        }
    }

    pub fn override_applied(&self) -> bool {
        self.decision.as_ref().is_some_and(|d| d.applied)
    }
}

/// Use case for the circuit-breaker-guarded reviewer call
pub struct GuardedReviewUseCase<R: Reviewer + 'static> {
    reviewer: Arc<R>,
    breaker: Arc<CircuitBreaker>,
    gate: OverrideGate,
    /// Deadline for one reviewer call. A hung reviewer counts as an
    /// error outcome instead of stalling the task.
    timeout: Duration,
}

impl<R: Reviewer + 'static> GuardedReviewUseCase<R> {
    pub fn new(
        reviewer: Arc<R>,
        breaker: Arc<CircuitBreaker>,
        gate: OverrideGate,
        timeout: Duration,
    ) -> Self {
        Self {
            reviewer,
            breaker,
            gate,
            timeout,
        }
    }

    /// Current breaker mode, for status and audit records.
    pub fn mode(&self) -> CircuitMode {
        self.breaker.mode()
    }

    pub async fn execute(
        &self,
        task: &Task,
        routing: &RoutingDecision,
        consensus: &ConsensusResult,
    ) -> ReviewReport {
        let mode = self.breaker.mode();
        if mode == CircuitMode::Off {
            return ReviewReport::skipped(mode);
        }

        let request = ReviewerRequest {
            task_text: task.text.clone(),
            tier: routing.tier,
            consensus_text: consensus.merged_text.clone(),
            consensus_confidence: consensus.aggregate_confidence,
            facts: fact_capsule(routing, consensus),
        };

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.reviewer.review(&request)).await
        {
            Ok(result) => result,
            Err(_) => Err(ReviewerError::Unavailable(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        };
        match outcome {
            Ok(verdict) => {
                let latency_ms = elapsed_ms(started);
                let decision = match mode {
                    CircuitMode::Active => self.gate.decide(
                        routing.tier,
                        consensus.aggregate_confidence,
                        routing.domain_count(),
                        verdict.confidence,
                    ),
                    _ => OverrideDecision {
                        applied: false,
                        reason: "shadow_mode".to_string(),
                        confidence_delta: verdict.confidence - consensus.aggregate_confidence,
                    },
                };
                info!(
                    task_id = %task.id,
                    %mode,
                    applied = decision.applied,
                    reason = %decision.reason,
                    "reviewer verdict gated",
                );

                let transition = self.breaker.record(ReviewerOutcome::new(
                    decision.applied,
                    false,
                    latency_ms,
                    verdict.cost,
                ));

                ReviewReport {
                    mode,
                    verdict: Some(verdict),
                    decision: Some(decision),
                    transition,
                    degraded: false,
                }
            }
            Err(e) => {
                let latency_ms = elapsed_ms(started);
                warn!(task_id = %task.id, "reviewer unavailable, degrading to consensus: {e}");
                let transition =
                    self.breaker
                        .record(ReviewerOutcome::new(false, true, latency_ms, 0.0));

                ReviewReport {
                    mode,
                    verdict: None,
                    decision: None,
                    transition,
                    degraded: true,
                }
            }
        }
    }
}

/// At most [`MAX_FACTS`] one-line facts giving the reviewer the
/// escalation context: why the task escalated, what the panel settled
/// on, and which domains matched.
fn fact_capsule(routing: &RoutingDecision, consensus: &ConsensusResult) -> Vec<String> {
    let mut facts = vec![format!("escalation: {}", routing.reason)];
    if !routing.critical_triggers.is_empty() {
        facts.push(format!(
            "critical triggers: {}",
            routing.critical_triggers.join(", ")
        ));
    }
    facts.push(format!(
        "consensus confidence: {:.2} from {}",
        consensus.aggregate_confidence,
        join_roles(&consensus.contributing_opinions),
    ));
    for score in &routing.domain_scores {
        let mut fired = score.strong.clone();
        fired.extend(score.weak.iter().cloned());
        facts.push(format!(
            "domain {}: score {:.2} ({})",
            score.domain,
            score.score,
            fired.join(", "),
        ));
    }
    facts.truncate(MAX_FACTS);
    facts
}

fn join_roles(roles: &[AgentRole]) -> String {
    if roles.is_empty() {
        return "no contributing roles".to_string();
    }
    roles
        .iter()
        .map(AgentRole::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
