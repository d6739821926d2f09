//! Handle Task use case
//!
//! The single entry point of the engine: route the task, consult the
//! panel, merge a consensus, and run the guarded reviewer when routing
//! escalates. Every stage leaves an audit record.

use crate::ports::audit_sink::{AuditEvent, AuditSink};
use crate::ports::model_gateway::ModelGateway;
use crate::ports::reviewer::Reviewer;
use crate::use_cases::consult_panel::{ConsultPanelUseCase, PanelError};
use crate::use_cases::guarded_review::{GuardedReviewUseCase, ReviewReport};
use consilium_domain::{
    AgentOpinion, ConsensusBuilder, ConsensusUnavailable, DomainError, RoutingDecision,
    SmartRouter, Task, TaskId, Tier,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that end a task without a result. Both variants carry what the
/// pipeline had produced so far, for diagnostics and audit.
#[derive(Error, Debug)]
pub enum HandleTaskError {
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("panel unavailable for {tier} task: {source}", tier = .routing.tier)]
    Panel {
        routing: Box<RoutingDecision>,
        #[source]
        source: PanelError,
    },

    #[error("no usable consensus: {source}")]
    Consensus {
        routing: Box<RoutingDecision>,
        opinions: Vec<AgentOpinion>,
        #[source]
        source: ConsensusUnavailable,
    },
}

/// Decision trail kept alongside the final answer.
#[derive(Debug, Clone, Serialize)]
pub struct TaskTrace {
    pub routing: RoutingDecision,
    pub opinions: Vec<AgentOpinion>,
    pub consensus_confidence: f64,
    /// Present when the reviewer stage ran.
    pub review: Option<ReviewReport>,
}

/// The engine's answer for one task.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResult {
    pub task_id: TaskId,
    pub text: String,
    pub confidence: f64,
    pub tier: Tier,
    pub override_applied: bool,
    pub trace: TaskTrace,
}

/// Use case wiring the whole pipeline together
pub struct HandleTaskUseCase<G: ModelGateway + 'static, R: Reviewer + 'static> {
    router: SmartRouter,
    panel: ConsultPanelUseCase<G>,
    consensus: ConsensusBuilder,
    review: GuardedReviewUseCase<R>,
    audit: Arc<dyn AuditSink>,
}

impl<G: ModelGateway + 'static, R: Reviewer + 'static> HandleTaskUseCase<G, R> {
    pub fn new(
        router: SmartRouter,
        panel: ConsultPanelUseCase<G>,
        review: GuardedReviewUseCase<R>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            router,
            panel,
            consensus: ConsensusBuilder::new(),
            review,
            audit,
        }
    }

    /// Handle one task from raw text to final answer.
    pub async fn execute(&self, task_text: &str) -> Result<FinalResult, HandleTaskError> {
        let task = Task::new(task_text)?;
        info!(task_id = %task.id, "task received: {}", task.summary());

        let routing = self.router.route(&task.text);
        self.audit.record(AuditEvent::new(
            "task_routed",
            json!({
                "task_id": task.id,
                "tier": routing.tier,
                "roles": routing.roles,
                "reason": routing.reason,
                "downgraded": routing.downgraded,
            }),
        ));

        let report = match self.panel.execute(&task, &routing.roles).await {
            Ok(report) => report,
            Err(source) => {
                self.audit.record(AuditEvent::new(
                    "panel_unavailable",
                    json!({ "task_id": task.id, "error": source.to_string() }),
                ));
                return Err(HandleTaskError::Panel {
                    routing: Box::new(routing),
                    source,
                });
            }
        };

        let consensus = match self.consensus.build(&report.opinions) {
            Ok(consensus) => consensus,
            Err(source) => {
                self.audit.record(AuditEvent::new(
                    "consensus_unavailable",
                    json!({ "task_id": task.id, "attempted": source.attempted }),
                ));
                return Err(HandleTaskError::Consensus {
                    routing: Box::new(routing),
                    opinions: report.opinions,
                    source,
                });
            }
        };

        let review = if routing.escalate_to_reviewer {
            Some(self.review.execute(&task, &routing, &consensus).await)
        } else {
            None
        };
        if let Some(review) = &review {
            self.audit_review(&task.id, review);
        }

        let override_applied = review.as_ref().is_some_and(ReviewReport::override_applied);
        let (text, confidence) = match (&review, override_applied) {
            (Some(r), true) => {
                let verdict = r
                    .verdict
                    .as_ref()
                    .map(|v| (v.decision.clone(), v.confidence));
                verdict.unwrap_or((consensus.merged_text.clone(), consensus.aggregate_confidence))
            }
            _ => (consensus.merged_text.clone(), consensus.aggregate_confidence),
        };

        self.audit.record(AuditEvent::new(
            "task_completed",
            json!({
                "task_id": task.id,
                "submitted_at": task.submitted_at,
                "routing": {
                    "tier": routing.tier,
                    "reason": routing.reason,
                    "matched_domains": routing.matched_domains,
                    "downgraded": routing.downgraded,
                    "critical_triggers": routing.critical_triggers,
                },
                "opinions": report
                    .opinions
                    .iter()
                    .map(|o| json!({
                        "role": o.role,
                        "confidence": o.confidence,
                        "latency_ms": o.latency_ms,
                        "error": o.error,
                    }))
                    .collect::<Vec<_>>(),
                "consensus": {
                    "confidence": consensus.aggregate_confidence,
                    "contributing": consensus.contributing_opinions,
                },
                "review": review.as_ref().map(|r| json!({
                    "degraded": r.degraded,
                    "verdict_confidence": r.verdict.as_ref().map(|v| v.confidence),
                    "cost": r.verdict.as_ref().map(|v| v.cost),
                    "override": r.decision,
                })),
                "circuit_mode": self.review.mode(),
                "confidence": confidence,
                "override_applied": override_applied,
            }),
        ));

        Ok(FinalResult {
            task_id: task.id,
            text,
            confidence,
            tier: routing.tier,
            override_applied,
            trace: TaskTrace {
                routing,
                opinions: report.opinions,
                consensus_confidence: consensus.aggregate_confidence,
                review,
            },
        })
    }

    fn audit_review(&self, task_id: &TaskId, review: &ReviewReport) {
        if review.degraded {
            self.audit.record(AuditEvent::new(
                "reviewer_unavailable",
                json!({ "task_id": task_id }),
            ));
        } else if let Some(decision) = &review.decision {
            self.audit.record(AuditEvent::new(
                if decision.applied {
                    "override_applied"
                } else {
                    "override_withheld"
                },
                json!({
                    "task_id": task_id,
                    "mode": review.mode,
                    "reason": decision.reason,
                    "confidence_delta": decision.confidence_delta,
                }),
            ));
        }
        if let Some(transition) = &review.transition {
            self.audit.record(AuditEvent::new(
                "breaker_transition",
                json!({
                    "task_id": task_id,
                    "from": transition.from,
                    "to": transition.to,
                    "reason": transition.reason,
                }),
            ));
        }
    }
}
