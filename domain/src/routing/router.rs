//! The smart router
//!
//! Classifies task text into domain scores and decides the escalation
//! tier. Pure and deterministic: identical text always yields identical
//! scores, tier, and breakdown.
//!
//! Tier rules, evaluated in order:
//! 1. any critical trigger -> CRITICAL, escalate
//! 2. >= 3 domains and confidence >= 0.7 -> CRITICAL, escalate
//! 3. >= 3 domains and confidence < 0.7 -> STANDARD, downgraded
//! 4. exactly 2 domains -> STANDARD
//! 5. otherwise -> FAST

use super::decision::{DomainScore, RoutingDecision, Tier};
use super::triggers::{TriggerMatches, TriggerTable};
use crate::consensus::opinion::AgentRole;
use serde::{Deserialize, Serialize};

/// Aggregation of matched-domain scores into one confidence figure.
///
/// The exact formula was stated inconsistently in the source notes, so it
/// is pluggable; `Mean` is the documented default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceAggregation {
    #[default]
    Mean,
    /// Most-confident domain wins; useful when one strong signal should
    /// not be diluted by weak co-matches.
    Max,
}

impl ConfidenceAggregation {
    fn aggregate(&self, scores: &[DomainScore]) -> f64 {
        if scores.is_empty() {
            return 1.0; // unambiguous task, nothing matched
        }
        match self {
            ConfidenceAggregation::Mean => {
                scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
            }
            ConfidenceAggregation::Max => scores
                .iter()
                .map(|s| s.score)
                .fold(0.0_f64, f64::max),
        }
    }
}

/// Router configuration plus the trigger table.
#[derive(Debug, Clone)]
pub struct SmartRouter {
    table: TriggerTable,
    aggregation: ConfidenceAggregation,
    /// Domains scoring at or below this are not counted as matched.
    score_floor: f64,
}

/// Confidence needed for a >= 3 domain task to escalate to CRITICAL.
const ESCALATION_CONFIDENCE: f64 = 0.7;
const MULTI_DOMAIN_COUNT: usize = 3;

impl SmartRouter {
    pub fn new(table: TriggerTable) -> Self {
        Self {
            table,
            aggregation: ConfidenceAggregation::default(),
            score_floor: 0.3,
        }
    }

    pub fn with_aggregation(mut self, aggregation: ConfidenceAggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Route a task's text.
    pub fn route(&self, text: &str) -> RoutingDecision {
        let critical_triggers = self.table.match_critical(text);
        if !critical_triggers.is_empty() {
            let reason = format!("critical triggers: {}", critical_triggers.join(", "));
            return RoutingDecision {
                tier: Tier::Critical,
                domain_scores: Vec::new(),
                matched_domains: Vec::new(),
                aggregate_confidence: 1.0,
                downgraded: false,
                escalate_to_reviewer: true,
                critical_triggers,
                roles: AgentRole::ALL.to_vec(),
                reason,
            };
        }

        let matched = self.table.match_domains(text);
        let domain_scores: Vec<DomainScore> = matched
            .iter()
            .map(|(domain, hits)| DomainScore {
                domain: *domain,
                score: score_matches(hits),
                strong: hits.strong.clone(),
                weak: hits.weak.clone(),
            })
            .collect();

        let matched_domains: Vec<AgentRole> = domain_scores
            .iter()
            .filter(|s| s.score > self.score_floor)
            .map(|s| s.domain)
            .collect();
        let scored: Vec<DomainScore> = domain_scores
            .iter()
            .filter(|s| matched_domains.contains(&s.domain))
            .cloned()
            .collect();
        let aggregate_confidence = self.aggregation.aggregate(&scored);
        let domain_count = matched_domains.len();

        let (tier, downgraded, escalate, reason) = if domain_count >= MULTI_DOMAIN_COUNT {
            if aggregate_confidence >= ESCALATION_CONFIDENCE {
                (
                    Tier::Critical,
                    false,
                    true,
                    format!(
                        "{domain_count} domains at confidence {aggregate_confidence:.2} -> CRITICAL"
                    ),
                )
            } else {
                (
                    Tier::Standard,
                    true,
                    false,
                    format!(
                        "{domain_count} domains but confidence {aggregate_confidence:.2} < \
                         {ESCALATION_CONFIDENCE} -> STANDARD (downgraded)"
                    ),
                )
            }
        } else if domain_count == 2 {
            (
                Tier::Standard,
                false,
                false,
                "2 domains -> STANDARD".to_string(),
            )
        } else if domain_count == 1 {
            (
                Tier::Fast,
                false,
                false,
                format!("single domain ({}) -> FAST", matched_domains[0]),
            )
        } else {
            (
                Tier::Fast,
                false,
                false,
                "no triggers -> FAST".to_string(),
            )
        };

        // Generalist always consults; matched specialists join it.
        let mut roles = vec![AgentRole::Dev];
        roles.extend(&matched_domains);

        RoutingDecision {
            tier,
            domain_scores,
            matched_domains,
            aggregate_confidence,
            downgraded,
            escalate_to_reviewer: escalate,
            critical_triggers: Vec::new(),
            roles,
            reason,
        }
    }
}

impl Default for SmartRouter {
    fn default() -> Self {
        Self::new(TriggerTable::default())
    }
}

/// Score one domain's matches: strong triggers dominate.
///
/// - any strong: 0.8 + 0.1 per strong trigger, capped at 1.0
/// - weak only: 0.4 + 0.1 per weak trigger, capped at 0.7
fn score_matches(hits: &TriggerMatches) -> f64 {
    if !hits.strong.is_empty() {
        (0.8 + 0.1 * hits.strong.len() as f64).min(1.0)
    } else {
        (0.4 + 0.1 * hits.weak.len() as f64).min(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_is_deterministic() {
        let router = SmartRouter::default();
        let text = "Fix the jwt vulnerability and add regression coverage for the migration";
        let a = router.route(text);
        let b = router.route(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_critical_trigger_short_circuits() {
        let router = SmartRouter::default();
        let decision = router.route("We have a data loss incident in production");
        assert_eq!(decision.tier, Tier::Critical);
        assert!(decision.escalate_to_reviewer);
        assert_eq!(decision.aggregate_confidence, 1.0);
        assert_eq!(decision.roles, AgentRole::ALL.to_vec());
        assert!(!decision.critical_triggers.is_empty());
    }

    #[test]
    fn test_three_strong_domains_escalate() {
        let router = SmartRouter::default();
        // Strong triggers in security, architect, qa: each domain scores 0.9.
        let decision =
            router.route("Fix the jwt vulnerability, plan the kubernetes migration, add e2e regression suite");
        assert_eq!(decision.domain_count(), 3);
        assert!(decision.aggregate_confidence >= 0.9);
        assert_eq!(decision.tier, Tier::Critical);
        assert!(decision.escalate_to_reviewer);
        assert!(!decision.downgraded);
    }

    #[test]
    fn test_three_weak_domains_downgraded() {
        let router = SmartRouter::default();
        // Weak-only matches: each domain scores 0.5, mean 0.5 < 0.7.
        let decision = router.route("check the password flow, database deploy and the test plan");
        assert_eq!(decision.domain_count(), 3);
        assert!(decision.aggregate_confidence < 0.7);
        assert_eq!(decision.tier, Tier::Standard);
        assert!(decision.downgraded);
        assert!(!decision.escalate_to_reviewer);
    }

    #[test]
    fn test_two_domains_standard() {
        let router = SmartRouter::default();
        let decision = router.route("audit the auth token and improve test coverage");
        assert_eq!(decision.domain_count(), 2);
        assert_eq!(decision.tier, Tier::Standard);
        assert!(!decision.downgraded);
    }

    #[test]
    fn test_no_domains_fast() {
        let router = SmartRouter::default();
        let decision = router.route("rename the readme");
        assert_eq!(decision.domain_count(), 0);
        assert_eq!(decision.tier, Tier::Fast);
        assert_eq!(decision.aggregate_confidence, 1.0);
        assert_eq!(decision.roles, vec![AgentRole::Dev]);
    }

    #[test]
    fn test_single_domain_fast_with_specialist() {
        let router = SmartRouter::default();
        let decision = router.route("harden the oauth callback");
        assert_eq!(decision.tier, Tier::Fast);
        assert_eq!(decision.roles, vec![AgentRole::Dev, AgentRole::Security]);
    }

    #[test]
    fn test_breakdown_reports_fired_triggers() {
        let router = SmartRouter::default();
        let decision = router.route("sql injection via the password field");
        let security = decision
            .domain_scores
            .iter()
            .find(|s| s.domain == AgentRole::Security)
            .unwrap();
        assert_eq!(security.strong, vec!["injection".to_string()]);
        assert_eq!(security.weak, vec!["password".to_string()]);
        assert!((security.score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_max_aggregation_pluggable() {
        let router = SmartRouter::default().with_aggregation(ConfidenceAggregation::Max);
        let decision = router.route("jwt vulnerability in the test mock");
        // security scores 1.0 (two strong), qa 0.6 (two weak); max wins.
        assert!((decision.aggregate_confidence - 1.0).abs() < 1e-9);
    }
}
