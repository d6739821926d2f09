//! Smart routing: trigger tables, domain scoring, tier policy

pub mod decision;
pub mod router;
pub mod triggers;

pub use decision::{DomainScore, RoutingDecision, Tier};
pub use router::{ConfidenceAggregation, SmartRouter};
pub use triggers::{DomainTriggers, TriggerMatches, TriggerTable};
