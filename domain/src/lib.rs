//! Domain layer for consilium
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Panel
//!
//! A panel of specialized agent roles is consulted in parallel. Each role
//! receives cached knowledge context plus the task and produces one
//! [`AgentOpinion`]. Opinions are merged into a [`ConsensusResult`].
//!
//! ## Routing
//!
//! The [`SmartRouter`] classifies task text into domain scores via a
//! declarative trigger table and decides the escalation [`Tier`]:
//!
//! - **Fast**: narrow task, generalist only
//! - **Standard**: one or two specialist domains detected
//! - **Critical**: incident-class triggers or broad high-confidence match;
//!   the authoritative reviewer is consulted
//!
//! ## Circuit breaker
//!
//! The reviewer is guarded by a rolling-window health monitor that demotes
//! it from `Active` to `Shadow` when metrics degrade and promotes it back
//! once a fresh window of calls is within every threshold.

pub mod breaker;
pub mod consensus;
pub mod core;
pub mod knowledge;
pub mod metrics;
pub mod routing;

// Re-export commonly used types
pub use breaker::{
    gate::{OverrideDecision, OverrideGate},
    state::{BreakerThresholds, CircuitMode, CircuitState, ModeTransition},
    window::{CostLedger, ReviewerOutcome, RollingWindow, WindowMetrics},
};
pub use consensus::{
    builder::{ConsensusBuilder, ConsensusResult, ConsensusUnavailable},
    opinion::{AgentOpinion, AgentRole, NEUTRAL_CONFIDENCE, extract_confidence},
};
pub use core::{
    error::DomainError,
    task::{Task, TaskId},
};
pub use knowledge::{
    corpus::{Corpus, CorpusVersion, SectionChunk, chunk_markdown},
    normalize::NormalizationStrength,
    retrieval::{RetrievalLimits, RetrievalResult, RetrievedChunk, select_chunks},
};
pub use metrics::MovingAverage;
pub use routing::{
    decision::{DomainScore, RoutingDecision, Tier},
    router::{ConfidenceAggregation, SmartRouter},
    triggers::{DomainTriggers, TriggerMatches, TriggerTable},
};
