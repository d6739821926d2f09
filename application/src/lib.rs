//! Application layer for consilium
//!
//! This crate contains the orchestration use cases, long-lived services
//! (retrieval cache, corpus store, circuit breaker) and port definitions.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineSettings, PanelSettings};
pub use ports::{
    audit_sink::{AuditEvent, AuditSink, NullAuditSink},
    corpus_provider::{CorpusError, CorpusProvider},
    model_gateway::{GatewayError, ModelGateway},
    reviewer::{Reviewer, ReviewerError, ReviewerRequest, ReviewerVerdict},
};
pub use services::{
    circuit_breaker::CircuitBreaker,
    corpus_store::CorpusStore,
    retrieval_cache::{CacheStats, RetrievalCache},
};
pub use use_cases::consult_panel::{ConsultPanelUseCase, PanelError, PanelReport};
pub use use_cases::guarded_review::{GuardedReviewUseCase, ReviewReport};
pub use use_cases::handle_task::{FinalResult, HandleTaskError, HandleTaskUseCase, TaskTrace};
