//! Authoritative reviewer port
//!
//! The reviewer is a second, stronger model consulted after the panel
//! when routing escalates. It sees a compact fact capsule rather than the
//! full transcripts.

use async_trait::async_trait;
use consilium_domain::Tier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of facts a request may carry.
pub const MAX_FACTS: usize = 10;

#[derive(Error, Debug, Clone)]
pub enum ReviewerError {
    #[error("reviewer unavailable: {0}")]
    Unavailable(String),

    #[error("reviewer returned a malformed verdict: {0}")]
    Malformed(String),
}

/// Compact review request: the task, the panel's merged position, and at
/// most [`MAX_FACTS`] supporting facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerRequest {
    pub task_text: String,
    pub tier: Tier,
    pub consensus_text: String,
    pub consensus_confidence: f64,
    pub facts: Vec<String>,
}

/// The reviewer's structured verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewerVerdict {
    /// The reviewer's own recommendation text.
    pub decision: String,
    /// Risks the panel missed or underweighted.
    pub risks: Vec<String>,
    /// Reviewer self-reported confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Cost of this call, in account currency.
    pub cost: f64,
    pub tokens: u64,
}

#[async_trait]
pub trait Reviewer: Send + Sync {
    async fn review(&self, request: &ReviewerRequest) -> Result<ReviewerVerdict, ReviewerError>;
}
