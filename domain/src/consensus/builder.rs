//! Consensus builder
//!
//! Merges panel opinions into one draft answer plus an aggregate
//! confidence. Error opinions are carried for diagnostics but contribute
//! neither text nor confidence.

use super::opinion::{AgentOpinion, AgentRole};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Raised when every opinion in the panel errored, leaving nothing to
/// merge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("consensus unavailable: all {attempted} panel opinions errored")]
pub struct ConsensusUnavailable {
    pub attempted: usize,
}

/// Merged panel answer before any authoritative override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub merged_text: String,
    /// Mean of non-error opinion confidences.
    pub aggregate_confidence: f64,
    /// Roles whose opinions made it into the merge, in declaration order.
    pub contributing_opinions: Vec<AgentRole>,
}

/// Merges opinions deterministically, biased by panel declaration order.
#[derive(Debug, Clone, Default)]
pub struct ConsensusBuilder;

impl ConsensusBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Merge the given opinions.
    ///
    /// Opinions must already be in panel declaration order; earlier roles
    /// win when content overlaps. Paragraphs that duplicate one already
    /// merged (after whitespace/case normalization) are dropped.
    pub fn build(
        &self,
        opinions: &[AgentOpinion],
    ) -> Result<ConsensusResult, ConsensusUnavailable> {
        let successful: Vec<&AgentOpinion> = opinions.iter().filter(|o| o.is_success()).collect();

        if successful.is_empty() {
            return Err(ConsensusUnavailable {
                attempted: opinions.len(),
            });
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut sections: Vec<String> = Vec::with_capacity(successful.len());
        let mut contributing = Vec::with_capacity(successful.len());

        for opinion in &successful {
            let mut kept: Vec<&str> = Vec::new();
            for paragraph in opinion.text.split("\n\n") {
                let trimmed = paragraph.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if seen.insert(normalize_paragraph(trimmed)) {
                    kept.push(trimmed);
                }
            }
            if kept.is_empty() {
                continue;
            }
            contributing.push(opinion.role);
            sections.push(format!("### {}\n{}", opinion.role, kept.join("\n\n")));
        }

        let aggregate_confidence =
            successful.iter().map(|o| o.confidence).sum::<f64>() / successful.len() as f64;

        Ok(ConsensusResult {
            merged_text: sections.join("\n\n"),
            aggregate_confidence,
            contributing_opinions: contributing,
        })
    }
}

fn normalize_paragraph(paragraph: &str) -> String {
    paragraph
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
