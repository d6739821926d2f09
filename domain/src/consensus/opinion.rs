//! Agent roles and panel opinions

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Confidence assigned to an opinion whose role errored out.
///
/// Errored roles are never silently dropped; they carry this neutral value
/// so downstream consumers can see them while the consensus average
/// excludes them.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// One specialized reviewer persona consulted as part of the panel.
///
/// `Dev` is the generalist and joins every panel; the other roles are
/// specialists pulled in when the router matches their domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Dev,
    Security,
    Architect,
    Qa,
    Seo,
    Ux,
}

impl AgentRole {
    /// All roles, in panel declaration order. Opinions are always assembled
    /// in this order so merge output is deterministic.
    pub const ALL: [AgentRole; 6] = [
        AgentRole::Dev,
        AgentRole::Security,
        AgentRole::Architect,
        AgentRole::Qa,
        AgentRole::Seo,
        AgentRole::Ux,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Dev => "dev",
            AgentRole::Security => "security",
            AgentRole::Architect => "architect",
            AgentRole::Qa => "qa",
            AgentRole::Seo => "seo",
            AgentRole::Ux => "ux",
        }
    }

    /// Whether this role is a domain specialist (everything except the
    /// generalist).
    pub fn is_specialist(&self) -> bool {
        !matches!(self, AgentRole::Dev)
    }

    /// Role-specific framing prepended to the task before the model call.
    pub fn prompt_preamble(&self) -> &'static str {
        match self {
            AgentRole::Dev => "As a Developer, provide a practical implementation perspective:",
            AgentRole::Security => {
                "As a Security Specialist, analyze this for potential security risks, \
                 vulnerabilities, and best practices:"
            }
            AgentRole::Architect => {
                "As a Software Architect, analyze this from the perspective of \
                 system design, scalability, and maintainability:"
            }
            AgentRole::Qa => {
                "As a QA Engineer, analyze this for edge cases, test coverage, \
                 and potential bugs:"
            }
            AgentRole::Seo => {
                "As an SEO Expert, analyze this for search engine optimization, \
                 discoverability, metadata, and content strategy:"
            }
            AgentRole::Ux => {
                "As a UX/UI Designer, analyze this for user experience, interface design, \
                 accessibility, and usability:"
            }
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "developer" => Ok(AgentRole::Dev),
            "security" => Ok(AgentRole::Security),
            "architect" | "architecture" => Ok(AgentRole::Architect),
            "qa" => Ok(AgentRole::Qa),
            "seo" => Ok(AgentRole::Seo),
            "ux" | "ux/ui" => Ok(AgentRole::Ux),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

/// Opinion produced by one role for one task. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOpinion {
    pub role: AgentRole,
    pub text: String,
    /// Self-assessed confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    pub latency_ms: u64,
    /// Set when the role exhausted retries or hit a definitive error.
    pub error: Option<String>,
}

impl AgentOpinion {
    pub fn success(role: AgentRole, text: impl Into<String>, latency_ms: u64) -> Self {
        let text = text.into();
        let confidence = extract_confidence(&text);
        Self {
            role,
            text,
            confidence,
            latency_ms,
            error: None,
        }
    }

    /// Opinion for a role that failed: empty text, neutral confidence,
    /// error message preserved for diagnostics.
    pub fn failure(role: AgentRole, error: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            role,
            text: String::new(),
            confidence: NEUTRAL_CONFIDENCE,
            latency_ms,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Extract a self-assessed confidence level from free-form opinion text.
///
/// Models are asked to end with a 0-10 score; the last standalone integer
/// in that range is taken and scaled to `[0.0, 1.0]`. Falls back to
/// [`NEUTRAL_CONFIDENCE`] when no score is present.
pub fn extract_confidence(text: &str) -> f64 {
    let bytes = text.as_bytes();
    let mut last: Option<u32> = None;
    let mut i = 0;

    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        // The "10" in "8/10" is a denominator, not a score.
        let is_denominator = start > 0 && bytes[start - 1] == b'/';
        if !is_denominator
            && i - start <= 2
            && let Ok(n) = text[start..i].parse::<u32>()
            && n <= 10
        {
            last = Some(n);
        }
    }

    match last {
        Some(n) => f64::from(n) / 10.0,
        None => NEUTRAL_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in AgentRole::ALL {
            assert_eq!(role.as_str().parse::<AgentRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        assert!("wizard".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_only_dev_is_generalist() {
        assert!(!AgentRole::Dev.is_specialist());
        assert!(AgentRole::Security.is_specialist());
    }

    #[test]
    fn test_extract_confidence_trailing_score() {
        let text = "The plan is sound. Confidence: 8/10";
        assert_eq!(extract_confidence(text), 0.8);
    }

    #[test]
    fn test_extract_confidence_ignores_large_numbers() {
        // 2048 is not a confidence score; the trailing 7 is.
        let text = "Allocate 2048 MB. Score: 7";
        assert_eq!(extract_confidence(text), 0.7);
    }

    #[test]
    fn test_extract_confidence_defaults_to_neutral() {
        assert_eq!(extract_confidence("no numbers here"), NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_failure_opinion_is_neutral() {
        let op = AgentOpinion::failure(AgentRole::Qa, "timed out", 1200);
        assert!(!op.is_success());
        assert_eq!(op.confidence, NEUTRAL_CONFIDENCE);
        assert_eq!(op.error.as_deref(), Some("timed out"));
    }

    #[test]
    fn test_success_opinion_extracts_confidence() {
        let op = AgentOpinion::success(AgentRole::Dev, "Looks fine. 9/10", 300);
        assert!(op.is_success());
        assert_eq!(op.confidence, 0.9);
    }
}
