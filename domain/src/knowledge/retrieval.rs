//! Budgeted chunk selection
//!
//! Pure selection over a role's corpus subset: rank by query relevance,
//! cap ballast to one chunk, enforce the character budget.

use super::corpus::SectionChunk;
use crate::consensus::opinion::AgentRole;
use serde::{Deserialize, Serialize};

/// A chunk does not get tail-truncated unless at least this much of the
/// budget remains for it.
const MIN_TRUNCATED_CHARS: usize = 200;

/// Retrieval limits, part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetrievalLimits {
    /// Maximum number of chunks returned.
    pub top_k: usize,
    /// Character budget across all returned chunks.
    pub max_chars: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_chars: 6000,
        }
    }
}

/// One chunk in a retrieval result, with provenance for the audit trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub doc: String,
    pub section: String,
    pub text: String,
    pub is_ballast: bool,
}

/// Result of one retrieval call.
///
/// Invariants: `total_chars <= max_chars` and at most one chunk has
/// `is_ballast == true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub agent_role: AgentRole,
    pub chunks: Vec<RetrievedChunk>,
    pub total_chars: usize,
    /// How many candidate chunks existed for the role before selection.
    pub total_candidates: usize,
}

impl RetrievalResult {
    pub fn empty(role: AgentRole) -> Self {
        Self {
            agent_role: role,
            chunks: Vec::new(),
            total_chars: 0,
            total_candidates: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Render the chunks as a context block for the model prompt.
    pub fn context_block(&self) -> String {
        self.chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Select chunks for a role's query under the given limits.
///
/// Ranking is by query-term overlap, stable on ties so identical inputs
/// always produce identical output. Substantive chunks fill the slots
/// first; a single best-ranked ballast chunk may take a remaining slot.
/// The character budget is enforced by dropping lowest-ranked chunks
/// first; the final chunk is tail-truncated instead when meaningful room
/// remains.
pub fn select_chunks(
    role: AgentRole,
    chunks: &[SectionChunk],
    query: &str,
    limits: RetrievalLimits,
) -> RetrievalResult {
    if chunks.is_empty() || limits.top_k == 0 || limits.max_chars == 0 {
        return RetrievalResult {
            total_candidates: chunks.len(),
            ..RetrievalResult::empty(role)
        };
    }

    let terms = query_terms(query);

    // Rank: higher overlap first, original order on ties.
    let mut ranked: Vec<(usize, &SectionChunk)> = chunks.iter().enumerate().collect();
    ranked.sort_by_key(|(idx, chunk)| (std::cmp::Reverse(relevance(chunk, &terms)), *idx));

    let (substantive, ballast): (Vec<_>, Vec<_>) =
        ranked.into_iter().partition(|(_, c)| !c.is_ballast());

    let mut prioritized: Vec<&SectionChunk> = substantive
        .iter()
        .take(limits.top_k)
        .map(|(_, c)| *c)
        .collect();
    if prioritized.len() < limits.top_k
        && let Some((_, best_ballast)) = ballast.first()
    {
        prioritized.push(best_ballast);
    }

    let mut selected = Vec::new();
    let mut total_chars = 0usize;

    for chunk in prioritized {
        let remaining = limits.max_chars - total_chars;
        if chunk.text.len() <= remaining {
            total_chars += chunk.text.len();
            selected.push(RetrievedChunk {
                doc: chunk.doc.clone(),
                section: chunk.section.clone(),
                text: chunk.text.clone(),
                is_ballast: chunk.is_ballast(),
            });
        } else {
            if remaining >= MIN_TRUNCATED_CHARS {
                // Largest char boundary that fits the byte budget.
                let mut cut = remaining;
                while !chunk.text.is_char_boundary(cut) {
                    cut -= 1;
                }
                total_chars += cut;
                selected.push(RetrievedChunk {
                    doc: chunk.doc.clone(),
                    section: format!("{} (truncated)", chunk.section),
                    text: chunk.text[..cut].to_string(),
                    is_ballast: chunk.is_ballast(),
                });
            }
            break;
        }
    }

    RetrievalResult {
        agent_role: role,
        chunks: selected,
        total_chars,
        total_candidates: chunks.len(),
    }
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(str::to_string)
        .collect()
}

fn relevance(chunk: &SectionChunk, terms: &[String]) -> usize {
    let haystack = chunk.text.to_lowercase();
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(section: &str, text: &str) -> SectionChunk {
        SectionChunk {
            doc: "guide.md".into(),
            section: section.into(),
            text: text.into(),
        }
    }

    fn corpus() -> Vec<SectionChunk> {
        vec![
            chunk("Overview", "General overview of everything."),
            chunk("Token validation", "Verify JWT signatures and expiry."),
            chunk("Session storage", "Store sessions server-side."),
            chunk("Introduction", "Welcome to the guide."),
            chunk("Password policy", "Passwords must be hashed with a modern KDF."),
        ]
    }

    #[test]
    fn test_relevant_chunk_ranked_first() {
        let result = select_chunks(
            AgentRole::Security,
            &corpus(),
            "validate JWT token expiry",
            RetrievalLimits::default(),
        );
        assert_eq!(result.chunks[0].section, "Token validation");
    }

    #[test]
    fn test_at_most_one_ballast_chunk() {
        let result = select_chunks(
            AgentRole::Security,
            &corpus(),
            "anything",
            RetrievalLimits {
                top_k: 5,
                max_chars: 6000,
            },
        );
        let ballast = result.chunks.iter().filter(|c| c.is_ballast).count();
        assert_eq!(ballast, 1);
        assert_eq!(result.chunks.len(), 4); // 3 substantive + 1 ballast
    }

    #[test]
    fn test_char_budget_never_exceeded() {
        let limits = RetrievalLimits {
            top_k: 5,
            max_chars: 60,
        };
        let result = select_chunks(AgentRole::Security, &corpus(), "sessions", limits);
        assert!(result.total_chars <= limits.max_chars);
        assert_eq!(
            result.total_chars,
            result.chunks.iter().map(|c| c.text.len()).sum::<usize>()
        );
    }

    #[test]
    fn test_trailing_chunk_truncated_when_room_remains() {
        let big = chunk("Deep dive", &"x".repeat(1000));
        let limits = RetrievalLimits {
            top_k: 1,
            max_chars: 300,
        };
        let result = select_chunks(AgentRole::Dev, &[big], "deep", limits);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].text.len(), 300);
        assert!(result.chunks[0].section.ends_with("(truncated)"));
    }

    #[test]
    fn test_multibyte_text_stays_within_byte_budget() {
        // 200 two-byte chars = 400 bytes; the odd budget forces the cut
        // back to a char boundary.
        let big = chunk("Deep dive", &"é".repeat(200));
        let limits = RetrievalLimits {
            top_k: 1,
            max_chars: 301,
        };
        let result = select_chunks(AgentRole::Dev, &[big], "deep", limits);
        assert_eq!(result.chunks.len(), 1);
        assert!(result.total_chars <= limits.max_chars);
        assert_eq!(result.chunks[0].text.len(), 300);
        assert!(result.chunks[0].section.ends_with("(truncated)"));
    }

    #[test]
    fn test_empty_subset_yields_empty_result() {
        let result = select_chunks(AgentRole::Seo, &[], "anything", RetrievalLimits::default());
        assert!(result.is_empty());
        assert_eq!(result.total_chars, 0);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let a = select_chunks(
            AgentRole::Qa,
            &corpus(),
            "store sessions",
            RetrievalLimits::default(),
        );
        let b = select_chunks(
            AgentRole::Qa,
            &corpus(),
            "store sessions",
            RetrievalLimits::default(),
        );
        assert_eq!(a, b);
    }
}
