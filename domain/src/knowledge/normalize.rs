//! Query normalization for cache keys
//!
//! Near-duplicate queries intentionally collide in the retrieval cache.
//! How aggressively they collapse is configurable rather than hard-coded.

use serde::{Deserialize, Serialize};

/// How strongly a query is normalized before hashing into the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizationStrength {
    /// Trim only; every distinct query gets its own cache entry.
    Exact,
    /// Lowercase and collapse whitespace runs.
    #[default]
    CaseFold,
    /// [`CaseFold`](Self::CaseFold) plus stripping punctuation, so
    /// `"rotate keys?"` and `"Rotate keys"` collide.
    Aggressive,
}

impl NormalizationStrength {
    pub fn normalize(&self, query: &str) -> String {
        match self {
            NormalizationStrength::Exact => query.trim().to_string(),
            NormalizationStrength::CaseFold => {
                query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
            }
            NormalizationStrength::Aggressive => {
                let stripped: String = query
                    .chars()
                    .map(|c| {
                        if c.is_alphanumeric() || c.is_whitespace() {
                            c
                        } else {
                            ' '
                        }
                    })
                    .collect();
                stripped
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase()
            }
        }
    }
}
