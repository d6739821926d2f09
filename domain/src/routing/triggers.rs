//! Declarative trigger tables
//!
//! Each domain has "strong" and "weak" trigger terms with different score
//! weights, plus a hard-coded critical set for incident/breach-class
//! tasks. Terms match against the lowercased task text at word
//! boundaries, so short triggers like `ui` never fire inside unrelated
//! words; terms are intentionally conservative to avoid false escalation.

use crate::consensus::opinion::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trigger terms for one domain, split by strength.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTriggers {
    pub strong: Vec<String>,
    pub weak: Vec<String>,
}

/// Terms from one domain that matched a task, split by strength.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMatches {
    pub strong: Vec<String>,
    pub weak: Vec<String>,
}

impl TriggerMatches {
    pub fn is_empty(&self) -> bool {
        self.strong.is_empty() && self.weak.is_empty()
    }
}

/// The full routing table: per-domain triggers plus the critical set.
///
/// Loaded once at init; matching itself is a pure function over this
/// data, so alternative tables can be swapped in without touching the
/// tier-decision logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerTable {
    /// Incident/breach-class terms that force CRITICAL regardless of
    /// domain scoring.
    pub critical: Vec<String>,
    pub domains: BTreeMap<AgentRole, DomainTriggers>,
}

impl TriggerTable {
    /// Match task text against the critical trigger set.
    pub fn match_critical(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        self.critical
            .iter()
            .filter(|t| matches_term(&lowered, t))
            .cloned()
            .collect()
    }

    /// Match task text against every domain's triggers.
    ///
    /// Returns only domains with at least one match, keyed
    /// deterministically.
    pub fn match_domains(&self, text: &str) -> BTreeMap<AgentRole, TriggerMatches> {
        let lowered = text.to_lowercase();
        let mut matched = BTreeMap::new();

        for (domain, triggers) in &self.domains {
            let hits = TriggerMatches {
                strong: triggers
                    .strong
                    .iter()
                    .filter(|t| matches_term(&lowered, t))
                    .cloned()
                    .collect(),
                weak: triggers
                    .weak
                    .iter()
                    .filter(|t| matches_term(&lowered, t))
                    .cloned()
                    .collect(),
            };
            if !hits.is_empty() {
                matched.insert(*domain, hits);
            }
        }

        matched
    }
}

/// Whether `term` occurs in `text` bounded by non-alphanumeric
/// characters (or the string edges) on both sides. The term itself may
/// contain spaces or punctuation (`access control`, `ci/cd`).
fn matches_term(text: &str, term: &str) -> bool {
    let mut search = 0;
    while let Some(pos) = text[search..].find(term) {
        let start = search + pos;
        let end = start + term.len();
        let bounded_left = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let bounded_right = text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if bounded_left && bounded_right {
            return true;
        }
        search = end;
    }
    false
}

impl Default for TriggerTable {
    fn default() -> Self {
        fn terms(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        let mut domains = BTreeMap::new();

        domains.insert(
            AgentRole::Security,
            DomainTriggers {
                strong: terms(&[
                    "vulnerability",
                    "injection",
                    "xss",
                    "csrf",
                    "oauth",
                    "jwt",
                    "credential",
                    "cve",
                ]),
                weak: terms(&[
                    "security",
                    "auth",
                    "token",
                    "secret",
                    "password",
                    "access control",
                    "encrypt",
                    "permission",
                ]),
            },
        );

        domains.insert(
            AgentRole::Architect,
            DomainTriggers {
                strong: terms(&[
                    "architecture",
                    "microservice",
                    "migration",
                    "infrastructure",
                    "ci/cd",
                    "kubernetes",
                    "docker",
                ]),
                weak: terms(&[
                    "database",
                    "scale",
                    "scaling",
                    "performance",
                    "refactor",
                    "deploy",
                    "nginx",
                    "load balancer",
                ]),
            },
        );

        domains.insert(
            AgentRole::Qa,
            DomainTriggers {
                strong: terms(&[
                    "regression",
                    "coverage",
                    "integration test",
                    "unit test",
                    "e2e",
                ]),
                weak: terms(&["test", "qa", "bug", "edge case", "mock", "fixture"]),
            },
        );

        domains.insert(
            AgentRole::Seo,
            DomainTriggers {
                strong: terms(&[
                    "sitemap",
                    "robots.txt",
                    "schema.org",
                    "canonical",
                    "lighthouse",
                ]),
                weak: terms(&["seo", "meta tag", "search engine", "structured data"]),
            },
        );

        domains.insert(
            AgentRole::Ux,
            DomainTriggers {
                strong: terms(&[
                    "accessibility",
                    "a11y",
                    "wcag",
                    "design system",
                    "user experience",
                ]),
                weak: terms(&["ux", "ui", "mobile", "responsive", "usability"]),
            },
        );

        Self {
            critical: terms(&[
                "incident",
                "outage",
                "breach",
                "compromised",
                "production down",
                "data loss",
                "leak",
                "incident response",
            ]),
            domains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_triggers_matched() {
        let table = TriggerTable::default();
        let hits = table.match_critical("Production down after the last deploy");
        assert_eq!(hits, vec!["production down".to_string()]);
    }

    #[test]
    fn test_domain_matching_is_case_insensitive() {
        let table = TriggerTable::default();
        let matched = table.match_domains("Rotate the JWT and audit ACCESS CONTROL");
        let security = &matched[&AgentRole::Security];
        assert_eq!(security.strong, vec!["jwt".to_string()]);
        assert_eq!(security.weak, vec!["access control".to_string()]);
    }

    #[test]
    fn test_unmatched_domains_absent() {
        let table = TriggerTable::default();
        let matched = table.match_domains("write a haiku");
        assert!(matched.is_empty());
    }

    #[test]
    fn test_short_triggers_need_word_boundaries() {
        let table = TriggerTable::default();

        // "ui" must not fire inside "suite", nor "test" inside "latest".
        let matched = table.match_domains("add the e2e regression suite to the latest build");
        assert!(!matched.contains_key(&AgentRole::Ux));
        assert_eq!(matched[&AgentRole::Qa].weak, Vec::<String>::new());

        let matched = table.match_domains("polish the ui states on mobile");
        assert_eq!(
            matched[&AgentRole::Ux].weak,
            vec!["ui".to_string(), "mobile".to_string()]
        );
    }

    #[test]
    fn test_generalist_has_no_triggers() {
        let table = TriggerTable::default();
        assert!(!table.domains.contains_key(&AgentRole::Dev));
    }
}
