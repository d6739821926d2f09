//! Corpus model and markdown chunking
//!
//! A [`Corpus`] is immutable per version and swapped wholesale on reload;
//! retrieval cache entries keyed under an old version simply become
//! unreachable.

use crate::consensus::opinion::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Section titles treated as ballast: low-information introductory or
/// overview content the retrieval ranker deliberately limits to at most
/// one chunk per result.
const BALLAST_SECTIONS: [&str; 5] = ["introduction", "scope", "overview", "about", "preface"];

/// Sections larger than this are split further by paragraph.
const MAX_SECTION_CHARS: usize = 2000;
const TARGET_SPLIT_CHARS: usize = 1500;

/// Content-hash version id of a loaded corpus (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorpusVersion(String);

impl CorpusVersion {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorpusVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One chunk of a knowledge document, carrying its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionChunk {
    /// Source document name, e.g. `security_checklist.md`.
    pub doc: String,
    /// Section title within the document.
    pub section: String,
    pub text: String,
}

impl SectionChunk {
    /// Whether this chunk is introductory/overview ballast.
    ///
    /// The section title is normalized first: leading numbering
    /// (`"0) "`, `"1. "`) and trailing parentheticals are stripped.
    pub fn is_ballast(&self) -> bool {
        let title = self
            .section
            .trim_start_matches(|c: char| {
                c.is_ascii_digit() || c == ')' || c == '.' || c == '-' || c.is_whitespace()
            })
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
            .to_lowercase();
        BALLAST_SECTIONS.contains(&title.as_str())
    }
}

/// Versioned, per-role partitioned knowledge corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    version: CorpusVersion,
    by_role: BTreeMap<AgentRole, Vec<SectionChunk>>,
}

impl Corpus {
    pub fn new(version: CorpusVersion, by_role: BTreeMap<AgentRole, Vec<SectionChunk>>) -> Self {
        Self { version, by_role }
    }

    /// Corpus with no documents at all. Retrieval against it yields empty
    /// results, never errors.
    pub fn empty() -> Self {
        Self {
            version: CorpusVersion::new("empty"),
            by_role: BTreeMap::new(),
        }
    }

    pub fn version(&self) -> &CorpusVersion {
        &self.version
    }

    /// Chunks available to the given role. Missing roles get an empty
    /// subset; callers must tolerate zero-context retrieval.
    pub fn chunks_for(&self, role: AgentRole) -> &[SectionChunk] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roles_loaded(&self) -> impl Iterator<Item = AgentRole> + '_ {
        self.by_role
            .iter()
            .filter(|(_, chunks)| !chunks.is_empty())
            .map(|(role, _)| *role)
    }
}

/// Split markdown content into section chunks with provenance.
///
/// Content is split at `## ` headings; sections above
/// [`MAX_SECTION_CHARS`] are split further along paragraph boundaries into
/// parts of roughly [`TARGET_SPLIT_CHARS`]. Preamble before the first
/// heading becomes an `Introduction` chunk; a document without any
/// heading becomes a `Full document` chunk, which is not ballast.
pub fn chunk_markdown(content: &str, doc_name: &str) -> Vec<SectionChunk> {
    let mut chunks = Vec::new();
    let has_headings = content.trim_start().starts_with("## ") || content.contains("\n## ");
    let default_title = if has_headings {
        "Introduction"
    } else {
        "Full document"
    };

    for section in split_at_headings(content) {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }

        let title = section
            .strip_prefix("## ")
            .and_then(|rest| rest.lines().next())
            .map(str::trim)
            .unwrap_or(default_title)
            .to_string();

        if section.len() <= MAX_SECTION_CHARS {
            chunks.push(SectionChunk {
                doc: doc_name.to_string(),
                section: title,
                text: section.to_string(),
            });
            continue;
        }

        // Oversized section: regroup paragraphs into parts.
        let mut part = String::new();
        let mut part_idx = 0usize;
        for paragraph in section.split("\n\n") {
            if !part.is_empty() && part.len() + paragraph.len() >= TARGET_SPLIT_CHARS {
                part_idx += 1;
                chunks.push(SectionChunk {
                    doc: doc_name.to_string(),
                    section: format!("{title} (part {part_idx})"),
                    text: std::mem::take(&mut part).trim_end().to_string(),
                });
            }
            part.push_str(paragraph);
            part.push_str("\n\n");
        }
        if !part.trim().is_empty() {
            let section_name = if part_idx > 0 {
                format!("{title} (part {})", part_idx + 1)
            } else {
                title
            };
            chunks.push(SectionChunk {
                doc: doc_name.to_string(),
                section: section_name,
                text: part.trim_end().to_string(),
            });
        }
    }

    chunks
}

/// Split content before each `## ` heading at a line start.
fn split_at_headings(content: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0usize;

    for (idx, _) in content.match_indices("\n## ") {
        let boundary = idx + 1; // keep the heading with its section
        if boundary > start {
            parts.push(&content[start..boundary]);
        }
        start = boundary;
    }
    parts.push(&content[start..]);
    parts
}
