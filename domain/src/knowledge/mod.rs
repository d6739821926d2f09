//! Versioned knowledge corpus and retrieval selection
//!
//! The corpus is an opaque, versioned set of per-role documents. Chunking,
//! ballast classification, and budgeted chunk selection are pure functions;
//! the LRU cache wrapping them lives in the application layer.

pub mod corpus;
pub mod normalize;
pub mod retrieval;

pub use corpus::{Corpus, CorpusVersion, SectionChunk, chunk_markdown};
pub use normalize::NormalizationStrength;
pub use retrieval::{RetrievalLimits, RetrievalResult, RetrievedChunk, select_chunks};
