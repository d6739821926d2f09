//! Knowledge corpus port
//!
//! Loads the full role-to-chunks corpus from wherever it is stored. The
//! application swaps the loaded corpus into the [`CorpusStore`]
//! wholesale; providers never mutate a live corpus.
//!
//! [`CorpusStore`]: crate::services::corpus_store::CorpusStore

use async_trait::async_trait;
use consilium_domain::Corpus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("corpus load failed: {0}")]
    LoadFailed(String),
}

#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Load a complete corpus snapshot, including its version stamp.
    async fn load(&self) -> Result<Corpus, CorpusError>;
}
