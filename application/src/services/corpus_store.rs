//! Shared corpus snapshot
//!
//! Readers take a cheap `Arc` clone of the current snapshot and keep
//! using it even while a reload swaps in a new one; in-flight retrievals
//! are never torn between versions.

use consilium_domain::{Corpus, CorpusVersion};
use std::sync::{Arc, RwLock};
use tracing::info;

pub struct CorpusStore {
    current: RwLock<Arc<Corpus>>,
}

impl CorpusStore {
    pub fn new(corpus: Corpus) -> Self {
        Self {
            current: RwLock::new(Arc::new(corpus)),
        }
    }

    pub fn empty() -> Self {
        Self::new(Corpus::empty())
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Corpus> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(|e| e.into_inner()),
        )
    }

    /// Replace the corpus wholesale. Cached retrievals against the old
    /// version become unreachable because the version is part of every
    /// cache key.
    pub fn swap(&self, corpus: Corpus) -> CorpusVersion {
        let version = corpus.version().clone();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(corpus);
        info!(version = version.as_str(), "corpus snapshot swapped");
        version
    }
}
