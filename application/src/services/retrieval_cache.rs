//! Versioned LRU cache for retrieval results
//!
//! Keys are `role:query_hash:version:top_k:max_chars`, so a corpus
//! version bump makes every older entry unreachable without an explicit
//! flush; stale entries age out through normal LRU eviction.
//!
//! Recency is tracked with a stamp queue instead of a linked list: every
//! touch appends a fresh `(stamp, key)` pair, and eviction pops pairs
//! from the front, skipping those whose stamp no longer matches the live
//! entry. Each operation pushes at most one pair and every pair is
//! popped at most once, so the cost stays O(1) amortized.

use consilium_domain::{
    AgentRole, CorpusVersion, NormalizationStrength, RetrievalLimits, RetrievalResult,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cache health counters, exported for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Entry {
    result: Arc<RetrievalResult>,
    stamp: u64,
}

struct Inner {
    entries: HashMap<String, Entry>,
    /// Touch history, oldest first. Pairs whose stamp is stale are
    /// skipped during eviction.
    recency: VecDeque<(u64, String)>,
    next_stamp: u64,
    hits: u64,
    misses: u64,
}

/// Thread-safe LRU cache over retrieval results.
pub struct RetrievalCache {
    capacity: usize,
    strength: NormalizationStrength,
    inner: Mutex<Inner>,
}

impl RetrievalCache {
    pub fn new(capacity: usize, strength: NormalizationStrength) -> Self {
        Self {
            capacity: capacity.max(1),
            strength,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                recency: VecDeque::new(),
                next_stamp: 0,
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Build the cache key for one retrieval.
    pub fn key(
        &self,
        role: AgentRole,
        query: &str,
        version: &CorpusVersion,
        limits: &RetrievalLimits,
    ) -> String {
        let mut hasher = DefaultHasher::new();
        self.strength.normalize(query).hash(&mut hasher);
        format!(
            "{role}:{:016x}:{}:{}:{}",
            hasher.finish(),
            version.as_str(),
            limits.top_k,
            limits.max_chars
        )
    }

    pub fn get(&self, key: &str) -> Option<Arc<RetrievalResult>> {
        let mut inner = self.lock();
        let stamp = inner.next_stamp;
        inner.next_stamp += 1;

        match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.stamp = stamp;
                let result = Arc::clone(&entry.result);
                inner.recency.push_back((stamp, key.to_string()));
                inner.hits += 1;
                Some(result)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Insert a freshly computed result, evicting the least recently
    /// used entry if the cache is full.
    pub fn insert(&self, key: String, result: RetrievalResult) -> Arc<RetrievalResult> {
        let result = Arc::new(result);
        let mut inner = self.lock();
        let stamp = inner.next_stamp;
        inner.next_stamp += 1;

        inner.recency.push_back((stamp, key.clone()));
        inner.entries.insert(
            key,
            Entry {
                result: Arc::clone(&result),
                stamp,
            },
        );

        while inner.entries.len() > self.capacity {
            let Some((stamp, key)) = inner.recency.pop_front() else {
                break;
            };
            let live = inner.entries.get(&key).is_some_and(|e| e.stamp == stamp);
            if live {
                inner.entries.remove(&key);
            }
        }

        result
    }

    /// Look up the key and compute-and-insert on miss.
    pub fn get_or_insert_with(
        &self,
        key: &str,
        compute: impl FnOnce() -> RetrievalResult,
    ) -> Arc<RetrievalResult> {
        if let Some(result) = self.get(key) {
            return result;
        }
        self.insert(key.to_string(), compute())
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            entries: inner.entries.len(),
            capacity: self.capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a panic mid-update elsewhere; the
        // cache is advisory, so keep serving.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
