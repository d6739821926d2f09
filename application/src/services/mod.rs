//! Long-lived services shared across tasks

pub mod circuit_breaker;
pub mod corpus_store;
pub mod retrieval_cache;
