//! Infrastructure layer for consilium
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: HTTP model gateway and reviewer, filesystem corpus
//! provider, JSONL audit sink, and configuration file loading.

pub mod audit;
pub mod config;
pub mod corpus;
pub mod gateway;

// Re-export commonly used types
pub use audit::JsonlAuditSink;
pub use config::{
    ConfigLoader, FileAuditConfig, FileConfig, FileCorpusConfig, FileEndpointConfig,
};
pub use corpus::FsCorpusProvider;
pub use gateway::{HttpModelGateway, HttpReviewer};
