//! Configuration loading

pub mod file_config;
pub mod loader;

pub use file_config::{FileAuditConfig, FileConfig, FileCorpusConfig, FileEndpointConfig};
pub use loader::ConfigLoader;
