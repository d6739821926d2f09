//! Configuration file structures
//!
//! Everything that can be set in `consilium.toml`. The engine section
//! deserializes straight into the application's [`EngineSettings`];
//! endpoint, corpus and audit sections are infrastructure concerns.

use consilium_application::EngineSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One HTTP chat-completion endpoint (gateway or reviewer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEndpointConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Cost per 1000 tokens, for breaker budget accounting.
    pub cost_per_1k_tokens: f64,
}

impl FileEndpointConfig {
    fn gateway_default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: "panel-model".to_string(),
            api_key_env: "CONSILIUM_API_KEY".to_string(),
            cost_per_1k_tokens: 0.0,
        }
    }

    fn reviewer_default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: "reviewer-model".to_string(),
            api_key_env: "CONSILIUM_API_KEY".to_string(),
            cost_per_1k_tokens: 0.0,
        }
    }
}

/// Where the knowledge corpus lives on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCorpusConfig {
    /// Directory with one subdirectory of markdown files per role.
    pub dir: PathBuf,
}

impl Default for FileCorpusConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("knowledge"),
        }
    }
}

/// Audit trail destination.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileAuditConfig {
    /// JSONL file path; `None` disables auditing.
    pub path: Option<PathBuf>,
}

/// Root configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub engine: EngineSettings,
    pub gateway: FileEndpointConfig,
    pub reviewer: FileEndpointConfig,
    pub corpus: FileCorpusConfig,
    pub audit: FileAuditConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            gateway: FileEndpointConfig::gateway_default(),
            reviewer: FileEndpointConfig::reviewer_default(),
            corpus: FileCorpusConfig::default(),
            audit: FileAuditConfig::default(),
        }
    }
}
