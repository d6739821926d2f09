//! Model gateway port
//!
//! Defines the interface for sending a single prompt to a panel agent's
//! backing model. Implementations (adapters) live in the infrastructure
//! layer.

use async_trait::async_trait;
use consilium_domain::AgentRole;
use thiserror::Error;

/// Errors that can occur during a model call.
///
/// The transient/definitive split drives retry behavior: timeouts and
/// server-side failures are retried with backoff, everything else fails
/// the attempt outright.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("gateway error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Whether retrying the same call can plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Timeout(_) | GatewayError::Server(_))
    }
}

/// Gateway for panel agent model calls.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Send one prompt on behalf of a role and return the raw response
    /// text.
    async fn complete(&self, role: AgentRole, prompt: &str) -> Result<String, GatewayError>;
}
