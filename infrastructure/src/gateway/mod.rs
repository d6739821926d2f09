//! HTTP adapters for the model gateway and reviewer ports
//!
//! Both talk to OpenAI-compatible chat-completion endpoints.

pub mod http_gateway;
pub mod http_reviewer;

pub use http_gateway::HttpModelGateway;
pub use http_reviewer::HttpReviewer;

use consilium_application::GatewayError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport-level ceiling on any single request. The use cases apply
/// tighter, configurable deadlines on top of this.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

#[derive(Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatMessageBody,
}

#[derive(Deserialize)]
pub(crate) struct ChatMessageBody {
    pub content: String,
}

#[derive(Deserialize, Default)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub total_tokens: u64,
}

/// Map a transport-level failure onto the port's error taxonomy.
pub(crate) fn map_send_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(e.to_string())
    } else if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::Other(e.to_string())
    }
}

/// Map a non-success HTTP status: server errors are transient, client
/// errors are definitive.
pub(crate) fn map_status(status: reqwest::StatusCode) -> GatewayError {
    if status.is_server_error() {
        GatewayError::Server(format!("HTTP {status}"))
    } else {
        GatewayError::Rejected(format!("HTTP {status}"))
    }
}
