//! HTTP model gateway adapter

use super::{ChatMessage, ChatRequest, ChatResponse, http_client, map_send_error, map_status};
use crate::config::FileEndpointConfig;
use async_trait::async_trait;
use consilium_application::{GatewayError, ModelGateway};
use consilium_domain::AgentRole;
use tracing::debug;

/// Panel model calls over an OpenAI-compatible chat-completion API.
///
/// Deadlines and retries are the caller's concern; this adapter performs
/// exactly one request per call.
pub struct HttpModelGateway {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpModelGateway {
    pub fn new(config: &FileEndpointConfig) -> Self {
        Self {
            client: http_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        }
    }
}

#[async_trait]
impl ModelGateway for HttpModelGateway {
    async fn complete(&self, role: AgentRole, prompt: &str) -> Result<String, GatewayError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(map_status(status));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Other(format!("malformed response body: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::Other("response had no choices".to_string()))?;

        debug!(%role, bytes = content.len(), "gateway response received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_transient_vs_definitive() {
        let server = map_status(reqwest::StatusCode::BAD_GATEWAY);
        assert!(server.is_transient());

        let client = map_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!client.is_transient());
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = HttpModelGateway::new(&FileEndpointConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            model: "panel-model".to_string(),
            api_key_env: "CONSILIUM_TEST_UNSET_KEY".to_string(),
            cost_per_1k_tokens: 0.0,
        });
        assert_eq!(gateway.base_url, "http://localhost:8080/v1");
    }
}
