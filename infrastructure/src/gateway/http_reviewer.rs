//! HTTP reviewer adapter
//!
//! Asks the reviewer model for a strict-JSON verdict and parses it out
//! of the response, tolerating prose around the JSON object.

use super::{ChatMessage, ChatRequest, ChatResponse, http_client, map_send_error};
use crate::config::FileEndpointConfig;
use async_trait::async_trait;
use consilium_application::{Reviewer, ReviewerError, ReviewerRequest, ReviewerVerdict};
use serde::Deserialize;
use tracing::debug;

pub struct HttpReviewer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    cost_per_1k_tokens: f64,
}

impl HttpReviewer {
    pub fn new(config: &FileEndpointConfig) -> Self {
        Self {
            client: http_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
            cost_per_1k_tokens: config.cost_per_1k_tokens,
        }
    }
}

#[async_trait]
impl Reviewer for HttpReviewer {
    async fn review(&self, request: &ReviewerRequest) -> Result<ReviewerVerdict, ReviewerError> {
        let prompt = review_prompt(request);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let mut http = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .await
            .map_err(|e| ReviewerError::Unavailable(map_send_error(e).to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReviewerError::Unavailable(format!("HTTP {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReviewerError::Malformed(format!("response body: {e}")))?;
        let tokens = parsed.usage.as_ref().map_or(0, |u| u.total_tokens);
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ReviewerError::Malformed("response had no choices".to_string()))?;

        debug!(tokens, "reviewer response received");
        parse_verdict(&content, tokens, self.cost_per_1k_tokens)
    }
}

fn review_prompt(request: &ReviewerRequest) -> String {
    let facts = request
        .facts
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are the authoritative reviewer for a {tier} tier task.\n\n\
         Task:\n{task}\n\n\
         Panel consensus (confidence {conf:.2}):\n{consensus}\n\n\
         Panel facts:\n{facts}\n\n\
         Reply with a single JSON object: {{\"decision\": string, \
         \"risks\": [string], \"confidence\": number between 0 and 1}}.",
        tier = request.tier,
        task = request.task_text,
        conf = request.consensus_confidence,
        consensus = request.consensus_text,
    )
}

#[derive(Deserialize)]
struct VerdictBody {
    decision: String,
    #[serde(default)]
    risks: Vec<String>,
    confidence: f64,
}

/// Extract the verdict JSON from model output that may wrap it in prose.
fn parse_verdict(
    content: &str,
    tokens: u64,
    cost_per_1k_tokens: f64,
) -> Result<ReviewerVerdict, ReviewerError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let (Some(start), Some(end)) = (start, end) else {
        return Err(ReviewerError::Malformed("no JSON object found".to_string()));
    };
    if end < start {
        return Err(ReviewerError::Malformed("no JSON object found".to_string()));
    }

    let body: VerdictBody = serde_json::from_str(&content[start..=end])
        .map_err(|e| ReviewerError::Malformed(e.to_string()))?;

    Ok(ReviewerVerdict {
        decision: body.decision,
        risks: body.risks,
        confidence: body.confidence.clamp(0.0, 1.0),
        cost: tokens as f64 / 1000.0 * cost_per_1k_tokens,
        tokens,
    })
}
