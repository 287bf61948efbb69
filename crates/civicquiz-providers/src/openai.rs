//! OpenAI chat completions evaluator.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use civicquiz_core::error::EvaluatorError;
use civicquiz_core::model::{EvaluationRequest, EvaluationResult};
use civicquiz_core::traits::{
    build_evaluation_prompt, parse_evaluation_payload, SemanticEvaluator, SYSTEM_PROMPT,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 300;

/// Semantic evaluator backed by an OpenAI-compatible API.
pub struct OpenAiEvaluator {
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiEvaluator {
    pub fn new(
        api_key: &str,
        base_url: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
    response_format: serde_json::Value,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Structured output schema for `{isCorrect, feedback}`.
fn evaluation_response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "evaluation_response",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "isCorrect": { "type": "boolean" },
                    "feedback": { "type": "string" }
                },
                "required": ["isCorrect", "feedback"],
                "additionalProperties": false
            }
        }
    })
}

#[async_trait]
impl SemanticEvaluator for OpenAiEvaluator {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn judge(&self, request: &EvaluationRequest) -> Result<EvaluationResult, EvaluatorError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_evaluation_prompt(request),
                },
            ],
            response_format: evaluation_response_format(),
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvaluatorError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    EvaluatorError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(EvaluatorError::RateLimited {
                retry_after_ms: retry_after,
            });
        }
        if status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::AuthenticationFailed(body));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(EvaluatorError::ApiError {
                status,
                message: body,
            });
        }

        let api_response: ChatResponse = response.json().await.map_err(|e| {
            EvaluatorError::MalformedResponse(format!("failed to parse response: {e}"))
        })?;

        let message = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or(EvaluatorError::EmptyResponse)?;

        if let Some(refusal) = message.refusal {
            return Err(EvaluatorError::MalformedResponse(format!(
                "model refused: {refusal}"
            )));
        }

        let content = message.content.ok_or(EvaluatorError::EmptyResponse)?;
        let result = parse_evaluation_payload(&content)?;

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            "openai evaluation parsed"
        );
        Ok(result)
    }
}
