//! Chat-completions client for OpenAI-compatible engines
//!
//! The output schema travels as `response_format.json_schema` in strict mode, so the
//! engine itself constrains generation; the reply content is parsed as JSON and
//! handed back untyped.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{GenerationRequest, InferenceEngine};
use crate::config::InferenceConfig;
use crate::{Result, StarrySpotError};

const SYSTEM_PROMPT: &str = "You are an astronomy guide who knows good star-gazing spots. \
Reason about the request, then answer with a single JSON object that matches the provided schema and nothing else.";

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleEngine {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
    refusal: Option<String>,
}

impl OpenAiCompatibleEngine {
    pub fn new(config: &InferenceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(concat!("StarrySpot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StarrySpotError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl InferenceEngine for OpenAiCompatibleEngine {
    #[instrument(skip_all, fields(
        prompt = %request.prompt_name,
        input = %request.input_schema_name,
        output = %request.output_schema_name,
        model = %self.model
    ))]
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<Value>> {
        let start_time = Instant::now();
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.instruction,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.output_schema_name,
                    strict: true,
                    schema: &request.output_schema,
                },
            },
            temperature: self.temperature,
        };

        let mut http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(|e| StarrySpotError::inference(format!("Inference request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => StarrySpotError::inference(
                    "Inference engine rejected the API key. Please check inference.api_key.",
                ),
                429 => StarrySpotError::inference("Inference engine rate limit exceeded"),
                _ => StarrySpotError::inference(format!(
                    "Inference engine returned {status}: {}",
                    error_text.chars().take(200).collect::<String>()
                )),
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            StarrySpotError::inference(format!("Failed to parse completion response: {e}"))
        })?;

        let Some(choice) = completion.choices.into_iter().next() else {
            warn!("Completion contained no choices");
            return Ok(None);
        };
        debug!(finish_reason = ?choice.finish_reason, "Completion received");

        if let Some(refusal) = choice.message.refusal {
            warn!(%refusal, "Inference engine declined to answer");
            return Ok(None);
        }

        let content = match choice.message.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => return Ok(None),
        };

        let value: Value = serde_json::from_str(strip_code_fence(&content)).map_err(|e| {
            StarrySpotError::inference(format!("Generated output is not valid JSON: {e}"))
        })?;

        info!(
            "Generated structured output in {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(Some(value))
    }
}

/// Some engines wrap JSON in a markdown fence even in structured mode
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
