use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shopchat_common::{Error, Result};
use tracing::{debug, warn};

use crate::providers::{LlmProvider, LlmRequest, LlmResponse, Usage};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Google Gemini `generateContent` client.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    api_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url: api_url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.api_url)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = self.generate_url(&request.model);
        debug!(
            "gemini request to model {} ({} prompt chars)",
            request.model,
            request.prompt.len()
        );

        let body = GeminiRequest::from(request);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::from_request("Gemini request failed", e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                Error::from_request("failed to read Gemini response", e.without_url())
            })?;

        if !status.is_success() {
            warn!("Gemini returned HTTP {status}");
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GeminiResponse = serde_json::from_str(&text).map_err(|e| {
            Error::MalformedPayload(format!("failed to parse Gemini response: {e}"))
        })?;

        parsed.into_llm_response(&request.model)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.api_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

// Request Types
#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl From<&LlmRequest> for GeminiRequest {
    fn from(request: &LlmRequest) -> Self {
        let generation_config =
            if request.temperature.is_none() && request.max_output_tokens.is_none() {
                None
            } else {
                Some(GenerationConfig {
                    temperature: request.temperature,
                    max_output_tokens: request.max_output_tokens,
                })
            };

        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(request.prompt.clone()),
                }],
            }],
            generation_config,
        }
    }
}

// Response Types
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GeminiResponse {
    fn into_llm_response(self, requested_model: &str) -> Result<LlmResponse> {
        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            Error::MalformedPayload("Gemini response has no candidates[0]".to_string())
        })?;

        let text = candidate
            .content
            .ok_or_else(|| {
                Error::MalformedPayload("Gemini response has no candidates[0].content".to_string())
            })?
            .parts
            .into_iter()
            .next()
            .and_then(|part| part.text)
            .ok_or_else(|| {
                Error::MalformedPayload(
                    "Gemini response has no candidates[0].content.parts[0].text".to_string(),
                )
            })?;

        Ok(LlmResponse {
            text,
            model: self
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            usage: self.usage_metadata.map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            }),
            finish_reason: candidate.finish_reason,
        })
    }
}
