//! Google Gemini `generateContent` client.

use crate::config::OracleConfig;
use crate::error::{OracleError, OracleResult};
use crate::whisper::TextGenerator;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Gemini request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl GenerateRequest {
    pub(crate) fn new(prompt: &str, thinking_budget: u32) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                thinking_config: ThinkingConfig { thinking_budget },
            },
        }
    }
}

/// Gemini response body. Every field is optional on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<u32>,
    #[serde(default)]
    candidates_token_count: Option<u32>,
    #[serde(default)]
    total_token_count: Option<u32>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate. Empty when the service
    /// returned no candidates or no text parts.
    pub(crate) fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Parse a raw response body.
pub(crate) fn parse_response(body: &str) -> OracleResult<GenerateResponse> {
    Ok(serde_json::from_str(body)?)
}

/// Gemini API client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: OracleConfig,
    client: Client,
}

impl GeminiClient {
    /// Create a client. A missing API key is allowed here; each request will
    /// then fail with [`OracleError::MissingApiKey`].
    pub fn new(config: OracleConfig) -> OracleResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait::async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> OracleResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(OracleError::MissingApiKey)?;

        let url = self.endpoint();
        debug!(%url, model = %self.config.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&GenerateRequest::new(prompt, self.config.thinking_budget))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "generateContent response");

        if !status.is_success() {
            error!("Gemini API error: {} - {}", status, body);
            return Err(OracleError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed = parse_response(&body)?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            info!(reason, "prompt was blocked by the service");
        }
        if let Some(reason) = parsed
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!(reason, "candidate finished");
        }
        if let Some(usage) = &parsed.usage_metadata {
            info!(
                "Gemini usage - prompt: {:?}, response: {:?}, total: {:?} tokens",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(parsed.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_disables_thinking() {
        let body = serde_json::to_value(GenerateRequest::new("hello", 0)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            body["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            0
        );
    }

    #[test]
    fn response_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": { "parts": [{ "text": "light " }, { "text": "bends" }], "role": "model" },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 80, "candidatesTokenCount": 12, "totalTokenCount": 92 }
        }"#;
        let parsed = parse_response(body).unwrap();
        assert_eq!(parsed.text(), "light bends");
    }

    #[test]
    fn missing_candidates_is_empty_text() {
        let parsed = parse_response(r#"{ "promptFeedback": { "blockReason": "SAFETY" } }"#).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn candidate_without_content_is_empty_text() {
        let parsed = parse_response(r#"{ "candidates": [{ "finishReason": "MAX_TOKENS" }] }"#).unwrap();
        assert_eq!(parsed.text(), "");
    }

    #[test]
    fn non_json_body_is_an_error() {
        let err = parse_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, OracleError::Json(_)));
    }

    #[test]
    fn endpoint_uses_model_and_base() {
        let client = GeminiClient::new(OracleConfig {
            base_url: "http://localhost:9000/v1beta".into(),
            ..OracleConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_key_fails_fast() {
        let client = GeminiClient::new(OracleConfig::default()).unwrap();
        let err = client.generate("anything").await.unwrap_err();
        assert!(matches!(err, OracleError::MissingApiKey));
    }
}
