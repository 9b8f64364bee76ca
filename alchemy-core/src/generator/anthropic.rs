//! Claude-backed element generator.
//!
//! Sends a single-turn Messages API request and parses a JSON candidate out
//! of the text reply. Failures are reported, never papered over with a
//! placeholder element.

use super::{parse_candidate, ElementGenerator};
use crate::config::GeneratorConfig;
use crate::element::Candidate;
use crate::error::GeneratorError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_BASE: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

const SYSTEM_PROMPT: &str = "You are a creative alchemist who combines two elements into a new one.
Rules:
1. The result must be a noun.
2. Abstract concepts are allowed.
3. Include exactly one emoji.
4. The result must follow logically from combining the two elements.
5. Respond with JSON only.";

/// Generator that asks Claude for each new combination.
#[derive(Clone)]
pub struct ClaudeGenerator {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: usize,
    temperature: f32,
    timeout: Duration,
}

impl ClaudeGenerator {
    /// Create a generator with an API key and tuning from `config`.
    pub fn new(api_key: impl Into<String>, config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeneratorError::NoApiKey);
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| GeneratorError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            api_base: API_BASE.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.timeout,
        })
    }

    /// Create a generator from the API key held in `config`.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        let api_key = config.api_key.clone().ok_or(GeneratorError::NoApiKey)?;
        Self::new(api_key, config)
    }

    /// Point the generator at a different API base (e.g. a proxy).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_headers(&self) -> Result<HeaderMap, GeneratorError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| GeneratorError::Config(format!("Invalid API key: {e}")))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn build_request(&self, name_a: &str, name_b: &str) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            temperature: self.temperature,
            messages: vec![ApiMessage {
                role: "user".to_string(),
                content: user_prompt(name_a, name_b),
            }],
        }
    }
}

fn user_prompt(name_a: &str, name_b: &str) -> String {
    format!(
        "What do you get when you combine \"{name_a}\" and \"{name_b}\"?\n\
         Respond in JSON: {{ \"result\": \"name of the result\", \"emoji\": \"emoji\" }}"
    )
}

#[async_trait]
impl ElementGenerator for ClaudeGenerator {
    async fn generate(&self, name_a: &str, name_b: &str) -> Result<Candidate, GeneratorError> {
        let headers = self.build_headers()?;
        let api_request = self.build_request(name_a, name_b);

        let response = self
            .client
            .post(format!("{}/messages", self.api_base))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout {
                        duration: self.timeout,
                    }
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        parse_candidate(&api_response.text())
    }

    fn name(&self) -> &str {
        "claude"
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: usize,
    system: String,
    temperature: f32,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiContent>,
}

impl ApiResponse {
    fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ApiContent::Text { text } => Some(text.as_str()),
                ApiContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default()
    }

    #[test]
    fn test_rejects_empty_api_key() {
        assert!(matches!(
            ClaudeGenerator::new("  ", &config()),
            Err(GeneratorError::NoApiKey)
        ));
        assert!(matches!(
            ClaudeGenerator::from_config(&config()),
            Err(GeneratorError::NoApiKey)
        ));
    }

    #[test]
    fn test_request_carries_both_names() {
        let generator = ClaudeGenerator::new("test-key", &config()).unwrap();
        let request = generator.build_request("Water", "Fire");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], generator.model());
        assert_eq!(json["messages"][0]["role"], "user");
        let prompt = json["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("\"Water\""));
        assert!(prompt.contains("\"Fire\""));
    }

    #[test]
    fn test_response_text_skips_non_text_blocks() {
        let response: ApiResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "{\"result\": \"Steam\", \"emoji\": \"♨️\"}"}
            ]
        }))
        .unwrap();
        assert_eq!(
            parse_candidate(&response.text()).unwrap(),
            Candidate::new("Steam", "♨️")
        );
    }
}
