//! Anthropic Claude provider implementation

use super::errors::{LLMError, LLMResult};
use super::openai::retry_after;
use super::prompts::PromptTemplates;
use super::traits::{ResponseFormat, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

const PROVIDER: &str = "anthropic";
const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Claude configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaudeConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            max_tokens: 8192,
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

/// Claude provider for Anthropic's models
pub struct ClaudeProvider {
    client: Client,
    config: ClaudeConfig,
}

impl ClaudeProvider {
    pub fn new(config: ClaudeConfig) -> LLMResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::config("Anthropic API key is not set"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, prompt: &str, format: ResponseFormat) -> MessageRequest {
        // No native JSON mode; ask for it in the prompt
        let content = match format {
            ResponseFormat::Json => format!("{}{}", prompt, PromptTemplates::json_only_suffix()),
            ResponseFormat::Text => prompt.to_string(),
        };

        MessageRequest {
            model: self.config.model.clone(),
            messages: vec![Message { role: "user".to_string(), content }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            system: Some(PromptTemplates::system().to_string()),
        }
    }
}

#[async_trait]
impl TextGenerator for ClaudeProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str, format: ResponseFormat) -> LLMResult<String> {
        let request = self.build_request(prompt, format);
        let started = Instant::now();

        let response = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(PROVIDER, status.as_u16(), body, retry_after));
        }

        let result: MessageResponse = response.json().await?;
        if let Some(usage) = &result.usage {
            debug!(
                model = %self.config.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Claude completion"
            );
        }

        first_text_block(result)
    }
}

fn first_text_block(response: MessageResponse) -> LLMResult<String> {
    response
        .content
        .into_iter()
        .find_map(|c| match c {
            Content::Text { text } => Some(text),
            Content::Other => None,
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| LLMError::empty_reply("No response from Claude"))
}

/// Message structure for Claude API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

/// Claude API request
#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: usize,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

/// Claude API response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<Content>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Content {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}
