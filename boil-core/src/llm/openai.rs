//! OpenAI chat-completions provider

use super::errors::{LLMError, LLMResult};
use super::prompts::PromptTemplates;
use super::traits::{ResponseFormat, TextGenerator};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

const PROVIDER: &str = "openai";

/// OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub timeout_secs: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.2,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

/// Provider for OpenAI and OpenAI-compatible endpoints
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> LLMResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::config("OpenAI API key is not set"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LLMError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn build_request(&self, prompt: &str, format: ResponseFormat) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: PromptTemplates::system().to_string() },
                ChatMessage { role: "user".to_string(), content: prompt.to_string() },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormatSpec { kind: format.as_openai_type().to_string() },
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAIProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &str, format: ResponseFormat) -> LLMResult<String> {
        let request = self.build_request(prompt, format);
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::from_status(PROVIDER, status.as_u16(), body, retry_after));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        if let Some(usage) = &completion.usage {
            debug!(
                model = %self.config.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "OpenAI completion"
            );
        }

        first_choice_content(completion)
    }
}

/// Parse a `Retry-After` header given in seconds
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn first_choice_content(completion: ChatCompletionResponse) -> LLMResult<String> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LLMError::empty_reply("OpenAI returned no content"))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    response_format: ResponseFormatSpec,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormatSpec {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
