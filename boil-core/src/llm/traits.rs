//! Traits for text-generation providers
//!
//! Stages only ever talk to a [`TextGenerator`]; which service sits behind it
//! is decided when a run's collaborators are built.

use crate::llm::errors::LLMResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape the caller expects the reply to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text
    Text,
    /// A single JSON object
    Json,
}

impl ResponseFormat {
    /// Value for OpenAI-style `response_format.type`
    pub fn as_openai_type(self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::Json => "json_object",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFormat::Text => write!(f, "text"),
            ResponseFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Core trait for text-generation providers
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Get the model ID being used
    fn model(&self) -> &str;

    /// Complete a single prompt
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> LLMResult<String>;
}
