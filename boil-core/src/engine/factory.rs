//! Per-run collaborator construction

use crate::fs::{FileStore, FileStoreError, MemoryFileStore};
use crate::llm::{
    ClaudeConfig, ClaudeProvider, LLMError, OpenAIConfig, OpenAIProvider, TextGenerator,
    is_claude_model,
};
use crate::request::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Builds a fresh text generator and file store for every run
pub trait CollaboratorFactory: Send + Sync {
    fn text_generator(&self, request: &GenerationRequest) -> Result<Arc<dyn TextGenerator>, LLMError>;

    fn file_store(&self, request: &GenerationRequest) -> Result<Box<dyn FileStore>, FileStoreError>;
}

/// Default factory: HTTP providers chosen by model name, in-memory stores
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderFactory {
    /// Override for OpenAI-compatible endpoints
    pub openai_base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl CollaboratorFactory for ProviderFactory {
    fn text_generator(&self, request: &GenerationRequest) -> Result<Arc<dyn TextGenerator>, LLMError> {
        if is_claude_model(&request.model) {
            let defaults = ClaudeConfig::default();
            let config = ClaudeConfig {
                api_key: request.api_key.clone(),
                model: request.model.clone(),
                timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
                ..defaults
            };
            return Ok(Arc::new(ClaudeProvider::new(config)?));
        }

        let defaults = OpenAIConfig::default();
        let config = OpenAIConfig {
            api_key: request.api_key.clone(),
            model: request.model.clone(),
            base_url: self.openai_base_url.clone().unwrap_or(defaults.base_url.clone()),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            ..defaults
        };
        Ok(Arc::new(OpenAIProvider::new(config)?))
    }

    fn file_store(&self, _request: &GenerationRequest) -> Result<Box<dyn FileStore>, FileStoreError> {
        Ok(Box::new(MemoryFileStore::new()))
    }
}
