//! Text-generation integration
//!
//! Stages depend only on [`TextGenerator`]. The concrete providers talk to
//! OpenAI-style chat completions and to Anthropic's messages API.

pub mod claude;
pub mod errors;
pub mod generation;
#[cfg(test)]
pub mod mock;
pub mod openai;
pub mod prompts;
pub mod traits;

pub use claude::{ClaudeConfig, ClaudeProvider};
pub use errors::{LLMError, LLMResult};
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use traits::{ResponseFormat, TextGenerator};

/// Whether `model` names one of Anthropic's models
pub fn is_claude_model(model: &str) -> bool {
    model.trim().to_ascii_lowercase().starts_with("claude")
}
