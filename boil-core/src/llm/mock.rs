//! Scripted text generator for unit tests

use super::errors::{LLMError, LLMResult};
use super::traits::{ResponseFormat, TextGenerator};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

type Responder = Box<dyn Fn(&str, ResponseFormat) -> LLMResult<String> + Send + Sync>;

/// One recorded call
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub format: ResponseFormat,
}

/// Generator that answers from a queue of scripted replies, falling back to
/// a responder function, and records every prompt it sees
pub struct MockGenerator {
    replies: Mutex<VecDeque<LLMResult<String>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<MockCall>>,
    delay: Option<Duration>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            responder: None,
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Answer every unscripted call with `responder`
    pub fn with_responder(
        responder: impl Fn(&str, ResponseFormat) -> LLMResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self { responder: Some(Box::new(responder)), ..Self::new() }
    }

    /// A generator that plans `package.json` and `src/index.js` under `src/`
    /// and answers every content prompt with `content of <path>`
    pub fn project() -> Self {
        Self::with_responder(|prompt, _| Ok(project_reply(prompt)))
    }

    /// Sleep this long before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, error: LLMError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, prompt: &str, format: ResponseFormat) -> LLMResult<String> {
        self.calls.lock().unwrap().push(MockCall { prompt: prompt.to_string(), format });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.replies.lock().unwrap().pop_front();
        match scripted {
            Some(reply) => reply,
            None => match &self.responder {
                Some(responder) => responder(prompt, format),
                None => Ok("mock reply".to_string()),
            },
        }
    }
}

/// Path a file-content prompt asks for
pub fn requested_path(prompt: &str) -> Option<&str> {
    let rest = prompt.strip_prefix("Generate the complete content of \"")?;
    rest.split('"').next()
}

fn project_reply(prompt: &str) -> String {
    if let Some(path) = requested_path(prompt) {
        return format!("content of {}", path);
    }
    if prompt.contains("MUST be named \"operations\"") {
        return r#"{"operations": [
            {"operation": "CREATE_DIR", "path": "src"},
            {"operation": "CREATE_FILE", "path": "src/index.js"},
            {"operation": "CREATE_FILE", "path": "package.json"}
        ]}"#
        .to_string();
    }
    if prompt.contains("MUST be named \"files\"") {
        return r#"{"files": ["package.json", "src/index.js"]}"#.to_string();
    }
    "generated text".to_string()
}
