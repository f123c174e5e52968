//! Queued requests and their result slots

use crate::fs::FileStore;
use crate::pipeline::{OptionalComponent, PipelineError};
use crate::request::GenerationRequest;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;
use uuid::Uuid;

/// Authoritative outcome of one run
pub type RunOutcome = Result<GeneratedProject, PipelineError>;

/// A project produced by a successful run
pub struct GeneratedProject {
    pub run_id: Uuid,
    /// Directory-safe project name
    pub project_name: String,
    pub store: Box<dyn FileStore>,
    /// Paths whose content was generated, in generation order
    pub files_generated: Vec<String>,
    pub optional_components: Vec<OptionalComponent>,
    pub elapsed: Duration,
}

impl fmt::Debug for GeneratedProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedProject")
            .field("run_id", &self.run_id)
            .field("project_name", &self.project_name)
            .field("files_generated", &self.files_generated)
            .field("optional_components", &self.optional_components)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

/// A request waiting in the engine queue together with its reply channel
pub struct ExecutionRequest {
    pub id: Uuid,
    pub request: Arc<GenerationRequest>,
    pub created_at: DateTime<Utc>,
    reply: oneshot::Sender<RunOutcome>,
}

impl ExecutionRequest {
    /// Create a request and the slot its outcome will arrive in
    pub fn new(request: Arc<GenerationRequest>) -> (Self, ResultSlot) {
        let (reply, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        (Self { id, request, created_at: Utc::now(), reply }, ResultSlot { run_id: id, receiver })
    }

    /// Deliver the outcome. Consumes the request, so it happens at most once.
    pub fn resolve(self, outcome: RunOutcome) {
        if self.reply.send(outcome).is_err() {
            debug!(run_id = %self.id, "Result slot dropped before the outcome arrived");
        }
    }
}

impl fmt::Debug for ExecutionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionRequest")
            .field("id", &self.id)
            .field("request", &self.request)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Single-use receiver for one run's outcome
#[derive(Debug)]
pub struct ResultSlot {
    run_id: Uuid,
    receiver: oneshot::Receiver<RunOutcome>,
}

impl ResultSlot {
    /// Id carried by every progress event of this run
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the outcome.
    ///
    /// If the request is discarded without an outcome this resolves to
    /// [`PipelineError::EngineStopped`] instead of waiting forever.
    pub async fn wait(self) -> RunOutcome {
        self.receiver.await.unwrap_or(Err(PipelineError::EngineStopped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropped_request_resolves_to_engine_stopped() {
        let (request, slot) = ExecutionRequest::new(Arc::new(GenerationRequest::new("x")));
        assert_eq!(slot.run_id(), request.id);

        drop(request);
        assert!(matches!(slot.wait().await, Err(PipelineError::EngineStopped)));
    }

    #[tokio::test]
    async fn test_resolve_delivers_once() {
        let (request, slot) = ExecutionRequest::new(Arc::new(GenerationRequest::new("x")));
        request.resolve(Err(PipelineError::Setup("no key".to_string())));

        assert!(matches!(slot.wait().await, Err(PipelineError::Setup(_))));
    }
}
