//! Generation pipeline
//!
//! A [`Pipeline`] runs every stage of one request in canonical order over a
//! single [`ExecutionState`], reporting each transition to a
//! [`ProgressPublisher`]. It stops at the first failure or when cancelled.

pub mod error;
pub mod stage;
pub mod stages;
pub mod state;

pub use error::{PipelineError, StageError};
pub use stage::StageId;
pub use stages::{Stage, StageRegistry};
pub use state::{ExecutionState, OptionalComponent};

use crate::publisher::ProgressPublisher;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Ordered execution of the stages of one run
pub struct Pipeline {
    run_id: Uuid,
    state: ExecutionState,
    registry: StageRegistry,
    publisher: Arc<dyn ProgressPublisher>,
}

impl Pipeline {
    pub fn new(
        run_id: Uuid,
        state: ExecutionState,
        registry: StageRegistry,
        publisher: Arc<dyn ProgressPublisher>,
    ) -> Self {
        Self { run_id, state, registry, publisher }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Run every stage in order.
    ///
    /// `cancel` is checked before each stage; a cancelled run publishes no
    /// event. A missing or failing stage publishes one error event and ends
    /// the run with nothing after it executed.
    pub async fn execute(&mut self, cancel: &CancellationToken) -> Result<(), PipelineError> {
        let run_id = self.run_id;
        info!(%run_id, project = %self.state.request.project_name, "Starting pipeline");

        for &id in self.registry.ordered_identities() {
            if cancel.is_cancelled() {
                info!(%run_id, stage = %id, "Pipeline cancelled");
                return Err(PipelineError::Cancelled { stage: id });
            }

            let Some(stage) = self.registry.get(id) else {
                let err = PipelineError::MissingStage { stage: id };
                error!(%run_id, "{}", err);
                self.publisher.publish_error(run_id, id, &err);
                return Err(err);
            };

            debug!(%run_id, stage = %id, "Entering stage");
            let started = Instant::now();

            if let Err(source) = stage.execute(&mut self.state).await {
                let err = PipelineError::Stage { stage: id, source };
                error!(%run_id, "{}", err);
                self.publisher.publish_error(run_id, id, &err);
                return Err(err);
            }

            debug!(
                %run_id,
                stage = %id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                next = ?id.next(),
                "Stage complete"
            );
            self.publisher.publish_step(run_id, id);
        }

        info!(%run_id, files = self.state.generated_files.len(), "Pipeline finished");
        Ok(())
    }

    /// Hand back the state once the run is over
    pub fn into_state(self) -> ExecutionState {
        self.state
    }
}
