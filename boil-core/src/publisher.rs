//! Progress reporting for pipeline runs
//!
//! Publishing never blocks a run. Events that do not fit are dropped, so the
//! event stream is advisory; a run's result slot is the authoritative outcome.

use crate::pipeline::{PipelineError, StageId};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use uuid::Uuid;

pub const DEFAULT_STEP_CAPACITY: usize = 100;
pub const DEFAULT_ERROR_CAPACITY: usize = 10;

/// Observer of stage transitions
pub trait ProgressPublisher: Send + Sync {
    /// Report that `stage` of run `run_id` completed
    fn publish_step(&self, run_id: Uuid, stage: StageId);

    /// Report that run `run_id` failed at `stage`
    fn publish_error(&self, run_id: Uuid, stage: StageId, error: &PipelineError);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Completed { run_id: Uuid, stage: StageId },
    Failed { run_id: Uuid, stage: StageId, message: String },
}

impl ProgressEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            ProgressEvent::Completed { run_id, .. } | ProgressEvent::Failed { run_id, .. } => *run_id,
        }
    }

    pub fn stage(&self) -> StageId {
        match self {
            ProgressEvent::Completed { stage, .. } | ProgressEvent::Failed { stage, .. } => *stage,
        }
    }
}

/// Publisher backed by two bounded channels, one for steps and one for errors
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    steps: mpsc::Sender<ProgressEvent>,
    errors: mpsc::Sender<ProgressEvent>,
}

/// Receiving half of a [`ChannelPublisher`]
#[derive(Debug)]
pub struct ProgressReceiver {
    pub steps: mpsc::Receiver<ProgressEvent>,
    pub errors: mpsc::Receiver<ProgressEvent>,
}

impl ChannelPublisher {
    /// Create a publisher with the default capacities (100 steps, 10 errors)
    pub fn new() -> (Self, ProgressReceiver) {
        Self::with_capacity(DEFAULT_STEP_CAPACITY, DEFAULT_ERROR_CAPACITY)
    }

    pub fn with_capacity(step_capacity: usize, error_capacity: usize) -> (Self, ProgressReceiver) {
        let (steps_tx, steps_rx) = mpsc::channel(step_capacity.max(1));
        let (errors_tx, errors_rx) = mpsc::channel(error_capacity.max(1));
        (
            Self { steps: steps_tx, errors: errors_tx },
            ProgressReceiver { steps: steps_rx, errors: errors_rx },
        )
    }

    fn offer(channel: &mpsc::Sender<ProgressEvent>, kind: &str, event: ProgressEvent) {
        match channel.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    run_id = %event.run_id(),
                    stage = %event.stage(),
                    "{} channel full, dropping event",
                    kind
                );
            }
            Err(TrySendError::Closed(event)) => {
                debug!(run_id = %event.run_id(), "{} receiver gone, dropping event", kind);
            }
        }
    }
}

impl ProgressPublisher for ChannelPublisher {
    fn publish_step(&self, run_id: Uuid, stage: StageId) {
        Self::offer(&self.steps, "Step", ProgressEvent::Completed { run_id, stage });
    }

    fn publish_error(&self, run_id: Uuid, stage: StageId, error: &PipelineError) {
        let event = ProgressEvent::Failed { run_id, stage, message: error.to_string() };
        Self::offer(&self.errors, "Error", event);
    }
}

impl ProgressReceiver {
    /// Next event from either channel; `None` once both are closed and empty.
    ///
    /// Steps are drained first: a run's error is always published after its
    /// steps, so this keeps each run's events in stage order.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        tokio::select! {
            biased;
            Some(event) = self.steps.recv() => Some(event),
            Some(event) = self.errors.recv() => Some(event),
            else => None,
        }
    }
}

/// Publisher that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPublisher;

impl ProgressPublisher for NullPublisher {
    fn publish_step(&self, _run_id: Uuid, _stage: StageId) {}

    fn publish_error(&self, _run_id: Uuid, _stage: StageId, _error: &PipelineError) {}
}

/// Publisher that keeps every event in order, for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn events_for(&self, run_id: Uuid) -> Vec<ProgressEvent> {
        self.events().into_iter().filter(|e| e.run_id() == run_id).collect()
    }
}

#[cfg(test)]
impl ProgressPublisher for RecordingPublisher {
    fn publish_step(&self, run_id: Uuid, stage: StageId) {
        self.events.lock().unwrap().push(ProgressEvent::Completed { run_id, stage });
    }

    fn publish_error(&self, run_id: Uuid, stage: StageId, error: &PipelineError) {
        self.events.lock().unwrap().push(ProgressEvent::Failed {
            run_id,
            stage,
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_publisher_delivers() {
        let (publisher, mut receiver) = ChannelPublisher::new();
        let run_id = Uuid::new_v4();

        publisher.publish_step(run_id, StageId::GenerateProjectDetails);
        publisher.publish_error(run_id, StageId::GenerateFileTree, &PipelineError::EngineStopped);

        let step = receiver.steps.recv().await.unwrap();
        assert_eq!(step, ProgressEvent::Completed { run_id, stage: StageId::GenerateProjectDetails });

        let error = receiver.errors.recv().await.unwrap();
        assert!(matches!(error, ProgressEvent::Failed { stage: StageId::GenerateFileTree, .. }));
    }

    #[tokio::test]
    async fn test_recv_keeps_steps_before_errors() {
        for _ in 0..50 {
            let (publisher, mut receiver) = ChannelPublisher::new();
            let run_id = Uuid::new_v4();

            publisher.publish_step(run_id, StageId::GenerateProjectDetails);
            publisher.publish_error(run_id, StageId::GenerateFileTree, &PipelineError::EngineStopped);

            let stages = vec![receiver.recv().await.unwrap().stage(), receiver.recv().await.unwrap().stage()];
            assert_eq!(stages, vec![StageId::GenerateProjectDetails, StageId::GenerateFileTree]);
        }
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (publisher, mut receiver) = ChannelPublisher::with_capacity(2, 1);
        let run_id = Uuid::new_v4();

        for stage in StageId::ALL {
            publisher.publish_step(run_id, stage);
        }

        drop(publisher);
        let mut received = Vec::new();
        while let Some(event) = receiver.recv().await {
            received.push(event.stage());
        }
        assert_eq!(received, vec![StageId::GenerateProjectDetails, StageId::GenerateFileTree]);
    }

    #[test]
    fn test_closed_receiver_is_ignored() {
        let (publisher, receiver) = ChannelPublisher::new();
        drop(receiver);
        publisher.publish_step(Uuid::new_v4(), StageId::Done);
    }

    #[test]
    fn test_event_serialization() {
        let run_id = Uuid::nil();
        let json = serde_json::to_value(ProgressEvent::Completed { run_id, stage: StageId::Done }).unwrap();
        assert_eq!(json["event"], "completed");
        assert_eq!(json["stage"], "done");
    }
}
