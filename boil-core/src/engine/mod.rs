//! Concurrent execution engine
//!
//! A fixed pool of workers takes requests from one bounded queue. Every
//! request runs its own pipeline with freshly built collaborators and has
//! its outcome delivered to a single-use [`ResultSlot`].

pub mod factory;
pub mod request;

pub use factory::{CollaboratorFactory, ProviderFactory};
pub use request::{ExecutionRequest, GeneratedProject, ResultSlot, RunOutcome};

use crate::pipeline::{ExecutionState, Pipeline, PipelineError, StageId, StageRegistry};
use crate::publisher::ProgressPublisher;
use crate::request::{GenerationRequest, RequestError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Worker pool size must be at least 1")]
    NoWorkers,

    #[error("Engine has already been started")]
    AlreadyStarted,

    #[error("Engine is not accepting requests ({0:?})")]
    NotRunning(EngineState),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("Engine was cancelled")]
    Cancelled,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of queued requests before `submit` waits
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { queue_capacity: DEFAULT_QUEUE_CAPACITY }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Running,
    ShuttingDown,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker exited within the timeout
    Clean,
    /// Some workers were still busy; their runs keep going
    TimedOut,
}

/// Bounded worker pool executing generation pipelines
pub struct Engine {
    config: EngineConfig,
    factory: Arc<dyn CollaboratorFactory>,
    publisher: Arc<dyn ProgressPublisher>,
    sender: RwLock<Option<mpsc::Sender<ExecutionRequest>>>,
    receiver: Arc<Mutex<mpsc::Receiver<ExecutionRequest>>>,
    state: RwLock<EngineState>,
    workers: Mutex<JoinSet<()>>,
    shutdown: CancellationToken,
    cancel: OnceLock<CancellationToken>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        factory: Arc<dyn CollaboratorFactory>,
        publisher: Arc<dyn ProgressPublisher>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        Self {
            config,
            factory,
            publisher,
            sender: RwLock::new(Some(sender)),
            receiver: Arc::new(Mutex::new(receiver)),
            state: RwLock::new(EngineState::Idle),
            workers: Mutex::new(JoinSet::new()),
            shutdown: CancellationToken::new(),
            cancel: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Spawn exactly `pool_size` workers sharing `cancel`
    pub async fn start(&self, pool_size: usize, cancel: CancellationToken) -> Result<(), EngineError> {
        if pool_size == 0 {
            return Err(EngineError::NoWorkers);
        }

        let mut state = self.state.write().await;
        if *state != EngineState::Idle {
            return Err(EngineError::AlreadyStarted);
        }

        let mut workers = self.workers.lock().await;
        for worker_id in 0..pool_size {
            let worker = Worker {
                id: worker_id,
                receiver: Arc::clone(&self.receiver),
                factory: Arc::clone(&self.factory),
                publisher: Arc::clone(&self.publisher),
                cancel: cancel.clone(),
                shutdown: self.shutdown.clone(),
            };
            workers.spawn(worker.run());
        }

        let _ = self.cancel.set(cancel);
        *state = EngineState::Running;
        info!("Engine started with {} workers", pool_size);
        Ok(())
    }

    /// Queue a request, waiting while the queue is full.
    ///
    /// Rejected once the token passed to [`Engine::start`] is cancelled.
    pub async fn submit(&self, request: GenerationRequest) -> Result<ResultSlot, EngineError> {
        request.validate()?;

        let state = self.state().await;
        if state != EngineState::Running {
            return Err(EngineError::NotRunning(state));
        }
        if self.cancel.get().is_some_and(CancellationToken::is_cancelled) {
            return Err(EngineError::Cancelled);
        }

        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or(EngineError::NotRunning(EngineState::ShuttingDown))?;

        let (execution, slot) = ExecutionRequest::new(Arc::new(request));
        debug!(run_id = %execution.id, "Queueing request");

        sender
            .send(execution)
            .await
            .map_err(|_| EngineError::NotRunning(EngineState::ShuttingDown))?;
        Ok(slot)
    }

    /// Stop accepting work and wait up to `timeout` for the workers.
    ///
    /// In-flight runs are never aborted: on timeout they keep going and still
    /// resolve their slots. Requests still queued resolve with
    /// [`PipelineError::EngineStopped`].
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownOutcome {
        {
            let mut state = self.state.write().await;
            match *state {
                EngineState::Running => *state = EngineState::ShuttingDown,
                EngineState::Idle => *state = EngineState::ShuttingDown,
                EngineState::ShuttingDown | EngineState::Stopped => return ShutdownOutcome::Clean,
            }
        }

        info!("Shutting down engine");
        self.shutdown.cancel();
        self.sender.write().await.take();

        let mut workers = self.workers.lock().await;
        let joined = tokio::time::timeout(timeout, async {
            while let Some(result) = workers.join_next().await {
                if let Err(e) = result {
                    error!("Worker exited abnormally: {}", e);
                }
            }
        })
        .await;

        let outcome = match joined {
            Ok(()) => ShutdownOutcome::Clean,
            Err(_) => {
                warn!("Timed out after {:?} waiting for {} busy workers", timeout, workers.len());
                workers.detach_all();
                ShutdownOutcome::TimedOut
            }
        };
        drop(workers);

        let drained = self.drain_queue().await;
        if drained > 0 {
            info!("Discarded {} queued requests", drained);
        }

        *self.state.write().await = EngineState::Stopped;
        outcome
    }

    async fn drain_queue(&self) -> usize {
        let mut receiver = self.receiver.lock().await;
        receiver.close();

        let mut drained = 0;
        while let Ok(execution) = receiver.try_recv() {
            execution.resolve(Err(PipelineError::EngineStopped));
            drained += 1;
        }
        drained
    }
}

struct Worker {
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<ExecutionRequest>>>,
    factory: Arc<dyn CollaboratorFactory>,
    publisher: Arc<dyn ProgressPublisher>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(self) {
        debug!("Worker {} started", self.id);

        loop {
            let next = tokio::select! {
                biased;
                // Cancellation keeps the worker dequeuing so queued slots resolve
                _ = self.shutdown.cancelled() => break,
                next = async { self.receiver.lock().await.recv().await } => next,
            };

            let Some(execution) = next else { break };
            self.handle(execution).await;
        }

        debug!("Worker {} stopped", self.id);
    }

    async fn handle(&self, execution: ExecutionRequest) {
        let run_id = execution.id;
        let queued_ms = (Utc::now() - execution.created_at).num_milliseconds();
        info!(%run_id, worker = self.id, queued_ms, "Picked up request");

        if self.cancel.is_cancelled() {
            execution.resolve(Err(PipelineError::Cancelled { stage: StageId::GenerateProjectDetails }));
            return;
        }

        // Run on its own task so a panicking stage cannot take the worker down
        let run = tokio::spawn(execute_run(
            run_id,
            Arc::clone(&execution.request),
            Arc::clone(&self.factory),
            Arc::clone(&self.publisher),
            self.cancel.clone(),
        ));

        let outcome = match run.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(%run_id, "Run task failed: {}", e);
                Err(PipelineError::Aborted(e.to_string()))
            }
        };

        match &outcome {
            Ok(project) => info!(%run_id, elapsed = ?project.elapsed, "Run succeeded"),
            Err(e) if e.is_cancelled() => info!(%run_id, "Run cancelled"),
            Err(e) => warn!(%run_id, "Run failed: {}", e),
        }
        execution.resolve(outcome);
    }
}

async fn execute_run(
    run_id: Uuid,
    request: Arc<GenerationRequest>,
    factory: Arc<dyn CollaboratorFactory>,
    publisher: Arc<dyn ProgressPublisher>,
    cancel: CancellationToken,
) -> RunOutcome {
    let started = Instant::now();

    let generator = factory
        .text_generator(&request)
        .map_err(|e| PipelineError::Setup(e.to_string()))?;
    let store = factory.file_store(&request).map_err(|e| PipelineError::Setup(e.to_string()))?;

    let state = ExecutionState::new(Arc::clone(&request), store);
    let mut pipeline = Pipeline::new(run_id, state, StageRegistry::new(generator), publisher);
    pipeline.execute(&cancel).await?;

    let state = pipeline.into_state();
    Ok(GeneratedProject {
        run_id,
        project_name: request.formatted_name(),
        store: state.store,
        files_generated: state.generated_files,
        optional_components: state.optional_components,
        elapsed: started.elapsed(),
    })
}
