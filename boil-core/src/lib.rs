//! Core functionality for boil
//!
//! This crate turns a one-line project description into a complete project
//! skeleton by driving a text-generation service through a fixed sequence of
//! stages, and runs many such pipelines concurrently on a bounded worker pool.

pub mod engine;
pub mod fs;
pub mod llm;
pub mod pipeline;
pub mod publisher;
pub mod request;

pub use engine::{
    CollaboratorFactory, Engine, EngineConfig, EngineError, EngineState, GeneratedProject,
    ProviderFactory, ResultSlot, RunOutcome, ShutdownOutcome,
};
pub use pipeline::{PipelineError, StageId};
pub use publisher::{ChannelPublisher, NullPublisher, ProgressEvent, ProgressPublisher, ProgressReceiver};
pub use request::GenerationRequest;
