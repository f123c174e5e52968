use super::stage::StageId;
use super::state::OptionalComponent;
use crate::fs::FileStoreError;
use crate::llm::LLMError;
use thiserror::Error;

/// Failure inside a single stage
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] LLMError),

    #[error(transparent)]
    FileStore(#[from] FileStoreError),

    #[error("Failed to generate content for {path}: {source}")]
    FileContent {
        path: String,
        #[source]
        source: LLMError,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: String,
        #[source]
        source: FileStoreError,
    },

    #[error("Generated {what} is empty")]
    EmptyPlan { what: &'static str },

    #[error("Failed to create {component}: {source}")]
    OptionalComponent {
        component: OptionalComponent,
        #[source]
        source: Box<StageError>,
    },
}

/// Why a pipeline run did not reach [`StageId::Done`]
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source}")]
    Stage {
        stage: StageId,
        #[source]
        source: StageError,
    },

    #[error("Cancelled before {stage}")]
    Cancelled { stage: StageId },

    #[error("No stage registered for '{stage}'")]
    MissingStage { stage: StageId },

    #[error("Failed to prepare run: {0}")]
    Setup(String),

    #[error("Engine stopped before the request ran")]
    EngineStopped,

    #[error("Run aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Stage the failure is attributed to, if any
    pub fn stage(&self) -> Option<StageId> {
        match self {
            PipelineError::Stage { stage, .. }
            | PipelineError::Cancelled { stage }
            | PipelineError::MissingStage { stage } => Some(*stage),
            PipelineError::Setup(_) | PipelineError::EngineStopped | PipelineError::Aborted(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_attribution() {
        let err = PipelineError::Stage {
            stage: StageId::GenerateFileTree,
            source: StageError::Generation(LLMError::unauthorized("invalid OpenAI API key")),
        };
        assert_eq!(err.stage(), Some(StageId::GenerateFileTree));
        assert_eq!(
            err.to_string(),
            "Generating file tree failed: Unauthorized: invalid OpenAI API key"
        );
        assert_eq!(PipelineError::EngineStopped.stage(), None);
    }

    #[test]
    fn test_optional_component_message() {
        let err = StageError::OptionalComponent {
            component: OptionalComponent::Readme,
            source: Box::new(StageError::Generation(LLMError::empty_reply("README.md"))),
        };
        assert_eq!(err.to_string(), "Failed to create README.md: Empty reply: README.md");
    }
}
