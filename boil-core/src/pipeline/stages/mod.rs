//! Stage handlers and the registry binding them to a run

mod contents;
mod details;
mod files;
mod optional;

use super::error::StageError;
use super::stage::StageId;
use super::state::ExecutionState;
use crate::llm::TextGenerator;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One unit of pipeline work, bound to the run's text generator
pub enum Stage {
    GenerateProjectDetails(Arc<dyn TextGenerator>),
    GenerateFileTree(Arc<dyn TextGenerator>),
    GenerateFileOperations(Arc<dyn TextGenerator>),
    ExecuteFileOperations,
    DetermineFileOrder(Arc<dyn TextGenerator>),
    GenerateFileContents(Arc<dyn TextGenerator>),
    CreateOptionalComponents(Arc<dyn TextGenerator>),
    Done,
}

impl Stage {
    /// Build the handler for `id`
    pub fn for_id(id: StageId, generator: Arc<dyn TextGenerator>) -> Self {
        match id {
            StageId::GenerateProjectDetails => Stage::GenerateProjectDetails(generator),
            StageId::GenerateFileTree => Stage::GenerateFileTree(generator),
            StageId::GenerateFileOperations => Stage::GenerateFileOperations(generator),
            StageId::ExecuteFileOperations => Stage::ExecuteFileOperations,
            StageId::DetermineFileOrder => Stage::DetermineFileOrder(generator),
            StageId::GenerateFileContents => Stage::GenerateFileContents(generator),
            StageId::CreateOptionalComponents => Stage::CreateOptionalComponents(generator),
            StageId::Done => Stage::Done,
        }
    }

    pub fn id(&self) -> StageId {
        match self {
            Stage::GenerateProjectDetails(_) => StageId::GenerateProjectDetails,
            Stage::GenerateFileTree(_) => StageId::GenerateFileTree,
            Stage::GenerateFileOperations(_) => StageId::GenerateFileOperations,
            Stage::ExecuteFileOperations => StageId::ExecuteFileOperations,
            Stage::DetermineFileOrder(_) => StageId::DetermineFileOrder,
            Stage::GenerateFileContents(_) => StageId::GenerateFileContents,
            Stage::CreateOptionalComponents(_) => StageId::CreateOptionalComponents,
            Stage::Done => StageId::Done,
        }
    }

    /// Run the stage against the shared state
    pub async fn execute(&self, state: &mut ExecutionState) -> Result<(), StageError> {
        match self {
            Stage::GenerateProjectDetails(generator) => {
                details::generate_project_details(generator.as_ref(), state).await
            }
            Stage::GenerateFileTree(generator) => {
                details::generate_file_tree(generator.as_ref(), state).await
            }
            Stage::GenerateFileOperations(generator) => {
                files::generate_file_operations(generator.as_ref(), state).await
            }
            Stage::ExecuteFileOperations => files::execute_file_operations(state),
            Stage::DetermineFileOrder(generator) => {
                files::determine_file_order(generator.as_ref(), state).await
            }
            Stage::GenerateFileContents(generator) => {
                contents::generate_file_contents(generator.as_ref(), state).await
            }
            Stage::CreateOptionalComponents(generator) => {
                optional::create_optional_components(generator.as_ref(), state).await
            }
            Stage::Done => Ok(()),
        }
    }
}

/// Stage handlers of one run, keyed by identity
pub struct StageRegistry {
    stages: BTreeMap<StageId, Stage>,
}

impl StageRegistry {
    /// Bind a handler for every identity to `generator`
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        let stages = StageId::ALL
            .into_iter()
            .map(|id| (id, Stage::for_id(id, Arc::clone(&generator))))
            .collect();
        Self { stages }
    }

    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(&id)
    }

    /// Unregister a handler; the pipeline then fails when it reaches `id`
    pub fn remove(&mut self, id: StageId) -> Option<Stage> {
        self.stages.remove(&id)
    }

    pub fn ordered_identities(&self) -> &'static [StageId] {
        &StageId::ALL
    }
}
