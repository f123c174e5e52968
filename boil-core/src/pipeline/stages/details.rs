use crate::llm::{TextGenerator, generation};
use crate::pipeline::error::StageError;
use crate::pipeline::state::ExecutionState;
use tracing::debug;

pub(super) async fn generate_project_details(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    let details = generation::project_details(generator, &state.request.description).await?;
    debug!(bytes = details.len(), "Project details ready");
    state.project_details = details;
    Ok(())
}

pub(super) async fn generate_file_tree(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    let tree = generation::file_tree(generator, &state.project_details).await?;
    debug!(lines = tree.lines().count(), "File tree ready");
    state.file_tree = tree;
    Ok(())
}
