use crate::llm::{TextGenerator, generation};
use crate::pipeline::error::StageError;
use crate::pipeline::state::{ExecutionState, OptionalComponent};
use tracing::{debug, info};

/// Create the requested optional components in their fixed order.
///
/// Components that were not requested make no generator calls and no
/// writes. The first failure stops the stage.
pub(super) async fn create_optional_components(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    for component in OptionalComponent::ALL {
        if !component.is_requested(&state.request) {
            debug!(%component, "Not requested");
            continue;
        }

        create_component(generator, state, component)
            .await
            .map_err(|source| StageError::OptionalComponent { component, source: Box::new(source) })?;

        info!("Created {}", component);
        state.optional_components.push(component);
    }

    Ok(())
}

async fn create_component(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
    component: OptionalComponent,
) -> Result<(), StageError> {
    let details = &state.project_details;
    let (file_name, content) = match component {
        OptionalComponent::GitRepo => {
            state.store.init_vcs()?;
            return Ok(());
        }
        OptionalComponent::GitIgnore => (".gitignore", generation::gitignore(generator, details).await?),
        OptionalComponent::Readme => ("README.md", generation::readme(generator, details).await?),
        OptionalComponent::Dockerfile => ("Dockerfile", generation::dockerfile(generator, details).await?),
    };

    state.store.write_file(file_name, &content)?;
    Ok(())
}
