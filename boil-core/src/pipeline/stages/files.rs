use crate::fs::apply_operations;
use crate::llm::{TextGenerator, generation};
use crate::pipeline::error::StageError;
use crate::pipeline::state::ExecutionState;
use tracing::{debug, info};

pub(super) async fn generate_file_operations(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    let operations =
        generation::file_operations(generator, &state.project_details, &state.file_tree).await?;
    if operations.is_empty() {
        return Err(StageError::EmptyPlan { what: "file operation list" });
    }

    debug!(count = operations.len(), "File operations planned");
    state.file_operations = operations;
    Ok(())
}

pub(super) fn execute_file_operations(state: &mut ExecutionState) -> Result<(), StageError> {
    apply_operations(state.store.as_mut(), &state.file_operations)?;
    info!("Applied {} file operations", state.file_operations.len());
    Ok(())
}

pub(super) async fn determine_file_order(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    let order = generation::file_order(generator, &state.file_tree).await?;
    if order.is_empty() {
        return Err(StageError::EmptyPlan { what: "file order" });
    }

    debug!(?order, "File order determined");
    state.file_order = order;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileOperation, FileStore, FileStoreError, MemoryFileStore, OperationKind};
    use crate::llm::LLMError;
    use crate::llm::mock::MockGenerator;
    use crate::request::GenerationRequest;
    use std::sync::Arc;

    fn state() -> ExecutionState {
        ExecutionState::new(Arc::new(GenerationRequest::new("x")), Box::new(MemoryFileStore::new()))
    }

    #[tokio::test]
    async fn test_operations_parsed_into_state() {
        let mock = MockGenerator::new();
        mock.push_reply(r#"{"operations": [{"operation": "CREATE_DIR", "path": "src"}]}"#);

        let mut state = state();
        generate_file_operations(&mock, &mut state).await.unwrap();
        assert_eq!(state.file_operations, vec![FileOperation::create_dir("src")]);
    }

    #[tokio::test]
    async fn test_empty_operation_list() {
        let mock = MockGenerator::new();
        mock.push_reply(r#"{"operations": []}"#);

        let err = generate_file_operations(&mock, &mut state()).await.unwrap_err();
        assert!(matches!(err, StageError::EmptyPlan { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_operations() {
        let mock = MockGenerator::new();
        mock.push_reply("I cannot do that");

        let err = generate_file_operations(&mock, &mut state()).await.unwrap_err();
        assert!(matches!(err, StageError::Generation(LLMError::UnparseableReply { .. })));
    }

    #[test]
    fn test_execute_stops_at_unknown_operation() {
        let mut state = state();
        state.file_operations = vec![
            FileOperation::create_dir("src"),
            FileOperation::create_file("src/index.js"),
            FileOperation { operation: OperationKind::Unknown("RENAME".into()), path: "a".into() },
            FileOperation::create_dir("tests"),
        ];

        let err = execute_file_operations(&mut state).unwrap_err();
        assert!(matches!(err, StageError::FileStore(FileStoreError::UnknownOperation { .. })));
        assert!(state.store.is_dir("src"));
        assert!(state.store.exists("src/index.js"));
        assert!(!state.store.exists("tests"));
    }

    #[tokio::test]
    async fn test_file_order_sanitized() {
        let mock = MockGenerator::new();
        mock.push_reply(r#"{"files": ["/package.json", "./src/index.js"]}"#);

        let mut state = state();
        determine_file_order(&mock, &mut state).await.unwrap();
        assert_eq!(state.file_order, vec!["package.json", "src/index.js"]);
    }

    #[tokio::test]
    async fn test_empty_file_order() {
        let mock = MockGenerator::new();
        mock.push_reply(r#"{"files": ["", "/"]}"#);

        let err = determine_file_order(&mock, &mut state()).await.unwrap_err();
        assert!(matches!(err, StageError::EmptyPlan { what: "file order" }));
    }
}
