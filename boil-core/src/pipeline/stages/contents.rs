use crate::llm::{TextGenerator, generation};
use crate::pipeline::error::StageError;
use crate::pipeline::state::ExecutionState;
use tracing::{debug, info};

/// Generate and write every ordered file.
///
/// Each call sees the contents of all files generated before it. The first
/// failure stops the stage; files already written stay in the store.
pub(super) async fn generate_file_contents(
    generator: &dyn TextGenerator,
    state: &mut ExecutionState,
) -> Result<(), StageError> {
    let order = state.file_order.clone();

    for path in order {
        if state.store.is_dir(&path) {
            debug!(path = %path, "Skipping directory in file order");
            continue;
        }

        let content = generation::file_content(
            generator,
            &path,
            &state.project_details,
            &state.file_tree,
            &state.previous_files,
        )
        .await
        .map_err(|source| StageError::FileContent { path: path.clone(), source })?;

        state
            .store
            .write_file(&path, &content)
            .map_err(|source| StageError::WriteFile { path: path.clone(), source })?;

        info!("Generated {}", path);
        state.previous_files.insert(path.clone(), content);
        state.generated_files.push(path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{FileStore, MemoryFileStore};
    use crate::llm::mock::{MockGenerator, requested_path};
    use crate::llm::{LLMError, ResponseFormat};
    use crate::request::GenerationRequest;
    use std::sync::Arc;

    fn state(order: &[&str]) -> ExecutionState {
        let mut state =
            ExecutionState::new(Arc::new(GenerationRequest::new("x")), Box::new(MemoryFileStore::new()));
        state.file_order = order.iter().map(|p| p.to_string()).collect();
        state
    }

    #[tokio::test]
    async fn test_earlier_files_feed_later_prompts() {
        let mock = MockGenerator::with_responder(|prompt, _| {
            Ok(format!("export const {} = 1;", requested_path(prompt).unwrap_or("?").replace(".js", "")))
        });

        let mut state = state(&["a.js", "b.js"]);
        generate_file_contents(&mock, &mut state).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].prompt.contains("export const b"));
        assert!(calls[0].prompt.contains("No previous files created."));
        assert!(calls[1].prompt.contains("// file: a.js\nexport const a = 1;"));

        assert_eq!(state.generated_files, vec!["a.js", "b.js"]);
        assert_eq!(state.store.read_file("b.js").unwrap(), "export const b = 1;");
        assert_eq!(state.previous_files.len(), 2);
    }

    #[tokio::test]
    async fn test_directories_are_skipped() {
        let mock = MockGenerator::new();
        mock.push_reply("{\"name\": \"demo\"}");

        let mut state = state(&["src", "package.json"]);
        state.store.create_dir_all("src").unwrap();
        generate_file_contents(&mock, &mut state).await.unwrap();

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, ResponseFormat::Json);
        assert_eq!(state.generated_files, vec!["package.json"]);
    }

    #[tokio::test]
    async fn test_failure_keeps_written_files() {
        let mock = MockGenerator::new();
        mock.push_reply("first");
        mock.push_error(LLMError::server("openai", 500));

        let mut state = state(&["one.txt", "two.txt", "three.txt"]);
        let err = generate_file_contents(&mock, &mut state).await.unwrap_err();

        assert!(matches!(err, StageError::FileContent { ref path, .. } if path == "two.txt"));
        assert_eq!(state.store.read_file("one.txt").unwrap(), "first");
        assert!(!state.store.exists("three.txt"));
        assert_eq!(mock.call_count(), 2);
    }
}
