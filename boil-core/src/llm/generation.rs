//! Typed generation calls used by the pipeline stages
//!
//! Each helper builds its prompt, calls the run's [`TextGenerator`] and turns
//! the raw reply into the value the stage stores.

use super::errors::{LLMError, LLMResult};
use super::prompts::PromptTemplates;
use super::traits::{ResponseFormat, TextGenerator};
use crate::fs::FileOperation;
use regex_utils::reply;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct OperationsReply {
    operations: Vec<FileOperation>,
}

#[derive(Debug, Deserialize)]
struct FilesReply {
    files: Vec<String>,
}

/// Expand the request description into project details
pub async fn project_details(generator: &dyn TextGenerator, description: &str) -> LLMResult<String> {
    let prompt = PromptTemplates::project_details(description);
    text_call(generator, &prompt, "project details").await
}

/// Produce the text file tree for the project
pub async fn file_tree(generator: &dyn TextGenerator, project_details: &str) -> LLMResult<String> {
    let prompt = PromptTemplates::file_tree(project_details);
    text_call(generator, &prompt, "file tree").await
}

/// Produce the ordered directory/file creation plan
pub async fn file_operations(
    generator: &dyn TextGenerator,
    project_details: &str,
    file_tree: &str,
) -> LLMResult<Vec<FileOperation>> {
    let prompt = PromptTemplates::file_operations(project_details, file_tree);
    let raw = generator.complete(&prompt, ResponseFormat::Json).await?;
    parse_operations(&raw)
}

/// Produce the order in which file contents are generated
pub async fn file_order(generator: &dyn TextGenerator, file_tree: &str) -> LLMResult<Vec<String>> {
    let prompt = PromptTemplates::file_order(file_tree);
    let raw = generator.complete(&prompt, ResponseFormat::Json).await?;
    parse_file_order(&raw)
}

/// Generate one file's content.
///
/// `.json` files are requested in structured form so the reply is a single
/// valid document.
pub async fn file_content(
    generator: &dyn TextGenerator,
    path: &str,
    project_details: &str,
    file_tree: &str,
    previous_files: &HashMap<String, String>,
) -> LLMResult<String> {
    let prompt = PromptTemplates::file_content(path, project_details, file_tree, previous_files);
    let format = format_for_path(path);
    let raw = generator.complete(&prompt, format).await?;

    let content = reply::strip_code_fence(&raw);
    if content.is_empty() {
        return Err(LLMError::empty_reply(format!("content for {}", path)));
    }

    debug!(path, format = %format, bytes = content.len(), "Generated file content");
    Ok(content.to_string())
}

pub async fn gitignore(generator: &dyn TextGenerator, project_details: &str) -> LLMResult<String> {
    text_call(generator, &PromptTemplates::gitignore(project_details), ".gitignore").await
}

pub async fn readme(generator: &dyn TextGenerator, project_details: &str) -> LLMResult<String> {
    text_call(generator, &PromptTemplates::readme(project_details), "README.md").await
}

pub async fn dockerfile(generator: &dyn TextGenerator, project_details: &str) -> LLMResult<String> {
    text_call(generator, &PromptTemplates::dockerfile(project_details), "Dockerfile").await
}

/// Response format a file's content is requested in
pub fn format_for_path(path: &str) -> ResponseFormat {
    if path.to_ascii_lowercase().ends_with(".json") {
        ResponseFormat::Json
    } else {
        ResponseFormat::Text
    }
}

/// Parse a `{"operations": [...]}` reply
pub fn parse_operations(raw: &str) -> LLMResult<Vec<FileOperation>> {
    let parsed: OperationsReply = parse_structured(raw, "file operations")?;
    Ok(parsed.operations)
}

/// Parse a `{"files": [...]}` reply, sanitizing every path.
///
/// Blank entries and duplicates are dropped; the first occurrence keeps its
/// position.
pub fn parse_file_order(raw: &str) -> LLMResult<Vec<String>> {
    let parsed: FilesReply = parse_structured(raw, "file order")?;

    let mut seen = HashSet::new();
    Ok(parsed
        .files
        .iter()
        .filter_map(|p| sanitize_order_path(p))
        .filter(|p| seen.insert(p.clone()))
        .collect())
}

/// Strip leading `/` and any `.`/`..` components from a path in the order
/// list; `None` when nothing is left
pub fn sanitize_order_path(path: &str) -> Option<String> {
    let cleaned = path
        .trim()
        .replace('\\', "/")
        .split('/')
        .filter(|part| !matches!(*part, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/");

    if cleaned.is_empty() { None } else { Some(cleaned) }
}

async fn text_call(generator: &dyn TextGenerator, prompt: &str, what: &str) -> LLMResult<String> {
    let raw = generator.complete(prompt, ResponseFormat::Text).await?;
    let text = reply::strip_code_fence(&raw);
    if text.is_empty() {
        return Err(LLMError::empty_reply(what));
    }
    debug!(what, bytes = text.len(), "Generated text");
    Ok(text.to_string())
}

fn parse_structured<T: DeserializeOwned>(raw: &str, expected: &str) -> LLMResult<T> {
    let body = reply::strip_code_fence(raw);
    if body.is_empty() {
        return Err(LLMError::empty_reply(expected));
    }

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(first) => reply::json_object(body)
            .and_then(|inner| serde_json::from_str(inner).ok())
            .ok_or_else(|| LLMError::unparseable(expected, first.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::OperationKind;
    use crate::llm::mock::MockGenerator;

    #[test]
    fn test_parse_operations() {
        let ops = parse_operations(
            r#"{"operations": [{"operation": "CREATE_DIR", "path": "src"}, {"operation": "CREATE_FILE", "path": "src/index.js"}]}"#,
        )
        .unwrap();

        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].operation, OperationKind::CreateDir);
        assert_eq!(ops[1].path, "src/index.js");
    }

    #[test]
    fn test_parse_operations_in_fence_and_prose() {
        let fenced = "```json\n{\"operations\": [{\"operation\": \"CREATE_DIR\", \"path\": \"a\"}]}\n```";
        assert_eq!(parse_operations(fenced).unwrap().len(), 1);

        let prose = "Sure! {\"operations\": []} Hope this helps.";
        assert!(parse_operations(prose).unwrap().is_empty());
    }

    #[test]
    fn test_parse_operations_wrong_key() {
        let err = parse_operations(r#"{"ops": []}"#).unwrap_err();
        assert!(matches!(err, LLMError::UnparseableReply { .. }));
    }

    #[test]
    fn test_parse_file_order_sanitizes() {
        let files = parse_file_order(
            r#"{"files": ["/package.json", "./src/../src/index.js", "  ", "..", "package.json"]}"#,
        )
        .unwrap();
        assert_eq!(files, vec!["package.json", "src/src/index.js"]);
    }

    #[test]
    fn test_format_for_path() {
        assert_eq!(format_for_path("package.json"), ResponseFormat::Json);
        assert_eq!(format_for_path("config/App.JSON"), ResponseFormat::Json);
        assert_eq!(format_for_path("src/main.go"), ResponseFormat::Text);
    }

    #[tokio::test]
    async fn test_file_content_empty_reply() {
        let mock = MockGenerator::new();
        mock.push_reply("   ");

        let err = file_content(&mock, "main.go", "d", "t", &HashMap::new()).await.unwrap_err();
        assert!(matches!(err, LLMError::EmptyReply { ref context } if context.contains("main.go")));
    }

    #[tokio::test]
    async fn test_file_content_uses_json_format_for_json_files() {
        let mock = MockGenerator::new();
        mock.push_reply("{\"name\": \"demo\"}");

        let content = file_content(&mock, "package.json", "d", "t", &HashMap::new()).await.unwrap();
        assert_eq!(content, "{\"name\": \"demo\"}");
        assert_eq!(mock.calls()[0].format, ResponseFormat::Json);
    }

    #[tokio::test]
    async fn test_text_call_strips_fence() {
        let mock = MockGenerator::new();
        mock.push_reply("```dockerfile\nFROM node:20\n```");

        assert_eq!(dockerfile(&mock, "d").await.unwrap(), "FROM node:20");
    }
}
