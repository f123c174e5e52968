//! Mutable state shared by the stages of one run

use crate::fs::{FileOperation, FileStore};
use crate::request::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Artifacts created after the main file contents when toggled on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalComponent {
    GitRepo,
    GitIgnore,
    Readme,
    Dockerfile,
}

impl OptionalComponent {
    /// Creation order
    pub const ALL: [OptionalComponent; 4] = [
        OptionalComponent::GitRepo,
        OptionalComponent::GitIgnore,
        OptionalComponent::Readme,
        OptionalComponent::Dockerfile,
    ];

    /// File the component is written to; the repository has none
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            OptionalComponent::GitRepo => None,
            OptionalComponent::GitIgnore => Some(".gitignore"),
            OptionalComponent::Readme => Some("README.md"),
            OptionalComponent::Dockerfile => Some("Dockerfile"),
        }
    }

    pub fn is_requested(self, request: &GenerationRequest) -> bool {
        match self {
            OptionalComponent::GitRepo => request.git_repo,
            OptionalComponent::GitIgnore => request.git_ignore,
            OptionalComponent::Readme => request.readme,
            OptionalComponent::Dockerfile => request.dockerfile,
        }
    }
}

impl fmt::Display for OptionalComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file_name() {
            Some(name) => f.write_str(name),
            None => f.write_str("git repository"),
        }
    }
}

/// Accumulated results of one pipeline run.
///
/// Each stage reads what earlier stages produced and fills in its own part.
/// `previous_files` only ever grows.
pub struct ExecutionState {
    pub request: Arc<GenerationRequest>,
    pub project_details: String,
    pub file_tree: String,
    pub file_operations: Vec<FileOperation>,
    pub file_order: Vec<String>,
    pub previous_files: HashMap<String, String>,
    pub store: Box<dyn FileStore>,
    /// Paths whose content was generated, in generation order
    pub generated_files: Vec<String>,
    /// Optional components actually produced
    pub optional_components: Vec<OptionalComponent>,
}

impl ExecutionState {
    pub fn new(request: Arc<GenerationRequest>, store: Box<dyn FileStore>) -> Self {
        Self {
            request,
            project_details: String::new(),
            file_tree: String::new(),
            file_operations: Vec::new(),
            file_order: Vec::new(),
            previous_files: HashMap::new(),
            store,
            generated_files: Vec::new(),
            optional_components: Vec::new(),
        }
    }
}

impl fmt::Debug for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionState")
            .field("request", &self.request)
            .field("project_details_len", &self.project_details.len())
            .field("file_tree_len", &self.file_tree.len())
            .field("file_operations", &self.file_operations.len())
            .field("file_order", &self.file_order)
            .field("generated_files", &self.generated_files)
            .field("optional_components", &self.optional_components)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_component_requested() {
        let request = GenerationRequest::new("x").with_readme(true).with_git_repo(true);
        let requested: Vec<_> =
            OptionalComponent::ALL.into_iter().filter(|c| c.is_requested(&request)).collect();
        assert_eq!(requested, vec![OptionalComponent::GitRepo, OptionalComponent::Readme]);
    }

    #[test]
    fn test_optional_component_display() {
        assert_eq!(OptionalComponent::GitRepo.to_string(), "git repository");
        assert_eq!(OptionalComponent::GitIgnore.to_string(), ".gitignore");
    }
}
