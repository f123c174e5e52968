//! Generation request: the immutable description of one project to build

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const DEFAULT_PROJECT_NAME: &str = "my-project";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Project description must not be empty")]
    EmptyDescription,

    #[error("Model name must not be empty")]
    EmptyModel,
}

/// Everything one pipeline run needs to know about the project to generate.
///
/// Once submitted the request is shared read-only between the engine and the
/// run's stages.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub description: String,
    pub project_name: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub git_repo: bool,
    pub git_ignore: bool,
    pub readme: bool,
    pub dockerfile: bool,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            description: String::new(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            git_repo: false,
            git_ignore: false,
            readme: false,
            dockerfile: false,
        }
    }
}

impl GenerationRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), ..Default::default() }
    }

    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_git_repo(mut self, enabled: bool) -> Self {
        self.git_repo = enabled;
        self
    }

    pub fn with_git_ignore(mut self, enabled: bool) -> Self {
        self.git_ignore = enabled;
        self
    }

    pub fn with_readme(mut self, enabled: bool) -> Self {
        self.readme = enabled;
        self
    }

    pub fn with_dockerfile(mut self, enabled: bool) -> Self {
        self.dockerfile = enabled;
        self
    }

    /// Check the request before it is accepted for execution
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.description.trim().is_empty() {
            return Err(RequestError::EmptyDescription);
        }
        if self.model.trim().is_empty() {
            return Err(RequestError::EmptyModel);
        }
        Ok(())
    }

    /// Directory-safe form of the project name
    pub fn formatted_name(&self) -> String {
        regex_utils::project_name::format(&self.project_name)
    }

    /// Whether any optional component is toggled on
    pub fn wants_optional_components(&self) -> bool {
        self.git_repo || self.git_ignore || self.readme || self.dockerfile
    }
}

impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("description", &self.description)
            .field("project_name", &self.project_name)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("git_repo", &self.git_repo)
            .field("git_ignore", &self.git_ignore)
            .field("readme", &self.readme)
            .field("dockerfile", &self.dockerfile)
            .finish()
    }
}
