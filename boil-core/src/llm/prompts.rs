//! Prompt templates for each generation stage
//!
//! Wording is free to change; callers rely only on the reply shapes the
//! structured prompts ask for (`{"operations": [...]}` and `{"files": [...]}`).

use std::collections::HashMap;

/// Prompt templates for the generation stages
pub struct PromptTemplates;

impl PromptTemplates {
    /// System prompt shared by every call
    pub fn system() -> &'static str {
        "You are an expert software architect and developer. You turn short project \
         descriptions into complete, consistent project specifications, file structures \
         and source files. Follow the conventions of the chosen stack, keep every answer \
         consistent with what was generated before, and never wrap a whole reply in a \
         markdown code block."
    }

    /// Expand a one-line description into project details
    pub fn project_details(description: &str) -> String {
        format!(
            "Project description: \"{}\"\n\n\
             Write a structured markdown document describing:\n\
             1. Main components and the purpose of each\n\
             2. Dependencies and frameworks, with versions where relevant\n\
             3. Configuration files and environment variables\n\
             4. Build system and scripts\n\
             5. Overall architecture and patterns\n\
             6. Scalability, performance and security notes",
            description
        )
    }

    /// Ask for a text file tree rooted at `project-root/`
    pub fn file_tree(project_details: &str) -> String {
        format!(
            "Project details:\n{}\n\n\
             Produce the project's file tree as an indented text tree whose top-level \
             directory is always \"project-root/\". Include source, configuration and \
             package manifest files. Leave out lock files, build output, dependency \
             directories, editor files, Dockerfile, README files and .gitignore.",
            project_details
        )
    }

    /// Ask for the directory/file creation plan as JSON
    pub fn file_operations(project_details: &str, file_tree: &str) -> String {
        format!(
            "Project details:\n{}\n\nFile tree:\n{}\n\n\
             List the operations that create every directory and file of the tree, except \
             the project root itself. Reply with one JSON object:\n\
             {{\"operations\": [{{\"operation\": \"CREATE_DIR\", \"path\": \"src\"}}, \
             {{\"operation\": \"CREATE_FILE\", \"path\": \"src/main.rs\"}}]}}\n\
             Valid operations are CREATE_DIR and CREATE_FILE. Paths are relative to the \
             project root and use forward slashes. Parent directories come before their \
             contents. The key MUST be named \"operations\".",
            project_details, file_tree
        )
    }

    /// Ask for the order in which file contents should be generated
    pub fn file_order(file_tree: &str) -> String {
        format!(
            "File tree:\n{}\n\n\
             Order every file of the tree for content generation: configuration and \
             manifests first, then files before the files that depend on them, tests \
             after the code they test. Skip directories. Reply with one JSON object:\n\
             {{\"files\": [\"package.json\", \"src/config.js\", \"src/index.js\"]}}\n\
             Paths are relative to the project root and use forward slashes. The key MUST \
             be named \"files\".",
            file_tree
        )
    }

    /// Ask for one file's content given everything generated so far
    pub fn file_content(
        path: &str,
        project_details: &str,
        file_tree: &str,
        previous_files: &HashMap<String, String>,
    ) -> String {
        let mut previous: Vec<_> = previous_files.iter().collect();
        previous.sort_by(|a, b| a.0.cmp(b.0));

        let previous_section = if previous.is_empty() {
            "No previous files created.".to_string()
        } else {
            previous
                .iter()
                .map(|(p, content)| format!("// file: {}\n{}\n", p, content))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "Generate the complete content of \"{}\".\n\n\
             Project details:\n{}\n\nFile tree:\n{}\n\nPreviously created files:\n{}\n\n\
             Include every import the file needs, implement the functionality the project \
             details call for, reference the previously created files consistently, and \
             leave no placeholders. Reply with the file content only.",
            path, project_details, file_tree, previous_section
        )
    }

    /// Ask for a `.gitignore`
    pub fn gitignore(project_details: &str) -> String {
        format!(
            "Project details:\n{}\n\n\
             Write a .gitignore for this project: language and framework artifacts, \
             dependency and build directories, OS and editor files, logs and local \
             environment files. Group patterns under # comments. Reply with the file \
             content only.",
            project_details
        )
    }

    /// Ask for a short MVP-style README
    pub fn readme(project_details: &str) -> String {
        format!(
            "Project details:\n{}\n\n\
             Write a concise README.md with: title, short description, 3-5 key features, \
             quick start (prerequisites, installation, usage) and configuration if \
             needed. Use markdown code blocks for commands. Reply with the file content \
             only.",
            project_details
        )
    }

    /// Ask for a Dockerfile
    pub fn dockerfile(project_details: &str) -> String {
        format!(
            "Project details:\n{}\n\n\
             Write a Dockerfile for this project using an official base image, a working \
             directory, dependency installation, exposed ports and the start command. \
             Prefer multi-stage builds when they shrink the image and comment each step. \
             Reply with the file content only.",
            project_details
        )
    }

    /// Suffix for providers without a native JSON mode
    pub fn json_only_suffix() -> &'static str {
        "\n\nRespond with a single valid JSON object and nothing else."
    }
}
