//! Regex utilities for boil
//! Extracted to a separate crate for compilation optimization

use once_cell::sync::Lazy;
use regex::Regex;

/// Compiled regex patterns for project names
pub mod project_name {
    use super::*;

    pub static CREATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:create|build|make|develop)\s+(?:a|an)?\s*.*?(?:called|named)\s+([\w-]+)")
            .expect("Invalid regex pattern")
    });

    pub static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:project|name):\s*([\w-]+)").expect("Invalid regex pattern")
    });

    static INVALID_CHARS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\-_]").expect("Invalid regex pattern"));

    static VALID_NAME: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-_]*$").expect("Invalid regex pattern"));

    /// Name used when nothing usable is left after formatting
    pub const FALLBACK: &str = "boilerplate-project";

    /// Extract a project name from a free-form description
    pub fn extract(text: &str) -> Option<String> {
        if let Some(caps) = CREATE_PATTERN.captures(text) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }

        if let Some(caps) = NAME_PATTERN.captures(text) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }

        None
    }

    /// Turn an arbitrary string into a directory-safe project name.
    ///
    /// Invalid characters become `-`, leading `-`/`_` are trimmed, a leading
    /// digit gets a `project-` prefix and an empty result falls back to
    /// [`FALLBACK`].
    pub fn format(name: &str) -> String {
        let replaced = INVALID_CHARS.replace_all(name.trim(), "-");
        let trimmed = replaced.trim_start_matches(['-', '_']);

        if trimmed.is_empty() {
            return FALLBACK.to_string();
        }

        if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            format!("project-{}", trimmed)
        } else {
            trimmed.to_string()
        }
    }

    /// Check whether a name is already in formatted shape
    pub fn is_valid(name: &str) -> bool {
        VALID_NAME.is_match(name)
    }
}

/// Cleanup of raw text-generation replies
pub mod reply {
    use super::*;

    static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)^\s*```[\w+-]*[ \t]*\r?\n(.*?)\r?\n?```\s*$").expect("Invalid regex pattern")
    });

    static JSON_OBJECT: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid regex pattern"));

    /// Remove a markdown code fence wrapping the whole reply, if any
    pub fn strip_code_fence(text: &str) -> &str {
        match FENCED_BLOCK.captures(text).and_then(|caps| caps.get(1)) {
            Some(inner) => inner.as_str(),
            None => text.trim(),
        }
    }

    /// Find the outermost `{ ... }` span in a reply that wraps JSON in prose
    pub fn json_object(text: &str) -> Option<&str> {
        JSON_OBJECT.find(strip_code_fence(text)).map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_extraction() {
        assert_eq!(
            project_name::extract("create a rust cli called mycli"),
            Some("mycli".to_string())
        );

        assert_eq!(
            project_name::extract("project: my-project"),
            Some("my-project".to_string())
        );

        assert_eq!(project_name::extract("a todo app"), None);
    }

    #[test]
    fn test_project_name_format() {
        assert_eq!(project_name::format("My Cool App"), "My-Cool-App");
        assert_eq!(project_name::format("__hidden"), "hidden");
        assert_eq!(project_name::format("2048 clone"), "project-2048-clone");
        assert_eq!(project_name::format("   "), project_name::FALLBACK);
        assert_eq!(project_name::format("***"), project_name::FALLBACK);
        assert!(project_name::is_valid(&project_name::format("weird/../name")));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(reply::strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(reply::strip_code_fence("  plain text \n"), "plain text");
        assert_eq!(reply::strip_code_fence("```\nfn main() {}\n```\n"), "fn main() {}");
    }

    #[test]
    fn test_json_object_in_prose() {
        let text = "Here is the plan:\n{\"files\": [\"a.js\"]}\nDone.";
        assert_eq!(reply::json_object(text), Some("{\"files\": [\"a.js\"]}"));
        assert_eq!(reply::json_object("no json here"), None);
    }
}
