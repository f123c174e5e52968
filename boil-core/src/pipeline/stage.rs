//! Stage identities and their canonical order

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a pipeline stage. The derived ordering is the canonical one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    GenerateProjectDetails,
    GenerateFileTree,
    GenerateFileOperations,
    ExecuteFileOperations,
    DetermineFileOrder,
    GenerateFileContents,
    CreateOptionalComponents,
    Done,
}

impl StageId {
    /// Every stage in execution order
    pub const ALL: [StageId; 8] = [
        StageId::GenerateProjectDetails,
        StageId::GenerateFileTree,
        StageId::GenerateFileOperations,
        StageId::ExecuteFileOperations,
        StageId::DetermineFileOrder,
        StageId::GenerateFileContents,
        StageId::CreateOptionalComponents,
        StageId::Done,
    ];

    /// Position in [`StageId::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The stage that runs after this one, if any
    pub fn next(self) -> Option<StageId> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            StageId::GenerateProjectDetails => "Generating project details",
            StageId::GenerateFileTree => "Generating file tree",
            StageId::GenerateFileOperations => "Generating file operations",
            StageId::ExecuteFileOperations => "Executing file operations",
            StageId::DetermineFileOrder => "Determining file order",
            StageId::GenerateFileContents => "Generating file contents",
            StageId::CreateOptionalComponents => "Creating optional components",
            StageId::Done => "Done",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        for (i, id) in StageId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        assert!(StageId::GenerateProjectDetails < StageId::Done);
        assert_eq!(StageId::GenerateFileTree.next(), Some(StageId::GenerateFileOperations));
        assert_eq!(StageId::Done.next(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(StageId::DetermineFileOrder.to_string(), "Determining file order");
        assert_eq!(serde_json::to_string(&StageId::Done).unwrap(), "\"done\"");
    }
}
