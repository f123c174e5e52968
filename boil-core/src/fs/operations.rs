//! Directory/file creation plans and their application to a store

use super::{FileStore, FileStoreError, FsResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Kind of a planned filesystem operation.
///
/// Unrecognized kinds are kept as [`OperationKind::Unknown`] so that the
/// plan still parses and the failure surfaces when that operation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationKind {
    CreateDir,
    CreateFile,
    Unknown(String),
}

impl From<String> for OperationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "CREATE_DIR" => OperationKind::CreateDir,
            "CREATE_FILE" => OperationKind::CreateFile,
            _ => OperationKind::Unknown(value),
        }
    }
}

impl From<OperationKind> for String {
    fn from(kind: OperationKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::CreateDir => write!(f, "CREATE_DIR"),
            OperationKind::CreateFile => write!(f, "CREATE_FILE"),
            OperationKind::Unknown(other) => write!(f, "{}", other),
        }
    }
}

/// One planned operation, as returned by the file-operations stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOperation {
    pub operation: OperationKind,
    pub path: String,
}

impl FileOperation {
    pub fn create_dir(path: impl Into<String>) -> Self {
        Self { operation: OperationKind::CreateDir, path: path.into() }
    }

    pub fn create_file(path: impl Into<String>) -> Self {
        Self { operation: OperationKind::CreateFile, path: path.into() }
    }

    /// Apply this operation to `store`
    pub fn apply(&self, store: &mut dyn FileStore) -> FsResult<()> {
        match &self.operation {
            OperationKind::CreateDir => store.create_dir_all(&self.path),
            OperationKind::CreateFile => store.create_file(&self.path),
            OperationKind::Unknown(kind) => Err(FileStoreError::UnknownOperation {
                operation: kind.clone(),
                path: self.path.clone(),
            }),
        }
    }
}

/// Apply `operations` in list order, stopping at the first failure.
///
/// Effects of operations applied before the failure stay in the store.
pub fn apply_operations(store: &mut dyn FileStore, operations: &[FileOperation]) -> FsResult<()> {
    for op in operations {
        debug!("{} {}", op.operation, op.path);
        op.apply(store)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileStore;

    #[test]
    fn test_operation_kind_parsing() {
        let ops: Vec<FileOperation> = serde_json::from_str(
            r#"[{"operation":"CREATE_DIR","path":"src"},{"operation":"DELETE","path":"x"}]"#,
        )
        .unwrap();

        assert_eq!(ops[0].operation, OperationKind::CreateDir);
        assert_eq!(ops[1].operation, OperationKind::Unknown("DELETE".to_string()));
        assert_eq!(serde_json::to_value(&ops[0]).unwrap()["operation"], "CREATE_DIR");
    }

    #[test]
    fn test_apply_creates_dir_and_empty_file() {
        let mut store = MemoryFileStore::new();
        let ops = vec![FileOperation::create_dir("src"), FileOperation::create_file("src/index.js")];

        apply_operations(&mut store, &ops).unwrap();

        assert!(store.is_dir("src"));
        assert!(!store.is_dir("src/index.js"));
        assert_eq!(store.read_file("src/index.js").unwrap(), "");
    }

    #[test]
    fn test_unknown_operation_keeps_earlier_and_skips_later() {
        let mut store = MemoryFileStore::new();
        let ops = vec![
            FileOperation::create_dir("src"),
            FileOperation { operation: OperationKind::Unknown("MOVE".to_string()), path: "lib".to_string() },
            FileOperation::create_file("src/later.js"),
        ];

        let err = apply_operations(&mut store, &ops).unwrap_err();

        assert!(matches!(err, FileStoreError::UnknownOperation { ref operation, .. } if operation == "MOVE"));
        assert!(store.is_dir("src"));
        assert!(!store.exists("lib"));
        assert!(!store.exists("src/later.js"));
    }

    #[test]
    fn test_create_file_makes_missing_parents() {
        let mut store = MemoryFileStore::new();
        apply_operations(&mut store, &[FileOperation::create_file("a/b/c.txt")]).unwrap();
        assert!(store.is_dir("a/b"));
    }
}
