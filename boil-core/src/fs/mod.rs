//! File-store collaborators
//!
//! A run materializes its project onto a [`FileStore`]. Paths handed to a
//! store are always relative to the project root and `/`-separated; the root
//! itself is the empty path. Stores are owned by exactly one run.

pub mod archive;
pub mod disk;
pub mod memory;
pub mod operations;

pub use disk::DiskFileStore;
pub use memory::MemoryFileStore;
pub use operations::{FileOperation, OperationKind, apply_operations};

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    #[error("'{path}' exists and is not a directory")]
    NotADirectory { path: String },

    #[error("'{path}' is a directory")]
    IsADirectory { path: String },

    #[error("Unknown operation '{operation}' for {path}")]
    UnknownOperation { operation: String, path: String },

    #[error("Destination {path:?} already exists and is not empty")]
    DestinationExists { path: PathBuf },

    #[error("No files to archive")]
    EmptyStore,

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Version control error: {0}")]
    VersionControl(#[from] git2::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl FileStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath { path: path.to_string(), reason: reason.into() }
    }
}

pub type FsResult<T> = Result<T, FileStoreError>;

/// One node of the enumerated tree. Files serialize as `null`, directories
/// as a map of their children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TreeNode {
    File,
    Dir(BTreeMap<String, TreeNode>),
}

/// Nested name structure of a whole store
pub type FileTree = BTreeMap<String, TreeNode>;

/// A flattened store entry, as produced by [`FileStore::walk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEntry {
    Dir(String),
    File(String, Vec<u8>),
}

impl StoreEntry {
    pub fn path(&self) -> &str {
        match self {
            StoreEntry::Dir(path) | StoreEntry::File(path, _) => path,
        }
    }
}

/// Storage a pipeline run writes its project into.
///
/// Every operation is synchronous and independent: nothing is atomic across
/// calls, and a failed call leaves earlier effects in place.
pub trait FileStore: Send {
    /// Create a directory and all of its missing parents
    fn create_dir_all(&mut self, path: &str) -> FsResult<()>;

    /// Create an empty file (truncating an existing one), creating parents first
    fn create_file(&mut self, path: &str) -> FsResult<()>;

    /// Create or overwrite a file with `content`, creating parents first
    fn write_file(&mut self, path: &str, content: &str) -> FsResult<()>;

    fn read_file(&self, path: &str) -> FsResult<String>;

    /// Whether `path` exists and is a directory. The root is a directory.
    fn is_dir(&self, path: &str) -> bool;

    fn exists(&self, path: &str) -> bool;

    /// Initialize version-control metadata at the root
    fn init_vcs(&mut self) -> FsResult<()>;

    /// Every entry below the root, parents before children, sorted by path
    fn walk(&self) -> FsResult<Vec<StoreEntry>>;

    /// Enumerate the store as a nested name structure
    fn tree(&self) -> FsResult<FileTree> {
        let mut tree = FileTree::new();
        for entry in self.walk()? {
            insert_tree_node(&mut tree, &entry);
        }
        Ok(tree)
    }

    /// Package the whole store into a zip archive at `dest`, returning the
    /// number of files written
    fn export_archive(&self, dest: &Path) -> FsResult<usize> {
        archive::write_archive(&self.walk()?, dest)
    }

    /// Copy the whole store onto the real filesystem at `dest`
    fn copy_to(&self, dest: &Path) -> FsResult<()> {
        copy_entries(&self.walk()?, dest)
    }
}

/// Normalize a relative store path.
///
/// Backslashes become `/`, empty and `.` components are dropped and a leading
/// `/` is ignored. `..` is rejected rather than resolved so nothing can escape
/// the root. The root itself normalizes to the empty string.
pub fn normalize_path(path: &str) -> FsResult<String> {
    let unified = path.replace('\\', "/");
    let mut parts = Vec::new();

    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return Err(FileStoreError::invalid(path, "parent components are not allowed")),
            other => parts.push(other),
        }
    }

    Ok(parts.join("/"))
}

/// Parent of a normalized path (`""` for top-level entries)
pub fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(parent, _)| parent).unwrap_or("")
}

/// Render a tree the way `tree(1)` does
pub fn render_tree(root_name: &str, tree: &FileTree) -> String {
    let mut out = format!("{}/\n", root_name);
    render_children(tree, "", &mut out);
    out
}

fn render_children(children: &BTreeMap<String, TreeNode>, prefix: &str, out: &mut String) {
    let count = children.len();
    for (i, (name, node)) in children.iter().enumerate() {
        let last = i + 1 == count;
        let branch = if last { "└── " } else { "├── " };
        match node {
            TreeNode::File => out.push_str(&format!("{}{}{}\n", prefix, branch, name)),
            TreeNode::Dir(grandchildren) => {
                out.push_str(&format!("{}{}{}/\n", prefix, branch, name));
                let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
                render_children(grandchildren, &next, out);
            }
        }
    }
}

fn insert_tree_node(tree: &mut FileTree, entry: &StoreEntry) {
    let parts: Vec<&str> = entry.path().split('/').collect();
    let mut current = tree;

    for (i, part) in parts.iter().enumerate() {
        let is_leaf = i + 1 == parts.len();
        if is_leaf {
            let node = match entry {
                StoreEntry::Dir(_) => TreeNode::Dir(BTreeMap::new()),
                StoreEntry::File(..) => TreeNode::File,
            };
            current.entry(part.to_string()).or_insert(node);
            return;
        }

        let next = current
            .entry(part.to_string())
            .or_insert_with(|| TreeNode::Dir(BTreeMap::new()));
        match next {
            TreeNode::Dir(children) => current = children,
            // walk() never yields children under a file
            TreeNode::File => return,
        }
    }
}

fn copy_entries(entries: &[StoreEntry], dest: &Path) -> FsResult<()> {
    if dest.exists() {
        let mut contents =
            std::fs::read_dir(dest).map_err(|e| FileStoreError::io(dest, e))?;
        if contents.next().is_some() {
            return Err(FileStoreError::DestinationExists { path: dest.to_path_buf() });
        }
    }
    std::fs::create_dir_all(dest).map_err(|e| FileStoreError::io(dest, e))?;

    for entry in entries {
        let target = dest.join(entry.path());
        match entry {
            StoreEntry::Dir(_) => {
                std::fs::create_dir_all(&target).map_err(|e| FileStoreError::io(&target, e))?;
            }
            StoreEntry::File(_, bytes) => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| FileStoreError::io(parent, e))?;
                }
                std::fs::write(&target, bytes).map_err(|e| FileStoreError::io(&target, e))?;
            }
        }
    }

    tracing::debug!("Copied {} entries to {}", entries.len(), dest.display());
    Ok(())
}
