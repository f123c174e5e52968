//! In-memory file store, the default home of a run's project

use super::{FileStore, FileStoreError, FsResult, StoreEntry, normalize_path, parent_of};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Dir,
    File(String),
}

/// File store backed by a sorted map of normalized paths.
///
/// Sorting keeps every parent ahead of its children, which is what
/// [`FileStore::walk`] promises.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileStore {
    nodes: BTreeMap<String, Node>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of files (not directories) in the store
    pub fn file_count(&self) -> usize {
        self.nodes.values().filter(|n| matches!(n, Node::File(_))).count()
    }

    fn ensure_dirs(&mut self, path: &str) -> FsResult<()> {
        if path.is_empty() {
            return Ok(());
        }

        let mut current = String::new();
        for part in path.split('/') {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);

            match self.nodes.get(&current) {
                Some(Node::File(_)) => {
                    return Err(FileStoreError::NotADirectory { path: current });
                }
                Some(Node::Dir) => {}
                None => {
                    self.nodes.insert(current.clone(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    fn put_file(&mut self, path: &str, content: String) -> FsResult<()> {
        let normalized = normalize_path(path)?;
        if normalized.is_empty() {
            return Err(FileStoreError::IsADirectory { path: path.to_string() });
        }

        self.ensure_dirs(parent_of(&normalized))?;
        if let Some(Node::Dir) = self.nodes.get(&normalized) {
            return Err(FileStoreError::IsADirectory { path: normalized });
        }

        self.nodes.insert(normalized, Node::File(content));
        Ok(())
    }
}

impl FileStore for MemoryFileStore {
    fn create_dir_all(&mut self, path: &str) -> FsResult<()> {
        let normalized = normalize_path(path)?;
        self.ensure_dirs(&normalized)
    }

    fn create_file(&mut self, path: &str) -> FsResult<()> {
        self.put_file(path, String::new())
    }

    fn write_file(&mut self, path: &str, content: &str) -> FsResult<()> {
        self.put_file(path, content.to_string())
    }

    fn read_file(&self, path: &str) -> FsResult<String> {
        let normalized = normalize_path(path)?;
        match self.nodes.get(&normalized) {
            Some(Node::File(content)) => Ok(content.clone()),
            Some(Node::Dir) => Err(FileStoreError::IsADirectory { path: normalized }),
            None => Err(FileStoreError::NotFound { path: normalized }),
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        match normalize_path(path) {
            Ok(normalized) if normalized.is_empty() => true,
            Ok(normalized) => matches!(self.nodes.get(&normalized), Some(Node::Dir)),
            Err(_) => false,
        }
    }

    fn exists(&self, path: &str) -> bool {
        match normalize_path(path) {
            Ok(normalized) => normalized.is_empty() || self.nodes.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn init_vcs(&mut self) -> FsResult<()> {
        self.create_dir_all(".git/objects")?;
        self.create_dir_all(".git/refs/heads")?;
        self.create_dir_all(".git/refs/tags")?;
        self.write_file(".git/HEAD", "ref: refs/heads/main\n")?;
        self.write_file(
            ".git/config",
            "[core]\n\trepositoryformatversion = 0\n\tfilemode = true\n\tbare = false\n",
        )?;
        self.write_file(
            ".git/description",
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )
    }

    fn walk(&self) -> FsResult<Vec<StoreEntry>> {
        Ok(self
            .nodes
            .iter()
            .map(|(path, node)| match node {
                Node::Dir => StoreEntry::Dir(path.clone()),
                Node::File(content) => StoreEntry::File(path.clone(), content.as_bytes().to_vec()),
            })
            .collect())
    }
}
