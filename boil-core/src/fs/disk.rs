//! File store rooted at a directory on the real filesystem

use super::{FileStore, FileStoreError, FsResult, StoreEntry, normalize_path};
use git2::Repository;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File store writing straight into `root`
#[derive(Debug, Clone)]
pub struct DiskFileStore {
    root: PathBuf,
}

impl DiskFileStore {
    /// Open a store at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> FsResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| FileStoreError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> FsResult<PathBuf> {
        let normalized = normalize_path(path)?;
        Ok(if normalized.is_empty() { self.root.clone() } else { self.root.join(normalized) })
    }

    fn ensure_parent(target: &Path) -> FsResult<()> {
        if let Some(parent) = target.parent() {
            if parent.is_file() {
                return Err(FileStoreError::NotADirectory { path: parent.display().to_string() });
            }
            fs::create_dir_all(parent).map_err(|e| FileStoreError::io(parent, e))?;
        }
        Ok(())
    }

    fn put_file(&mut self, path: &str, content: &str) -> FsResult<()> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(FileStoreError::IsADirectory { path: path.to_string() });
        }
        Self::ensure_parent(&target)?;
        fs::write(&target, content).map_err(|e| FileStoreError::io(&target, e))
    }
}

impl FileStore for DiskFileStore {
    fn create_dir_all(&mut self, path: &str) -> FsResult<()> {
        let target = self.resolve(path)?;
        if target.is_file() {
            return Err(FileStoreError::NotADirectory { path: path.to_string() });
        }
        fs::create_dir_all(&target).map_err(|e| FileStoreError::io(&target, e))
    }

    fn create_file(&mut self, path: &str) -> FsResult<()> {
        self.put_file(path, "")
    }

    fn write_file(&mut self, path: &str, content: &str) -> FsResult<()> {
        self.put_file(path, content)
    }

    fn read_file(&self, path: &str) -> FsResult<String> {
        let target = self.resolve(path)?;
        if target.is_dir() {
            return Err(FileStoreError::IsADirectory { path: path.to_string() });
        }
        if !target.exists() {
            return Err(FileStoreError::NotFound { path: path.to_string() });
        }
        fs::read_to_string(&target).map_err(|e| FileStoreError::io(&target, e))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_dir()).unwrap_or(false)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn init_vcs(&mut self) -> FsResult<()> {
        let repo = Repository::init(&self.root)?;
        debug!("Initialized git repository at {}", repo.path().display());
        Ok(())
    }

    fn walk(&self) -> FsResult<Vec<StoreEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.root).min_depth(1).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| FileStoreError::io(&self.root, e.into()))?;
            let path = entry.path();
            let relative = path
                .strip_prefix(&self.root)
                .map_err(|_| FileStoreError::InvalidPath {
                    path: path.display().to_string(),
                    reason: "outside the store root".to_string(),
                })?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_dir() {
                entries.push(StoreEntry::Dir(relative));
            } else if entry.file_type().is_file() {
                let bytes = fs::read(path).map_err(|e| FileStoreError::io(path, e))?;
                entries.push(StoreEntry::File(relative, bytes));
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_disk_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskFileStore::new(dir.path().join("project")).unwrap();

        store.create_dir_all("src/utils").unwrap();
        store.write_file("src/index.js", "console.log('hi');").unwrap();
        store.create_file("test/empty.js").unwrap();

        assert!(store.is_dir("src/utils"));
        assert!(store.is_dir(""));
        assert_eq!(store.read_file("src/index.js").unwrap(), "console.log('hi');");
        assert_eq!(store.read_file("test/empty.js").unwrap(), "");
        assert!(matches!(store.read_file("missing"), Err(FileStoreError::NotFound { .. })));
    }

    #[test]
    fn test_disk_store_rejects_escape() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskFileStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.write_file("../escape.txt", "x"),
            Err(FileStoreError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_disk_store_init_vcs() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskFileStore::new(dir.path()).unwrap();
        store.init_vcs().unwrap();

        assert!(store.is_dir(".git"));
        assert!(Repository::open(dir.path()).is_ok());
    }

    #[test]
    fn test_disk_store_tree() {
        let dir = TempDir::new().unwrap();
        let mut store = DiskFileStore::new(dir.path()).unwrap();
        store.write_file("src/main.rs", "fn main() {}").unwrap();
        store.create_dir_all("docs").unwrap();

        let json = serde_json::to_value(store.tree().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"docs": {}, "src": {"main.rs": null}}));
    }
}
