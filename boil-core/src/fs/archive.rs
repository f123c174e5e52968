//! Zip packaging of a store's contents

use super::{FileStoreError, FsResult, StoreEntry};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Write `entries` into a new zip archive at `dest`.
///
/// Each directory gets its own `dir/` entry and each file its bytes. Returns
/// the number of files written; a store without files is an error and leaves
/// no archive behind.
pub fn write_archive(entries: &[StoreEntry], dest: &Path) -> FsResult<usize> {
    let file_count = entries.iter().filter(|e| matches!(e, StoreEntry::File(..))).count();
    if file_count == 0 {
        return Err(FileStoreError::EmptyStore);
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| FileStoreError::io(parent, e))?;
    }
    let file = File::create(dest).map_err(|e| FileStoreError::io(dest, e))?;

    let mut zip = ZipWriter::new(file);
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        match entry {
            StoreEntry::Dir(path) => {
                zip.add_directory(format!("{}/", path), options)?;
            }
            StoreEntry::File(path, bytes) => {
                zip.start_file(path.as_str(), options)?;
                zip.write_all(bytes).map_err(|e| FileStoreError::io(dest, e))?;
            }
        }
    }

    zip.finish()?;
    info!("Wrote {} files to {}", file_count, dest.display());
    Ok(file_count)
}
